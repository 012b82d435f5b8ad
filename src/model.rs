// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Binds a Rust type to a table.

use crate::errors::ScanError;
use crate::row::Row;
use crate::schema::TableSchema;

/// A type that is stored in a table, one instance per row.
///
/// # Examples
///
/// ```
/// use table_iter::ClusteringOrder;
/// use table_iter::Model;
/// use table_iter::Row;
/// use table_iter::ScanError;
/// use table_iter::TableSchema;
///
/// struct Event {
///     p_key: i32,
///     c_key: i32,
///     value: String,
/// }
///
/// impl Model for Event {
///     fn schema() -> TableSchema {
///         TableSchema::new("tests", "event")
///             .partition_key("p_key")
///             .clustering_key("c_key", ClusteringOrder::Asc)
///             .column("value")
///     }
///
///     fn from_row(row: Row) -> Result<Self, ScanError> {
///         Ok(Self {
///             p_key: row.get("p_key")?,
///             c_key: row.get("c_key")?,
///             value: row.get("value")?,
///         })
///     }
/// }
/// ```
pub trait Model: Sized + Send + 'static {
    fn schema() -> TableSchema;

    fn from_row(row: Row) -> Result<Self, ScanError>;
}
