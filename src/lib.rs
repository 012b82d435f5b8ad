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

//! # Table Iter
//!
//! Iterate over every row of a table in a wide-column database, one row at a
//! time, without managing pages or pagination tokens.
//!
//! Tables with composite partition keys and composite clustering keys, in
//! any mix of clustering orders, are supported. The scan walks partitions in
//! token order and finishes a partition before moving to the next one, so a
//! page boundary in the middle of a partition never loses or repeats rows.
//!
//! ## Core Components
//!
//! - [`Model`]: binds a Rust type to a table.
//! - [`Session`]: executes one page query; implemented by the database client.
//! - [`TableIterator`]: builds the scan and returns a stream of models.
//! - [`PageCursor`](cursor::PageCursor): the pagination state machine.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use table_iter::impls::memory::MemorySession;
//! use table_iter::ClusteringOrder;
//! use table_iter::Model;
//! use table_iter::Row;
//! use table_iter::ScanError;
//! use table_iter::TableIterator;
//! use table_iter::TableSchema;
//!
//! struct Reading {
//!     sensor: i32,
//!     ts: i64,
//! }
//!
//! impl Model for Reading {
//!     fn schema() -> TableSchema {
//!         TableSchema::new("metrics", "reading")
//!             .partition_key("sensor")
//!             .clustering_key("ts", ClusteringOrder::Desc)
//!     }
//!
//!     fn from_row(row: Row) -> Result<Self, ScanError> {
//!         Ok(Self {
//!             sensor: row.get("sensor")?,
//!             ts: row.get("ts")?,
//!         })
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let session = Arc::new(MemorySession::new());
//!     session.create_table(Reading::schema())?;
//!
//!     for reading in TableIterator::<Reading, _>::new(session).blocking()? {
//!         let reading = reading?;
//!         println!("{} {}", reading.sensor, reading.ts);
//!     }
//!
//!     Ok(())
//! }
//! ```

use futures_util::stream::BoxStream;

pub mod cursor;
pub mod errors;
pub mod impls;
pub mod model;
pub mod options;
pub mod row;
pub mod schema;
pub mod session;
pub mod statement;
pub mod table_iterator;
pub mod value;


pub use crate::errors::ScanError;
pub use crate::model::Model;
pub use crate::options::Filter;
pub use crate::options::ScanOptions;
pub use crate::row::Row;
pub use crate::schema::ClusteringOrder;
pub use crate::schema::TableSchema;
pub use crate::session::Session;
pub use crate::statement::Restriction;
pub use crate::statement::Select;
pub use crate::table_iterator::TableIterator;
pub use crate::value::CqlValue;

/// A boxed stream of models, or the error that ended the scan.
pub type ModelStream<M> = BoxStream<'static, Result<M, ScanError>>;
