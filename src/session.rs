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

//! Defines the interface to the database a scan reads from.
//!
//! The [`Session`] trait is the only thing a scan needs from a database
//! client: execute one [`Select`] and return the page of rows. Routing,
//! consistency and retries are the business of the implementation.

use std::io;
use std::sync::Arc;

use crate::row::Row;
use crate::statement::Select;

/// Executes a single page query.
///
/// # Contract
///
/// An implementation must:
/// - return at most `select.limit` rows;
/// - order rows by the token of their partition key, then by clustering order
///   within a partition;
/// - honour every [`Restriction`](crate::statement::Restriction) of the statement.
///
/// A driver backed implementation renders the statement with [`Select::to_cql`],
/// binds the values and collects the first page of the result.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    async fn execute(&self, select: &Select) -> Result<Vec<Row>, io::Error>;
}

#[async_trait::async_trait]
impl<T> Session for &T
where T: Session
{
    async fn execute(&self, select: &Select) -> Result<Vec<Row>, io::Error> {
        (**self).execute(select).await
    }
}

#[async_trait::async_trait]
impl<T> Session for Arc<T>
where T: Session
{
    async fn execute(&self, select: &Select) -> Result<Vec<Row>, io::Error> {
        (**self).execute(select).await
    }
}
