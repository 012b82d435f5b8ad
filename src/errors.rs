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

use std::io;

/// Errors that can occur while configuring or running a table scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A page must hold at least one row.
    #[error("InvalidBlockSize: blocksize must be greater than 0, got {0}")]
    InvalidBlockSize(usize),

    #[error("InvalidSchema: table {table}: {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("UnknownColumn: table {table} has no column {column:?}")]
    UnknownColumn { table: String, column: String },

    /// Filters on key columns would conflict with the restrictions used to resume a scan.
    #[error("FilterOnKeyColumn: can not filter on primary key column {column:?}")]
    FilterOnKeyColumn { column: String },

    #[error("MissingColumn: row has no column {column:?}")]
    MissingColumn { column: String },

    #[error("TypeMismatch: column {column:?} expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Returned unchanged by the underlying [`Session`](crate::Session).
    #[error("Session: {0}")]
    Session(#[from] io::Error),
}

impl ScanError {
    pub fn invalid_schema(table: impl ToString, reason: impl ToString) -> Self {
        ScanError::InvalidSchema {
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }
}
