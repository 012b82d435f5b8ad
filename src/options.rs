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

//! Scan configuration.

use serde::Deserialize;
use serde::Serialize;

use crate::errors::ScanError;
use crate::schema::TableSchema;
use crate::value::CqlValue;

/// Page size used when none is configured.
pub const DEFAULT_BLOCKSIZE: usize = 5000;

/// Options of a table scan.
///
/// All fields have defaults, so a partial config deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Number of rows fetched per query.
    pub blocksize: usize,

    /// Append `ALLOW FILTERING` to every statement.
    ///
    /// Always enabled when the scan has filters.
    pub allow_filtering: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            blocksize: DEFAULT_BLOCKSIZE,
            allow_filtering: false,
        }
    }
}

impl ScanOptions {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.blocksize == 0 {
            return Err(ScanError::InvalidBlockSize(self.blocksize));
        }
        Ok(())
    }
}

/// Equality filter on a regular column, usually one with a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: CqlValue,
}

impl Filter {
    pub fn new(column: impl Into<String>, value: impl Into<CqlValue>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// A filter must name a regular column of the table.
    pub fn validate(&self, schema: &TableSchema) -> Result<(), ScanError> {
        let Some(def) = schema.column_def(&self.column) else {
            return Err(ScanError::UnknownColumn {
                table: schema.qualified_name(),
                column: self.column.clone(),
            });
        };

        if def.is_primary_key() {
            return Err(ScanError::FilterOnKeyColumn {
                column: self.column.clone(),
            });
        }

        Ok(())
    }
}
