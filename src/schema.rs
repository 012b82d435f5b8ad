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

//! Describes the primary key layout of a table.
//!
//! A table has one or more partition key columns, zero or more clustering
//! columns and any number of regular columns. Only the key layout matters to a
//! scan: partition keys decide the token order, clustering columns decide the
//! order of rows inside a partition.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::ScanError;

/// Order of a clustering column inside a partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    PartitionKey,
    Clustering(ClusteringOrder),
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,

    /// Whether a secondary index is built on this column.
    #[serde(default)]
    pub indexed: bool,
}

impl ColumnDef {
    pub fn is_primary_key(&self) -> bool {
        !matches!(self.kind, ColumnKind::Regular)
    }
}

/// Schema of a table, in column declaration order.
///
/// ```
/// use table_iter::ClusteringOrder;
/// use table_iter::TableSchema;
///
/// let schema = TableSchema::new("tests", "events")
///     .partition_key("p_key_a")
///     .partition_key("p_key_b")
///     .clustering_key("c_key_a", ClusteringOrder::Asc)
///     .clustering_key("c_key_b", ClusteringOrder::Desc)
///     .column("value");
///
/// assert_eq!(vec!["p_key_a", "p_key_b"], schema.partition_key_columns());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub keyspace: String,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(keyspace: impl ToString, name: impl ToString) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            name: name.to_string(),
            columns: vec![],
        }
    }

    pub fn partition_key(self, name: impl ToString) -> Self {
        self.push(name, ColumnKind::PartitionKey, false)
    }

    pub fn clustering_key(self, name: impl ToString, order: ClusteringOrder) -> Self {
        self.push(name, ColumnKind::Clustering(order), false)
    }

    pub fn column(self, name: impl ToString) -> Self {
        self.push(name, ColumnKind::Regular, false)
    }

    /// A regular column with a secondary index.
    pub fn indexed_column(self, name: impl ToString) -> Self {
        self.push(name, ColumnKind::Regular, true)
    }

    fn push(mut self, name: impl ToString, kind: ColumnKind, indexed: bool) -> Self {
        self.columns.push(ColumnDef {
            name: name.to_string(),
            kind,
            indexed,
        });
        self
    }

    /// `keyspace.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.name)
    }

    pub fn column_def(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn partition_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::PartitionKey)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn clustering_columns(&self) -> Vec<(&str, ClusteringOrder)> {
        self.columns
            .iter()
            .filter_map(|c| match c.kind {
                ColumnKind::Clustering(order) => Some((c.name.as_str(), order)),
                _ => None,
            })
            .collect()
    }

    /// Check that there is a partition key and that column names are unique.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.partition_key_columns().is_empty() {
            return Err(ScanError::invalid_schema(
                self.qualified_name(),
                "no partition key column",
            ));
        }

        let mut seen = BTreeSet::new();
        for c in &self.columns {
            if !seen.insert(c.name.as_str()) {
                return Err(ScanError::invalid_schema(
                    self.qualified_name(),
                    format!("duplicate column {:?}", c.name),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pk = self.partition_key_columns().join(", ");
        let ck = self
            .clustering_columns()
            .iter()
            .map(|(c, _)| *c)
            .collect::<Vec<_>>();

        if ck.is_empty() {
            write!(f, "{}(({}))", self.qualified_name(), pk)
        } else {
            write!(f, "{}(({}), {})", self.qualified_name(), pk, ck.join(", "))
        }
    }
}
