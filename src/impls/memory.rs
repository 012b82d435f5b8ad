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

//! Provides a simple in-memory implementation of [`Session`].
//!
//! [`MemorySession`] keeps tables in [`BTreeMap`]s laid out the way a
//! wide-column store lays out data on disk: partitions ordered by token, rows
//! ordered by clustering key inside a partition. It evaluates [`Select`]
//! statements directly, without going through CQL text. It's primarily
//! intended for testing and demonstration purposes.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::io;
use std::sync::RwLock;

use log::debug;
use log::warn;

use crate::impls::murmur3;
use crate::row::Row;
use crate::schema::ClusteringOrder;
use crate::schema::ColumnKind;
use crate::schema::TableSchema;
use crate::statement::Restriction;
use crate::statement::Select;
use crate::value::CqlValue;
use crate::Session;

/// Longest serialized partition key component; the composite key framing stores lengths as `u16`.
const MAX_KEY_COMPONENT_LEN: usize = u16::MAX as usize;

/// Partitions are ordered by token first. The key values break token collisions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PartitionKey {
    token: i64,
    values: Vec<CqlValue>,
}

/// One component of a clustering key.
///
/// Within one table a given position is always the same variant, so the
/// derived ordering only ever compares values of the same direction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Asc(CqlValue),
    Desc(Reverse<CqlValue>),
}

type Partition = BTreeMap<Vec<KeyPart>, Row>;

#[derive(Debug)]
struct MemoryTable {
    schema: TableSchema,
    partitions: BTreeMap<PartitionKey, Partition>,
}

impl MemoryTable {
    fn insert(&mut self, row: Row) -> Result<(), io::Error> {
        let pk_values = row
            .project(self.schema.partition_key_columns())
            .map_err(invalid_input)?;

        let mut ck = vec![];
        for (c, order) in self.schema.clustering_columns() {
            let v = row.require(c).map_err(invalid_input)?.clone();
            ck.push(match order {
                ClusteringOrder::Asc => KeyPart::Asc(v),
                ClusteringOrder::Desc => KeyPart::Desc(Reverse(v)),
            });
        }

        if pk_values.iter().any(|v| v.is_null())
            || ck.iter().any(|p| match p {
                KeyPart::Asc(v) | KeyPart::Desc(Reverse(v)) => v.is_null(),
            })
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "{}: primary key columns can not be null",
                    self.schema.qualified_name()
                ),
            ));
        }

        for (c, v) in self.schema.partition_key_columns().iter().zip(&pk_values) {
            let len = v.to_bytes().len();
            if len > MAX_KEY_COMPONENT_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "{}: key length of {} bytes for {:?} is longer than maximum of {}",
                        self.schema.qualified_name(),
                        len,
                        c,
                        MAX_KEY_COMPONENT_LEN
                    ),
                ));
            }
        }

        let pk = PartitionKey {
            token: murmur3::token(&pk_values),
            values: pk_values,
        };

        self.partitions.entry(pk).or_default().insert(ck, row);
        Ok(())
    }

    fn len(&self) -> usize {
        self.partitions.values().map(|p| p.len()).sum()
    }

    /// Type of a column, taken from the first stored non-null value.
    fn column_type(&self, column: &str) -> Option<&'static str> {
        self.partitions
            .values()
            .flat_map(|p| p.values())
            .filter_map(|row| row.value(column))
            .find(|v| !v.is_null())
            .map(|v| v.type_name())
    }

    /// Reject statements the database would reject.
    fn check(&self, select: &Select) -> Result<(), io::Error> {
        let pk_columns = self.schema.partition_key_columns();

        let partition_restricted = pk_columns.iter().all(|c| {
            select
                .restrictions
                .iter()
                .any(|r| matches!(r, Restriction::Eq(col, _) if col == c))
        });

        for r in &select.restrictions {
            let Some(column) = r.column() else {
                if let Restriction::TokenGt(vs) = r {
                    if vs.len() != pk_columns.len() {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!(
                                "token() expects {} values, got {}",
                                pk_columns.len(),
                                vs.len()
                            ),
                        ));
                    }
                }
                continue;
            };

            let Some(def) = self.schema.column_def(column) else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "undefined column {:?} in {}",
                        column,
                        self.schema.qualified_name()
                    ),
                ));
            };

            let needs_filtering = match def.kind {
                ColumnKind::PartitionKey => {
                    !partition_restricted || !matches!(r, Restriction::Eq(..))
                }
                ColumnKind::Clustering(_) => !partition_restricted,
                ColumnKind::Regular => !def.indexed,
            };

            if let Restriction::Eq(_, v) | Restriction::Gt(_, v) | Restriction::Lt(_, v) = r {
                if let Some(want) = self.column_type(column) {
                    if !v.is_null() && v.type_name() != want {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!(
                                "invalid {} value {} for column {:?} of type {}",
                                v.type_name(),
                                v,
                                column,
                                want
                            ),
                        ));
                    }
                }
            }

            if needs_filtering && !select.allow_filtering {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "restriction on {:?} requires ALLOW FILTERING: {}",
                        column, select
                    ),
                ));
            }
        }

        Ok(())
    }

    fn select(&self, select: &Select) -> Result<Vec<Row>, io::Error> {
        self.check(select)?;

        let mut rows = vec![];
        if select.limit == 0 {
            return Ok(rows);
        }

        'partitions: for (pk, partition) in &self.partitions {
            for row in partition.values() {
                if select.restrictions.iter().all(|r| matches(r, pk, row)) {
                    rows.push(row.clone());
                    if rows.len() >= select.limit {
                        break 'partitions;
                    }
                }
            }
        }

        Ok(rows)
    }
}

fn matches(restriction: &Restriction, pk: &PartitionKey, row: &Row) -> bool {
    let value_of = |c: &str| row.value(c).cloned().unwrap_or(CqlValue::Null);

    match restriction {
        Restriction::TokenGt(vs) => pk.token > murmur3::token(vs),
        Restriction::Eq(c, v) => value_of(c) == *v,
        Restriction::Gt(c, v) => value_of(c) > *v,
        Restriction::Lt(c, v) => value_of(c) < *v,
    }
}

fn invalid_input(e: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}

/// An in-process store of tables that implements [`Session`].
///
/// # Examples
///
/// ```
/// use table_iter::impls::memory::MemorySession;
/// use table_iter::Row;
/// use table_iter::TableSchema;
///
/// # fn main() -> std::io::Result<()> {
/// let session = MemorySession::new();
/// session.create_table(TableSchema::new("tests", "kv").partition_key("k").column("v"))?;
/// session.insert("tests", "kv", Row::new().with("k", 1).with("v", "one"))?;
///
/// assert_eq!(1, session.len("tests", "kv")?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemorySession {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, schema: TableSchema) -> Result<(), io::Error> {
        schema.validate().map_err(invalid_input)?;

        let mut tables = self.tables.write().map_err(poisoned)?;

        let name = schema.qualified_name();
        if tables.contains_key(&name) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("table {} already exists", name),
            ));
        }

        debug!("MemorySession: create table {}", schema);
        tables.insert(name, MemoryTable {
            schema,
            partitions: BTreeMap::new(),
        });
        Ok(())
    }

    /// Insert a row, replacing any row with the same primary key.
    pub fn insert(&self, keyspace: &str, table: &str, row: Row) -> Result<(), io::Error> {
        self.insert_many(keyspace, table, [row])
    }

    pub fn insert_many(
        &self,
        keyspace: &str,
        table: &str,
        rows: impl IntoIterator<Item = Row>,
    ) -> Result<(), io::Error> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let t = tables
            .get_mut(&format!("{}.{}", keyspace, table))
            .ok_or_else(|| not_found(keyspace, table))?;

        for row in rows {
            t.insert(row)?;
        }
        Ok(())
    }

    /// Number of rows in a table.
    pub fn len(&self, keyspace: &str, table: &str) -> Result<usize, io::Error> {
        let tables = self.tables.read().map_err(poisoned)?;
        let t = tables
            .get(&format!("{}.{}", keyspace, table))
            .ok_or_else(|| not_found(keyspace, table))?;
        Ok(t.len())
    }

    fn select(&self, select: &Select) -> Result<Vec<Row>, io::Error> {
        let tables = self.tables.read().map_err(poisoned)?;
        let t = tables
            .get(&format!("{}.{}", select.keyspace, select.table))
            .ok_or_else(|| not_found(&select.keyspace, &select.table))?;

        let rows = t.select(select)?;

        if rows.len() > 1000 {
            warn!(
                "MemorySession::execute() returns big page of len={}: {}",
                rows.len(),
                select
            );
        }

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl Session for MemorySession {
    async fn execute(&self, select: &Select) -> Result<Vec<Row>, io::Error> {
        self.select(select)
    }
}

fn not_found(keyspace: &str, table: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("unconfigured table {}.{}", keyspace, table),
    )
}

fn poisoned<T>(_e: std::sync::PoisonError<T>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "MemorySession lock poisoned")
}
