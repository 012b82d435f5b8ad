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

//! Tracks where a table scan is and which query fetches the next page.
//!
//! A full table scan walks partitions in token order. A page may end in the
//! middle of a partition, and `token(pk) > token(last)` would skip the rest of
//! that partition. So after a page that ends inside a partition, the cursor
//! first finishes that partition by slicing on the clustering columns, from the
//! deepest column up to the first one:
//!
//! ```text
//! boundary: pk = (1, 2), clustering = (a, b, c)
//!
//! depth 2: pk = (1, 2) AND c0 = a AND c1 = b AND c2 > c
//! depth 1: pk = (1, 2) AND c0 = a AND c1 > b
//! depth 0: pk = (1, 2) AND c0 > a
//! then:    token(pk) > token(1, 2)
//! ```
//!
//! A `DESC` clustering column uses `<` instead of `>`.
//! Whenever a page is full, the boundary moves to its last row and the
//! slicing restarts from the deepest column.

use std::fmt;

use log::debug;

use crate::errors::ScanError;
use crate::options::Filter;
use crate::options::ScanOptions;
use crate::row::Row;
use crate::schema::ClusteringOrder;
use crate::schema::TableSchema;
use crate::statement::Restriction;
use crate::statement::Select;
use crate::value::CqlValue;

/// The primary key of the last row seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub partition: Vec<CqlValue>,
    pub clustering: Vec<CqlValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Nothing fetched yet.
    Start,

    /// Continue with the partitions whose token is after this partition key.
    AfterPartition { partition: Vec<CqlValue> },

    /// Finish the partition of `boundary`, slicing on clustering column `depth`.
    InPartition { boundary: Boundary, depth: usize },

    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => write!(f, "Start"),
            Phase::AfterPartition { partition } => {
                write!(f, "AfterPartition({})", join(partition))
            }
            Phase::InPartition { boundary, depth } => write!(
                f,
                "InPartition(({}), ({}), depth={})",
                join(&boundary.partition),
                join(&boundary.clustering),
                depth
            ),
            Phase::Done => write!(f, "Done"),
        }
    }
}

/// Pagination state of a scan over one table.
///
/// Call [`PageCursor::next_select`] to get the query of the next page, execute
/// it, then feed the page to [`PageCursor::advance`].
#[derive(Debug, Clone)]
pub struct PageCursor {
    keyspace: String,
    table: String,
    partition_key: Vec<String>,
    clustering: Vec<(String, ClusteringOrder)>,
    filters: Vec<Filter>,
    limit: usize,
    allow_filtering: bool,
    phase: Phase,
}

impl PageCursor {
    pub fn new(
        schema: &TableSchema,
        options: &ScanOptions,
        filters: Vec<Filter>,
    ) -> Result<Self, ScanError> {
        schema.validate()?;
        options.validate()?;
        for f in &filters {
            f.validate(schema)?;
        }

        let allow_filtering = options.allow_filtering || !filters.is_empty();

        Ok(Self {
            keyspace: schema.keyspace.clone(),
            table: schema.name.clone(),
            partition_key: to_strings(schema.partition_key_columns()),
            clustering: schema
                .clustering_columns()
                .into_iter()
                .map(|(c, o)| (c.to_string(), o))
                .collect(),
            filters,
            limit: options.blocksize,
            allow_filtering,
            phase: Phase::Start,
        })
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Stop the scan, e.g., after an error.
    pub fn finish(&mut self) {
        self.phase = Phase::Done;
    }

    /// Build the query of the next page, or `None` if the scan is complete.
    pub fn next_select(&self) -> Option<Select> {
        let mut restrictions = vec![];

        match &self.phase {
            Phase::Done => return None,
            Phase::Start => {}
            Phase::AfterPartition { partition } => {
                restrictions.push(Restriction::TokenGt(partition.clone()));
            }
            Phase::InPartition { boundary, depth } => {
                let depth = *depth;

                for (c, v) in self.partition_key.iter().zip(&boundary.partition) {
                    restrictions.push(Restriction::Eq(c.clone(), v.clone()));
                }

                for ((c, _), v) in self.clustering[..depth]
                    .iter()
                    .zip(&boundary.clustering[..depth])
                {
                    restrictions.push(Restriction::Eq(c.clone(), v.clone()));
                }

                let (c, order) = &self.clustering[depth];
                let v = boundary.clustering[depth].clone();
                let after = match order {
                    ClusteringOrder::Asc => Restriction::Gt(c.clone(), v),
                    ClusteringOrder::Desc => Restriction::Lt(c.clone(), v),
                };
                restrictions.push(after);
            }
        }

        for f in &self.filters {
            restrictions.push(Restriction::Eq(f.column.clone(), f.value.clone()));
        }

        Some(Select {
            keyspace: self.keyspace.clone(),
            table: self.table.clone(),
            partition_key: self.partition_key.clone(),
            restrictions,
            limit: self.limit,
            allow_filtering: self.allow_filtering,
        })
    }

    /// Update the state with the page returned for the last [`PageCursor::next_select`].
    ///
    /// A page shorter than the limit means the current query is exhausted.
    pub fn advance(&mut self, page: &[Row]) -> Result<(), ScanError> {
        let full = page.len() >= self.limit;
        let last = page.last().map(|r| self.boundary_of(r)).transpose()?;

        let prev = std::mem::replace(&mut self.phase, Phase::Done);

        let next = match prev {
            Phase::Done => Phase::Done,
            Phase::Start | Phase::AfterPartition { .. } => match last {
                Some(b) if full => self.enter_partition(b),
                _ => Phase::Done,
            },
            Phase::InPartition { boundary, depth } => match last {
                Some(b) if full => self.enter_partition(b),
                last => {
                    // Rows of this page share the clustering prefix up to `depth` with `boundary`.
                    let b = last.unwrap_or(boundary);
                    if depth == 0 {
                        Phase::AfterPartition {
                            partition: b.partition,
                        }
                    } else {
                        Phase::InPartition {
                            boundary: b,
                            depth: depth - 1,
                        }
                    }
                }
            },
        };

        debug!(
            "{}.{}: page of {} rows (limit {}), next phase: {}",
            self.keyspace,
            self.table,
            page.len(),
            self.limit,
            next
        );

        self.phase = next;
        Ok(())
    }

    fn enter_partition(&self, boundary: Boundary) -> Phase {
        if self.clustering.is_empty() {
            Phase::AfterPartition {
                partition: boundary.partition,
            }
        } else {
            Phase::InPartition {
                boundary,
                depth: self.clustering.len() - 1,
            }
        }
    }

    fn boundary_of(&self, row: &Row) -> Result<Boundary, ScanError> {
        Ok(Boundary {
            partition: row.project(self.partition_key.iter().map(|s| s.as_str()))?,
            clustering: row.project(self.clustering.iter().map(|(s, _)| s.as_str()))?,
        })
    }
}

fn to_strings(v: Vec<&str>) -> Vec<String> {
    v.into_iter().map(|s| s.to_string()).collect()
}

fn join(values: &[CqlValue]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn composite() -> TableSchema {
        TableSchema::new("tests", "multi")
            .partition_key("pa")
            .partition_key("pb")
            .clustering_key("ca", ClusteringOrder::Asc)
            .clustering_key("cb", ClusteringOrder::Desc)
            .clustering_key("cc", ClusteringOrder::Asc)
            .column("value")
    }

    fn no_clustering() -> TableSchema {
        TableSchema::new("tests", "flat")
            .partition_key("k")
            .column("value")
    }

    fn opts(blocksize: usize) -> ScanOptions {
        ScanOptions {
            blocksize,
            ..Default::default()
        }
    }

    fn row(pa: i32, pb: i32, ca: i32, cb: i32, cc: i32) -> Row {
        Row::new()
            .with("pa", pa)
            .with("pb", pb)
            .with("ca", ca)
            .with("cb", cb)
            .with("cc", cc)
    }

    fn ints(v: &[i32]) -> Vec<CqlValue> {
        v.iter().map(|x| CqlValue::Int(*x)).collect()
    }

    fn cql(c: &PageCursor) -> String {
        c.next_select().map(|s| s.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            PageCursor::new(&composite(), &opts(0), vec![]),
            Err(ScanError::InvalidBlockSize(0))
        ));
        assert!(matches!(
            PageCursor::new(&composite(), &opts(1), vec![Filter::new("ca", 1)]),
            Err(ScanError::FilterOnKeyColumn { .. })
        ));
        assert!(matches!(
            PageCursor::new(&TableSchema::new("a", "b"), &opts(1), vec![]),
            Err(ScanError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_start_short_page_is_done() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&composite(), &opts(3), vec![])?;
        assert_eq!("SELECT * FROM tests.multi LIMIT 3", cql(&c));

        c.advance(&[row(0, 0, 0, 0, 0)])?;
        assert!(c.is_done());
        assert_eq!(None, c.next_select());
        Ok(())
    }

    #[test]
    fn test_empty_table() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&composite(), &opts(3), vec![])?;
        c.advance(&[])?;
        assert!(c.is_done());
        Ok(())
    }

    #[test]
    fn test_full_page_finishes_partition_from_deepest_column() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&composite(), &opts(2), vec![])?;

        c.advance(&[row(1, 2, 0, 1, 0), row(1, 2, 3, 4, 5)])?;
        assert_eq!(
            &Phase::InPartition {
                boundary: Boundary {
                    partition: ints(&[1, 2]),
                    clustering: ints(&[3, 4, 5]),
                },
                depth: 2,
            },
            c.phase()
        );
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE "pa" = 1 AND "pb" = 2 AND "ca" = 3 AND "cb" = 4 AND "cc" > 5 LIMIT 2"#,
            cql(&c)
        );

        // Short page at depth 2: go up one column. `cb` is DESC.
        c.advance(&[row(1, 2, 3, 4, 6)])?;
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE "pa" = 1 AND "pb" = 2 AND "ca" = 3 AND "cb" < 4 LIMIT 2"#,
            cql(&c)
        );

        // Empty page at depth 1 keeps the boundary.
        c.advance(&[])?;
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE "pa" = 1 AND "pb" = 2 AND "ca" > 3 LIMIT 2"#,
            cql(&c)
        );

        // Partition complete: move on by token.
        c.advance(&[row(1, 2, 4, 0, 0)])?;
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE token("pa", "pb") > token(1, 2) LIMIT 2"#,
            cql(&c)
        );

        c.advance(&[])?;
        assert!(c.is_done());
        Ok(())
    }

    #[test]
    fn test_full_page_in_partition_restarts_from_deepest_column() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&composite(), &opts(1), vec![])?;

        c.advance(&[row(1, 2, 0, 0, 0)])?;
        c.advance(&[])?;
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE "pa" = 1 AND "pb" = 2 AND "ca" = 0 AND "cb" < 0 LIMIT 1"#,
            cql(&c)
        );

        c.advance(&[row(1, 2, 0, -1, 7)])?;
        assert_eq!(
            &Phase::InPartition {
                boundary: Boundary {
                    partition: ints(&[1, 2]),
                    clustering: ints(&[0, -1, 7]),
                },
                depth: 2,
            },
            c.phase()
        );
        Ok(())
    }

    #[test]
    fn test_no_clustering_columns() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&no_clustering(), &opts(2), vec![])?;

        c.advance(&[Row::new().with("k", 5), Row::new().with("k", 9)])?;
        assert_eq!(
            r#"SELECT * FROM tests.flat WHERE token("k") > token(9) LIMIT 2"#,
            cql(&c)
        );

        c.advance(&[Row::new().with("k", 1)])?;
        assert!(c.is_done());
        Ok(())
    }

    #[test]
    fn test_filters_are_appended() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&composite(), &opts(1), vec![Filter::new("value", "x")])?;
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE "value" = 'x' LIMIT 1 ALLOW FILTERING"#,
            cql(&c)
        );

        c.advance(&[row(1, 1, 1, 1, 1)])?;
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE "pa" = 1 AND "pb" = 1 AND "ca" = 1 AND "cb" = 1 AND "cc" > 1 AND "value" = 'x' LIMIT 1 ALLOW FILTERING"#,
            cql(&c)
        );
        Ok(())
    }

    #[test]
    fn test_allow_filtering_without_filters() -> anyhow::Result<()> {
        let opts = ScanOptions {
            blocksize: 1,
            allow_filtering: true,
        };
        let mut c = PageCursor::new(&composite(), &opts, vec![])?;
        assert_eq!("SELECT * FROM tests.multi LIMIT 1 ALLOW FILTERING", cql(&c));

        c.advance(&[row(1, 1, 1, 1, 1)])?;
        assert_eq!(
            r#"SELECT * FROM tests.multi WHERE "pa" = 1 AND "pb" = 1 AND "ca" = 1 AND "cb" = 1 AND "cc" > 1 LIMIT 1 ALLOW FILTERING"#,
            cql(&c)
        );
        Ok(())
    }

    #[test]
    fn test_row_without_key_column() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&composite(), &opts(1), vec![])?;

        let err = c.advance(&[Row::new().with("pa", 1)]).unwrap_err();
        assert!(matches!(err, ScanError::MissingColumn { ref column } if column == "pb"));
        assert_eq!(&Phase::Start, c.phase());
        Ok(())
    }

    #[test]
    fn test_finish() -> anyhow::Result<()> {
        let mut c = PageCursor::new(&composite(), &opts(1), vec![])?;
        c.finish();
        assert_eq!(None, c.next_select());
        assert_eq!("Done", c.phase().to_string());
        Ok(())
    }
}
