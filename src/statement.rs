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

//! The `SELECT` statements a scan issues.
//!
//! Statements are kept structured so that an in-process [`Session`](crate::Session)
//! can evaluate them directly, while a driver backed session renders them with
//! [`Select::to_cql`].

use std::fmt;

use crate::value::CqlValue;

/// A single `WHERE` clause relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    /// `token(partition key columns) > token(values)`.
    TokenGt(Vec<CqlValue>),
    Eq(String, CqlValue),
    Gt(String, CqlValue),
    Lt(String, CqlValue),
}

impl Restriction {
    /// The column this relation applies to, `None` for a token relation.
    pub fn column(&self) -> Option<&str> {
        match self {
            Restriction::TokenGt(_) => None,
            Restriction::Eq(c, _) | Restriction::Gt(c, _) | Restriction::Lt(c, _) => Some(c),
        }
    }
}

/// `SELECT * FROM keyspace.table WHERE ... LIMIT n [ALLOW FILTERING]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub keyspace: String,
    pub table: String,

    /// Partition key columns, required to render [`Restriction::TokenGt`].
    pub partition_key: Vec<String>,

    pub restrictions: Vec<Restriction>,
    pub limit: usize,
    pub allow_filtering: bool,
}

impl Select {
    /// Render as CQL text with `?` bind markers and the bind values in marker order.
    pub fn to_cql(&self) -> (String, Vec<CqlValue>) {
        let mut cql = format!("SELECT * FROM {}.{}", self.keyspace, self.table);
        let mut values = vec![];

        let mut relations = vec![];
        for r in &self.restrictions {
            match r {
                Restriction::TokenGt(vs) => {
                    let cols = self
                        .partition_key
                        .iter()
                        .map(|c| quote(c))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let markers = vec!["?"; vs.len()].join(", ");
                    relations.push(format!("token({}) > token({})", cols, markers));
                    values.extend(vs.iter().cloned());
                }
                Restriction::Eq(c, v) => {
                    relations.push(format!("{} = ?", quote(c)));
                    values.push(v.clone());
                }
                Restriction::Gt(c, v) => {
                    relations.push(format!("{} > ?", quote(c)));
                    values.push(v.clone());
                }
                Restriction::Lt(c, v) => {
                    relations.push(format!("{} < ?", quote(c)));
                    values.push(v.clone());
                }
            }
        }

        if !relations.is_empty() {
            cql.push_str(" WHERE ");
            cql.push_str(&relations.join(" AND "));
        }

        cql.push_str(&format!(" LIMIT {}", self.limit));

        if self.allow_filtering {
            cql.push_str(" ALLOW FILTERING");
        }

        (cql, values)
    }
}

/// Displays the statement with the bind values inlined as literals, for logging.
impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (cql, values) = self.to_cql();

        let mut values = values.iter();
        for (i, part) in cql.split('?').enumerate() {
            if i > 0 {
                match values.next() {
                    Some(v) => write!(f, "{}", v)?,
                    None => write!(f, "?")?,
                }
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

fn quote(column: &str) -> String {
    format!("\"{}\"", column.replace('"', "\"\""))
}
