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

//! Iterate over every row of a table.

use std::collections::VecDeque;
use std::marker::PhantomData;

use futures::executor::block_on_stream;
use futures::executor::BlockingStream;
use futures_util::StreamExt;
use futures_util::TryStreamExt;
use log::debug;
use log::info;

use crate::cursor::PageCursor;
use crate::errors::ScanError;
use crate::model::Model;
use crate::options::Filter;
use crate::options::ScanOptions;
use crate::row::Row;
use crate::session::Session;
use crate::value::CqlValue;
use crate::ModelStream;

/// Builds a scan over the whole table of model `M`, read through session `S`.
///
/// Pages are fetched lazily, one at a time, [`ScanOptions::blocksize`] rows per
/// page. Rows are yielded in token order, then in clustering order within a
/// partition.
///
/// # Examples
///
/// ```rust,no_run
/// # use table_iter::{ClusteringOrder, Model, Row, ScanError, TableSchema};
/// use std::sync::Arc;
///
/// use futures_util::TryStreamExt;
/// use table_iter::impls::memory::MemorySession;
/// use table_iter::TableIterator;
///
/// # struct Event { value: String }
/// # impl Model for Event {
/// #     fn schema() -> TableSchema {
/// #         TableSchema::new("tests", "event").partition_key("p_key").column("value")
/// #     }
/// #     fn from_row(row: Row) -> Result<Self, ScanError> {
/// #         Ok(Self { value: row.get("value")? })
/// #     }
/// # }
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let session = Arc::new(MemorySession::new());
///     session.create_table(Event::schema())?;
///
///     let mut events = TableIterator::<Event, _>::new(session)
///         .blocksize(100)
///         .into_stream()?;
///
///     while let Some(event) = events.try_next().await? {
///         println!("{}", event.value);
///     }
///     Ok(())
/// }
/// ```
pub struct TableIterator<M, S> {
    session: S,
    options: ScanOptions,
    filters: Vec<Filter>,
    _model: PhantomData<fn() -> M>,
}

impl<M, S> TableIterator<M, S>
where
    M: Model,
    S: Session + 'static,
{
    pub fn new(session: S) -> Self {
        Self {
            session,
            options: ScanOptions::default(),
            filters: vec![],
            _model: PhantomData,
        }
    }

    /// Number of rows fetched per query.
    pub fn blocksize(mut self, blocksize: usize) -> Self {
        self.options.blocksize = blocksize;
        self
    }

    /// Only yield rows where `column = value`.
    ///
    /// `column` must be a regular column, usually one with a secondary index.
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<CqlValue>) -> Self {
        self.filters.push(Filter::new(column, value));
        self
    }

    pub fn options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Start the scan.
    ///
    /// Configuration errors are returned here. Errors while scanning are
    /// yielded by the stream, which ends right after.
    pub fn into_stream(self) -> Result<ModelStream<M>, ScanError> {
        let schema = M::schema();
        let cursor = PageCursor::new(&schema, &self.options, self.filters)?;

        debug!(
            "TableIterator: scan {} with blocksize {}",
            schema, self.options.blocksize
        );

        let state = ScanState {
            session: self.session,
            cursor,
            buffered: VecDeque::new(),
            table: schema.qualified_name(),
            pages: 0,
            yielded: 0,
            failed: false,
        };

        let strm = futures::stream::unfold(state, |mut st| async move {
            loop {
                if let Some(row) = st.buffered.pop_front() {
                    let item = M::from_row(row);
                    if item.is_err() {
                        st.stop();
                    } else {
                        st.yielded += 1;
                    }
                    return Some((item, st));
                }

                let Some(select) = st.cursor.next_select() else {
                    if st.failed {
                        return None;
                    }
                    info!(
                        "TableIterator: scan {} complete: {} rows in {} pages",
                        st.table, st.yielded, st.pages
                    );
                    return None;
                };

                debug!("TableIterator: execute: {}", select);

                let res = st.session.execute(&select).await;
                let page = match res {
                    Ok(page) => page,
                    Err(e) => {
                        st.stop();
                        return Some((Err(ScanError::from(e)), st));
                    }
                };

                st.pages += 1;

                if let Err(e) = st.cursor.advance(&page) {
                    st.stop();
                    return Some((Err(e), st));
                }

                st.buffered.extend(page);
            }
        });

        Ok(strm.boxed())
    }

    /// Start the scan and pull rows synchronously.
    ///
    /// The session futures are driven on the current thread, so the session
    /// must not depend on a runtime that is not running.
    pub fn blocking(self) -> Result<BlockingStream<ModelStream<M>>, ScanError> {
        let strm = self.into_stream()?;
        Ok(block_on_stream(strm))
    }

    /// Scan the whole table into memory.
    pub async fn collect_all(self) -> Result<Vec<M>, ScanError> {
        let strm = self.into_stream()?;
        strm.try_collect().await
    }
}

struct ScanState<S> {
    session: S,
    cursor: PageCursor,
    buffered: VecDeque<Row>,
    table: String,
    pages: u64,
    yielded: u64,
    failed: bool,
}

impl<S> ScanState<S> {
    /// End the stream after an error has been yielded.
    fn stop(&mut self) {
        self.failed = true;
        self.cursor.finish();
        self.buffered.clear();
    }
}
