use std::sync::Arc;

use futures_util::TryStreamExt;
use table_iter::impls::memory::MemorySession;
use table_iter::ClusteringOrder;
use table_iter::Model;
use table_iter::Row;
use table_iter::ScanError;
use table_iter::TableIterator;
use table_iter::TableSchema;

#[derive(Debug)]
struct Reading {
    site: String,
    sensor: i32,
    day: i32,
    seq: i32,
    kind: String,
}

impl Model for Reading {
    fn schema() -> TableSchema {
        TableSchema::new("demo", "reading")
            .partition_key("site")
            .partition_key("sensor")
            .clustering_key("day", ClusteringOrder::Desc)
            .clustering_key("seq", ClusteringOrder::Asc)
            .indexed_column("kind")
    }

    fn from_row(row: Row) -> Result<Self, ScanError> {
        Ok(Self {
            site: row.get("site")?,
            sensor: row.get("sensor")?,
            day: row.get("day")?,
            seq: row.get("seq")?,
            kind: row.get("kind")?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let session = Arc::new(MemorySession::new());
    session.create_table(Reading::schema())?;

    // Populate a table with composite partition and clustering keys
    for site in ["north", "south"] {
        for sensor in 0..3 {
            for day in 0..4 {
                for seq in 0..5 {
                    let kind = if seq % 2 == 0 { "temp" } else { "humidity" };
                    session.insert(
                        "demo",
                        "reading",
                        Row::new()
                            .with("site", site)
                            .with("sensor", sensor)
                            .with("day", day)
                            .with("seq", seq)
                            .with("kind", kind),
                    )?;
                }
            }
        }
    }

    // Stream every row, 7 rows per page
    let mut readings = TableIterator::<Reading, _>::new(session.clone())
        .blocksize(7)
        .into_stream()?;

    let mut n = 0;
    while let Some(r) = readings.try_next().await? {
        if n < 5 {
            println!("{:?}", r);
        }
        n += 1;
    }
    println!("all readings: {}", n);

    // Only rows with an indexed value
    let temps = TableIterator::<Reading, _>::new(session.clone())
        .blocksize(7)
        .filter("kind", "temp")
        .collect_all()
        .await?;
    println!("temp readings: {}", temps.len());

    if let Some(r) = temps.first() {
        println!(
            "first {} reading: {}/{} day {} seq {}",
            r.kind, r.site, r.sensor, r.day, r.seq
        );
    }

    Ok(())
}
