//! Read-modify-write with revision conflicts
//!
//! Two writers increment the same counter. The loser of each race gets a
//! revision conflict, re-reads the document and tries again.
//!
//! Run with: cargo run --example conflict_retry

use divan_rs::{create_database, default_transport, delete_database, Connector, Document};
use serde_json::json;

const MAX_ATTEMPTS: usize = 5;

async fn increment(db: &Connector, id: &str) -> anyhow::Result<u64> {
    for attempt in 1..=MAX_ATTEMPTS {
        let Some(mut doc) = db.get(id).await? else {
            anyhow::bail!("counter {} does not exist", id);
        };
        let next = doc.get("count").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        doc.set("count", next);

        match db.update(&doc, None).await {
            Ok(_) => return Ok(next),
            Err(e) if e.is_conflict() => {
                tracing::info!(attempt, "Conflict on {}, retrying", id);
            }
            Err(e) => return Err(e.into()),
        }
    }
    anyhow::bail!("gave up on {} after {} attempts", id, MAX_ATTEMPTS)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("conflict_retry=info,divan_rs=warn")
        .init();

    let transport = default_transport();
    let db = create_database(&transport, "counters", "localhost", 0).await?;
    let counter = db.create(&json!({"count": 0}), Some("hits")).await?;
    println!("Counter at {}", counter.url());

    let (a, b) = tokio::join!(increment(&db, "hits"), increment(&db, "hits"));
    println!("Writer A saw {}, writer B saw {}", a?, b?);

    delete_database(&transport, "counters", "localhost", 0).await?;
    Ok(())
}
