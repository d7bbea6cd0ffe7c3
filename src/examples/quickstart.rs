//! Quickstart Example
//!
//! Creates a database, stores and updates a document, queries a view and
//! cleans up. Needs a server on localhost:5984.
//!
//! Run with: cargo run --example quickstart

use divan_rs::{create_database, default_transport, delete_database, Document, ReturnMode};
use serde_json::json;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("divan_rs=debug,quickstart=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let transport = default_transport();
    let db = create_database(&transport, "quickstart", "localhost", 0).await?;
    println!("✅ Database created at {}\n", db.url());

    let mut doc = db
        .create(&json!({"title": "Hello", "tags": ["intro"]}), Some("posts/hello"))
        .await?;
    println!("📝 Created {} at revision {:?}", doc.url(), doc.revision());

    doc.set("title", "Hello, again");
    let rev = doc.save().await?;
    println!("   Updated to revision {}\n", rev);

    // A design document holding a single view
    db.create(
        &json!({
            "language": "javascript",
            "views": {
                "by_title": {"map": "function(doc) { if (doc.title) emit(doc.title, doc); }"}
            }
        }),
        Some("_design/posts"),
    )
    .await?;

    let result = db
        .view("posts/by_title", &[("limit", json!(10))], ReturnMode::Document)
        .await?;
    println!("🔍 View returned {} of {} rows:", result.len(), result.total_rows());
    for (i, doc) in result.documents().enumerate() {
        println!("   {}. {:?} -> {:?}", i + 1, doc.id(), doc.get("title"));
    }

    for row in db.get_all_documents(None, None, false).await? {
        println!("   all_docs: {}", row.id);
    }

    delete_database(&transport, "quickstart", "localhost", 0).await?;
    println!("\n🧹 Database removed");

    Ok(())
}
