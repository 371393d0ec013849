//! Document versioning: enable history, make a few edits, then restore an
//! older version.
//!
//! Run with: `cargo run --example versioning`

use sylvan::{Document, Engine};

#[tokio::main]
async fn main() -> sylvan::Result<()> {
    let engine = Engine::builder("notes").versioning(true, 5).build();
    engine.initialize().await?;

    let doc = engine
        .add_document(Document::new().add_text("title", "Draft").add_text("content", "version one"))
        .await?;
    let id = doc.id.clone();
    println!("Added document {id} at version {}", doc.version());

    for content in ["version two", "version three", "version four"] {
        let mut next = doc.clone();
        next.id = id.clone();
        next = next.add_field("content", content);
        let updated = engine.update_document(next).await?;
        println!("Updated to version {}: {}", updated.version(), updated.content());
    }

    let restored = engine.restore_version(&id, 1).await?;
    println!(
        "Restored to content of version 1 ({}); now stored as version {}",
        restored.content(),
        restored.version()
    );

    Ok(())
}
