//! Fuzzy and regex matching over a small catalog.
//!
//! Run with: `cargo run --example fuzzy_and_regex`

use sylvan::{Document, Engine, SearchOptions};

#[tokio::main]
async fn main() -> sylvan::Result<()> {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await?;

    engine
        .add_document(Document::new().add_text("title", "Rust Programming").add_text("content", "systems"))
        .await?;
    engine
        .add_document(Document::new().add_text("title", "Rusty Old Truck").add_text("content", "vehicles"))
        .await?;
    engine
        .add_document(Document::new().add_text("title", "Crusty Bread Recipe").add_text("content", "baking"))
        .await?;

    println!("[Fuzzy] 'russt' (max_distance=2):");
    let options = SearchOptions::builder().fuzzy(2).build();
    for result in engine.search("russt", &options).await? {
        println!("  {} (score {:.3})", result.document.title(), result.score);
    }

    println!("\n[Regex] title field matching 'rust.*'...");
    let options = SearchOptions::builder().fields(vec!["title".to_string()]).regex("rust.*").build();
    for result in engine.search("", &options).await? {
        println!("  {} (score {:.3})", result.document.title(), result.score);
    }

    Ok(())
}
