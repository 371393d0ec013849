//! Quickstart — your first full-text search with sylvan
//!
//! This minimal example shows how to:
//! 1. Build and initialize an in-memory search engine
//! 2. Index a few documents
//! 3. Search with a simple term query
//!
//! Run with: `cargo run --example quickstart`

use sylvan::{Document, Engine, SearchOptions};

#[tokio::main]
async fn main() -> sylvan::Result<()> {
    println!("=== sylvan quickstart ===\n");

    let engine = Engine::builder("articles").build();
    engine.initialize().await?;

    engine
        .add_document(
            Document::new()
                .add_text("title", "Introduction to Rust")
                .add_text("content", "Rust is a systems programming language focused on safety and performance."),
        )
        .await?;

    engine
        .add_document(
            Document::new()
                .add_text("title", "Python for Data Science")
                .add_text("content", "Python is a versatile language widely used in data science and machine learning."),
        )
        .await?;

    engine
        .add_document(
            Document::new()
                .add_text("title", "Web Development with JavaScript")
                .add_text("content", "JavaScript powers the modern web, from frontend frameworks to backend services."),
        )
        .await?;

    println!("Indexed 3 documents.\n");

    println!("[Search] term 'rust':");
    let results = engine.search("rust", &SearchOptions::default()).await?;
    for result in &results {
        println!("  {} (score {:.3})", result.document.title(), result.score);
    }

    println!("\n[Search] term 'language':");
    let results = engine.search("language", &SearchOptions::default()).await?;
    for result in &results {
        println!("  {} (score {:.3})", result.document.title(), result.score);
    }

    Ok(())
}
