//! Property-style checks over the engine's public API: document ids,
//! metadata ordering, dangling references, score ordering, and cache
//! round-tripping all hold regardless of which particular documents or
//! queries exercise them.

use sylvan::{Document, Engine, SearchOptions};

fn doc(title: &str, content: &str) -> Document {
    Document::new().add_text("title", title).add_text("content", content)
}

#[tokio::test]
async fn every_stored_document_has_a_non_empty_id() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();

    let added = engine.add_document(doc("Rust Programming", "systems code")).await.unwrap();
    assert!(!added.id.is_empty());

    let with_id = engine.add_document(Document::with_id("explicit-id").add_text("title", "x")).await.unwrap();
    assert_eq!(with_id.id, "explicit-id");
}

#[tokio::test]
async fn last_modified_is_never_older_than_indexed() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();

    let added = engine.add_document(doc("Rust", "one")).await.unwrap();
    assert!(added.last_modified() >= added.indexed_at());

    let mut next = added.clone();
    next = next.add_field("content", "two");
    let updated = engine.update_document(next).await.unwrap();
    assert!(updated.last_modified() >= updated.indexed_at());
}

#[tokio::test]
async fn every_indexed_token_of_a_live_document_finds_it_by_exact_search() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();
    engine.add_document(doc("Rust Programming", "Learn systems programming")).await.unwrap();

    for token in ["rust", "programming", "learn", "systems"] {
        let results = engine.search(token, &SearchOptions::default()).await.unwrap();
        assert!(
            results.iter().any(|r| r.document.title() == "Rust Programming"),
            "expected token {token:?} to find the document"
        );
    }
}

#[tokio::test]
async fn removing_a_document_drops_it_from_every_token_it_used_to_match() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();
    let added = engine.add_document(doc("Rust Programming", "Learn systems programming")).await.unwrap();
    engine.remove_document(&added.id).await.unwrap();

    for token in ["rust", "programming", "learn", "systems"] {
        let results = engine.search(token, &SearchOptions::default()).await.unwrap();
        assert!(!results.iter().any(|r| r.id == added.id));
    }
}

#[tokio::test]
async fn results_are_sorted_by_score_descending_and_respect_max_results() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();
    for i in 0..10 {
        engine.add_document(doc(&format!("Rust note {i}"), "rust rust rust")).await.unwrap();
    }

    let options = SearchOptions::builder().max_results(3).build();
    let results = engine.search("rust", &options).await.unwrap();

    assert!(results.len() <= 3);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn returned_scores_never_fall_below_the_requested_threshold_fraction() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();
    engine.add_document(doc("Rust Programming", "rust rust rust systems")).await.unwrap();
    engine.add_document(doc("Rust Mention", "rust")).await.unwrap();

    let options = SearchOptions::builder().threshold(0.9).build();
    let results = engine.search("rust", &options).await.unwrap();
    let max_score = results.iter().map(|r| r.score).fold(0.0_f64, f64::max);
    for result in &results {
        assert!(max_score == 0.0 || result.score / max_score >= 0.9);
    }
}

#[tokio::test]
async fn exact_matcher_results_are_a_subset_of_fuzzy_matcher_results() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();
    engine.add_document(doc("Rust Programming", "systems")).await.unwrap();
    engine.add_document(doc("Russet Potatoes", "food")).await.unwrap();

    let exact = engine.search("rust", &SearchOptions::default()).await.unwrap();
    let fuzzy_options = SearchOptions::builder().fuzzy(2).build();
    let fuzzy = engine.search("rust", &fuzzy_options).await.unwrap();

    let fuzzy_ids: std::collections::HashSet<_> = fuzzy.iter().map(|r| r.id.clone()).collect();
    for result in &exact {
        assert!(fuzzy_ids.contains(&result.id));
    }
}

#[tokio::test]
async fn adding_then_removing_a_document_leaves_the_document_count_unchanged() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();
    let before = engine.get_stats().document_count;

    let added = engine.add_document(doc("Rust", "one")).await.unwrap();
    engine.remove_document(&added.id).await.unwrap();

    assert_eq!(engine.get_stats().document_count, before);
    let results = engine.search("rust", &SearchOptions::default()).await.unwrap();
    assert!(!results.iter().any(|r| r.id == added.id));
}

#[tokio::test]
async fn a_cleared_index_no_longer_serves_cached_results() {
    let engine = Engine::builder("catalog").build();
    engine.initialize().await.unwrap();
    engine.add_document(doc("Rust", "one")).await.unwrap();
    engine.search("rust", &SearchOptions::default()).await.unwrap();
    assert_eq!(engine.get_stats().cache_hits, 0);

    engine.search("rust", &SearchOptions::default()).await.unwrap();
    assert_eq!(engine.get_stats().cache_hits, 1);

    engine.clear_index().await.unwrap();
    let results = engine.search("rust", &SearchOptions::default()).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn version_numbers_recorded_in_history_increase_strictly() {
    let engine = Engine::builder("catalog").versioning(true, 10).build();
    engine.initialize().await.unwrap();
    let mut current = engine.add_document(doc("Notes", "v0")).await.unwrap();

    for i in 1..=4 {
        current = current.add_field("content", format!("v{i}"));
        current = engine.update_document(current).await.unwrap();
    }

    for pair in current.versions.windows(2) {
        assert!(pair[1].version > pair[0].version);
    }
    let max_recorded = current.versions.iter().map(|v| v.version).max().unwrap_or(0);
    assert_eq!(current.version(), max_recorded + 1);
}
