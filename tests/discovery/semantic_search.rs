use std::collections::HashSet;
use std::sync::Arc;

use semantic_discovery_service::domain::entities::content_item::{
    ContentItem, ContentKind, ContentStats,
};
use semantic_discovery_service::domain::services::semantic_search::SUGGESTION_LIMIT;
use semantic_discovery_service::startup::Application;

use crate::helpers::{post, question, spawn_app, vector, FailingContentStore};

#[tokio::test]
async fn suggestions_skip_the_provider_for_too_short_keywords() {
    // Arrange
    let app = spawn_app().await;
    app.content_store.insert_content(
        post(1, "Tokio worker pools", "spawning tasks", Some(vector(&[1.0]))),
        ContentStats::default(),
    );

    // Act & Assert: below the 2-character floor, no provider call is made
    for keyword in ["", "a", "  a  ", " "] {
        let suggestions = app.semantic_search.suggest(keyword).await;
        assert!(suggestions.is_empty(), "keyword {:?}", keyword);
    }
    assert_eq!(app.embedder.calls(), 0);
}

#[tokio::test]
async fn suggestions_rank_across_both_collections_by_ascending_distance() {
    // Arrange
    let app = spawn_app().await;
    app.embedder.program("async runtime", vector(&[1.0, 0.0]));

    // Distances to the query: post A ≈ 0.29, question B ≈ 0.03, post C ≈ 0.11
    app.content_store.insert_content(
        post(1, "Tokio worker pools", "…", Some(vector(&[1.0, 1.0]))),
        ContentStats::default(),
    );
    app.content_store.insert_content(
        question(2, "Pinning futures", Some(vector(&[4.0, 1.0]))),
        ContentStats::default(),
    );
    app.content_store.insert_content(
        post(3, "Async streams", "…", Some(vector(&[2.0, 1.0]))),
        ContentStats::default(),
    );

    // Act
    let suggestions = app.semantic_search.suggest("async runtime").await;

    // Assert
    assert_eq!(
        suggestions,
        vec!["Pinning futures", "Async streams", "Tokio worker pools"]
    );
}

#[tokio::test]
async fn suggestions_exclude_items_without_an_embedding() {
    // Arrange
    let app = spawn_app().await;
    app.embedder.program("async runtime", vector(&[1.0, 0.0]));

    app.content_store.insert_content(
        post(1, "Embedded post", "…", Some(vector(&[1.0, 0.5]))),
        ContentStats::default(),
    );
    // Not yet backfilled: invisible to semantic queries
    app.content_store.insert_content(
        post(2, "Waiting for backfill", "…", None),
        ContentStats::default(),
    );

    // Act
    let suggestions = app.semantic_search.suggest("async runtime").await;

    // Assert
    assert_eq!(suggestions, vec!["Embedded post"]);
}

#[tokio::test]
async fn suggestions_collapse_duplicate_titles_onto_the_smallest_distance() {
    // Arrange
    let app = spawn_app().await;
    app.embedder.program("async runtime", vector(&[1.0, 0.0]));

    // The shared title is far as a post but close as a question
    app.content_store.insert_content(
        post(1, "Graceful shutdown", "…", Some(vector(&[1.0, 2.0]))),
        ContentStats::default(),
    );
    app.content_store.insert_content(
        question(2, "Graceful shutdown", Some(vector(&[8.0, 1.0]))),
        ContentStats::default(),
    );
    app.content_store.insert_content(
        post(3, "Select loops", "…", Some(vector(&[1.0, 1.0]))),
        ContentStats::default(),
    );

    // Act
    let suggestions = app.semantic_search.suggest("async runtime").await;

    // Assert: one entry per title, ranked by its closest occurrence
    assert_eq!(suggestions, vec!["Graceful shutdown", "Select loops"]);
}

#[tokio::test]
async fn suggestions_are_capped() {
    // Arrange
    let app = spawn_app().await;
    for id in 0..10 {
        app.content_store.insert_content(
            post(
                id,
                &format!("Post number {}", id),
                "…",
                Some(vector(&[1.0, id as f32])),
            ),
            ContentStats::default(),
        );
    }

    // Act
    let suggestions = app.semantic_search.suggest("async runtime").await;

    // Assert
    assert_eq!(suggestions.len(), SUGGESTION_LIMIT);
}

#[tokio::test]
async fn suggestions_degrade_to_empty_when_the_embedding_provider_fails() {
    // Arrange
    let app = spawn_app().await;
    app.content_store.insert_content(
        post(1, "Tokio worker pools", "…", Some(vector(&[1.0]))),
        ContentStats::default(),
    );
    app.embedder.fail(true);

    // Act
    let suggestions = app.semantic_search.suggest("async runtime").await;

    // Assert: the failure was swallowed after one outbound attempt
    assert!(suggestions.is_empty());
    assert_eq!(app.embedder.calls(), 1);
}

#[tokio::test]
async fn interactive_queries_degrade_to_empty_when_the_store_fails() {
    // Arrange
    let app = spawn_app().await;
    let application = Application::with_ports(
        app.embedder.clone(),
        app.image_provider.clone(),
        Arc::new(FailingContentStore),
    );
    let search = application.semantic_search();

    // Act & Assert: callers see "no matches", never a mid-query error
    assert!(search.suggest("async runtime").await.is_empty());
    assert!(search
        .search("async runtime", ContentKind::Post, 1, 10)
        .await
        .is_empty());
}

#[tokio::test]
async fn search_returns_an_empty_page_for_a_blank_keyword_without_calling_the_provider() {
    // Arrange
    let app = spawn_app().await;
    app.content_store.insert_content(
        post(1, "Tokio worker pools", "…", Some(vector(&[1.0]))),
        ContentStats::default(),
    );

    // Act
    let results = app
        .semantic_search
        .search("   ", ContentKind::Post, 1, 10)
        .await;

    // Assert
    assert!(results.is_empty());
    assert_eq!(app.embedder.calls(), 0);
}

#[tokio::test]
async fn search_accepts_single_character_keywords() {
    // Arrange: unlike suggestions, search has no 2-character floor
    let app = spawn_app().await;
    app.content_store.insert_content(
        post(1, "Tokio worker pools", "…", Some(vector(&[1.0]))),
        ContentStats::default(),
    );

    // Act
    let results = app.semantic_search.search("a", ContentKind::Post, 1, 10).await;

    // Assert
    assert_eq!(results.len(), 1);
    assert_eq!(app.embedder.calls(), 1);
}

#[tokio::test]
async fn search_scans_only_the_requested_collection() {
    // Arrange
    let app = spawn_app().await;
    app.content_store.insert_content(
        post(1, "Tokio worker pools", "…", Some(vector(&[1.0, 1.0]))),
        ContentStats::default(),
    );
    app.content_store.insert_content(
        question(2, "Pinning futures", Some(vector(&[1.0, 0.5]))),
        ContentStats::default(),
    );

    // Act
    let results = app
        .semantic_search
        .search("async runtime", ContentKind::Question, 1, 10)
        .await;

    // Assert
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, ContentKind::Question);
    assert_eq!(results[0].id, 2);
}

#[tokio::test]
async fn search_pages_are_sorted_disjoint_and_concatenate_to_the_full_ranking() {
    // Arrange
    let app = spawn_app().await;
    app.embedder.program("async runtime", vector(&[1.0, 0.0]));
    for id in 1..=9 {
        // Increasing first component: higher ids are closer to the query
        app.content_store.insert_content(
            post(
                id,
                &format!("Post number {}", id),
                "…",
                Some(vector(&[id as f32, 1.0])),
            ),
            ContentStats::default(),
        );
    }

    // Act
    let mut concatenated = Vec::new();
    for page in 1..=3 {
        let results = app
            .semantic_search
            .search("async runtime", ContentKind::Post, page, 3)
            .await;
        assert_eq!(results.len(), 3);
        concatenated.extend(results);
    }
    let single_page = app
        .semantic_search
        .search("async runtime", ContentKind::Post, 1, 9)
        .await;

    // Assert: no duplicates across pages
    let ids: Vec<i64> = concatenated.iter().map(|result| result.id).collect();
    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 9);

    // Distances never decrease within the concatenated ranking
    for window in concatenated.windows(2) {
        assert!(window[0].distance <= window[1].distance);
    }

    // Page-by-page equals one big page
    let single_page_ids: Vec<i64> = single_page.iter().map(|result| result.id).collect();
    assert_eq!(ids, single_page_ids);
}

#[tokio::test]
async fn search_beyond_the_last_page_is_empty() {
    // Arrange
    let app = spawn_app().await;
    for id in 1..=3 {
        app.content_store.insert_content(
            post(id, &format!("Post number {}", id), "…", Some(vector(&[1.0]))),
            ContentStats::default(),
        );
    }

    // Act
    let results = app
        .semantic_search
        .search("async runtime", ContentKind::Post, 5, 10)
        .await;

    // Assert
    assert!(results.is_empty());
}

#[tokio::test]
async fn search_hydrates_counters_tags_and_author_summary() {
    // Arrange
    let app = spawn_app().await;
    app.embedder.program("async runtime", vector(&[1.0, 0.0]));
    app.content_store
        .register_author(7, "alice", "https://img.example/alice.png");

    let created_at = chrono::Utc::now();
    app.content_store.insert_content(
        ContentItem {
            id: 1,
            kind: ContentKind::Post,
            title: "Tokio worker pools".to_string(),
            body: Some("spawning tasks".to_string()),
            tags: vec!["rust".to_string(), "async".to_string()],
            author_id: Some(7),
            created_at: Some(created_at),
            embedding: Some(vector(&[1.0, 0.5])),
        },
        ContentStats {
            total_likes: 3,
            total_favorites: 2,
            total_comments: 5,
        },
    );
    // No author reference at all: the summary still has a stable, empty shape
    app.content_store.insert_content(
        post(2, "Orphan post", "…", Some(vector(&[1.0, 2.0]))),
        ContentStats::default(),
    );

    // Act
    let results = app
        .semantic_search
        .search("async runtime", ContentKind::Post, 1, 10)
        .await;

    // Assert
    assert_eq!(results.len(), 2);

    let hydrated = &results[0];
    assert_eq!(hydrated.id, 1);
    assert_eq!(hydrated.body, "spawning tasks");
    assert_eq!(hydrated.published_at, created_at.to_rfc3339());
    assert_eq!(hydrated.total_likes, 3);
    assert_eq!(hydrated.total_favorites, 2);
    assert_eq!(hydrated.total_comments, 5);
    assert_eq!(hydrated.author.id, "7");
    assert_eq!(hydrated.author.nickname, "alice");
    assert_eq!(hydrated.author.avatar, "https://img.example/alice.png");
    assert_eq!(hydrated.tags, vec!["rust", "async"]);

    let orphan = &results[1];
    assert_eq!(orphan.author.id, "");
    assert_eq!(orphan.author.nickname, "");
    assert_eq!(orphan.author.avatar, "");
}
