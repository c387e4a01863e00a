use std::sync::Arc;

use ludex_engine::{Engine, Error};

use ludex_domain::query::{PreferenceQuery, Query, SeedQuery, TextQuery};
use ludex_testkit::{InMemoryStore, StaticEmbedder, catalog, config};

async fn engine() -> Engine {
	engine_with(InMemoryStore::new(catalog()), StaticEmbedder::new()).await
}

async fn engine_with(store: InMemoryStore, embedder: StaticEmbedder) -> Engine {
	Engine::bootstrap(config(), Arc::new(store), Arc::new(embedder))
		.await
		.expect("Failed to bootstrap engine.")
}

fn text_query(text: &str, limit: u32, hybrid: bool) -> Query {
	Query::Text(TextQuery { text: text.to_string(), limit, offset: 0, hybrid })
}

fn preference_query(
	positive: &[&str],
	negative: &[&str],
	limit: u32,
	diversity_factor: Option<f32>,
	random_seed: Option<u64>,
) -> Query {
	Query::Preference(PreferenceQuery {
		positive_ids: positive.iter().map(|id| id.to_string()).collect(),
		negative_ids: negative.iter().map(|id| id.to_string()).collect(),
		excluded_ids: Vec::new(),
		limit,
		offset: 0,
		diversity_factor,
		random_seed,
	})
}

#[tokio::test]
async fn text_search_ranks_within_limit() {
	let embedder =
		StaticEmbedder::new().with_override("puzzle platformer", vec![1.0, 0.0, 0.0, 0.0]);
	let engine = engine_with(InMemoryStore::new(catalog()), embedder).await;
	let page = engine
		.execute(text_query("puzzle platformer", 3, false))
		.await
		.expect("Search failed.");

	assert_eq!(page.items.len(), 3);
	assert_eq!(page.items[0].id, "400");
	assert_eq!(page.items[0].payload.name, "Portal");

	for pair in page.items.windows(2) {
		assert!(pair[0].score >= pair[1].score);
	}
}

#[tokio::test]
async fn text_search_is_idempotent() {
	let engine = engine().await;
	let first = engine
		.execute(text_query("space exploration", 5, false))
		.await
		.expect("Search failed.");
	let second = engine
		.execute(text_query("space exploration", 5, false))
		.await
		.expect("Search failed.");

	assert_eq!(first, second);
}

#[tokio::test]
async fn hybrid_search_is_deterministic() {
	let engine = engine().await;
	let first = engine.execute(text_query("portal", 5, true)).await.expect("Search failed.");
	let second = engine.execute(text_query("portal", 5, true)).await.expect("Search failed.");

	assert_eq!(first, second);
	assert!(!first.items.is_empty());
}

#[tokio::test]
async fn blank_text_is_rejected() {
	let engine = engine().await;
	let err = engine.execute(text_query("  \t ", 5, false)).await.unwrap_err();

	assert!(matches!(err, Error::EmptyQuery));
}

#[tokio::test]
async fn zero_limit_is_rejected() {
	let engine = engine().await;
	let err = engine.execute(text_query("portal", 0, false)).await.unwrap_err();

	assert!(matches!(err, Error::InvalidParameter { .. }));
}

#[tokio::test]
async fn unknown_seed_is_reported_by_id() {
	let engine = engine().await;
	let err = engine
		.execute(Query::Seed(SeedQuery {
			seed_id: "does-not-exist".to_string(),
			limit: 5,
			offset: 0,
			excluded_ids: Vec::new(),
		}))
		.await
		.unwrap_err();

	match err {
		Error::UnknownItem { id } => assert_eq!(id, "does-not-exist"),
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn seed_and_exclusions_never_appear_in_results() {
	let engine = engine().await;
	let page = engine
		.execute(Query::Seed(SeedQuery {
			seed_id: "400".to_string(),
			limit: 5,
			offset: 0,
			excluded_ids: vec!["620".to_string()],
		}))
		.await
		.expect("Recommend failed.");

	assert!(!page.items.is_empty());
	assert!(page.items.iter().all(|item| item.id != "400"));
	assert!(page.items.iter().all(|item| item.id != "620"));
}

#[tokio::test]
async fn empty_preferences_yield_nonempty_sample() {
	let engine = engine().await;
	let page = engine
		.execute(preference_query(&[], &[], 5, None, Some(42)))
		.await
		.expect("Discovery failed.");

	assert!(!page.items.is_empty());
	assert!(page.items.iter().all(|item| item.score == 1.0));
}

#[tokio::test]
async fn sampling_is_reproducible_per_seed() {
	let engine = engine().await;
	let first = engine
		.execute(preference_query(&[], &[], 5, None, Some(42)))
		.await
		.expect("Discovery failed.");
	let second = engine
		.execute(preference_query(&[], &[], 5, None, Some(42)))
		.await
		.expect("Discovery failed.");

	assert_eq!(first, second);
}

#[tokio::test]
async fn sampling_covers_limits_beyond_the_pool_setting() {
	let mut cfg = config();

	cfg.search.sample_pool = 3;

	let store = Arc::new(InMemoryStore::new(catalog()));
	let engine = Engine::bootstrap(cfg, store, Arc::new(StaticEmbedder::new()))
		.await
		.expect("Failed to bootstrap engine.");
	let page = engine
		.execute(preference_query(&[], &[], 5, None, Some(42)))
		.await
		.expect("Discovery failed.");

	assert_eq!(page.items.len(), 5);
}

#[tokio::test]
async fn zero_diversity_keeps_natural_order() {
	let engine = engine().await;
	let natural = engine
		.execute(preference_query(&["400"], &[], 5, None, None))
		.await
		.expect("Discovery failed.");
	let zeroed = engine
		.execute(preference_query(&["400"], &[], 5, Some(0.0), None))
		.await
		.expect("Discovery failed.");
	let natural_ids: Vec<&str> = natural.items.iter().map(|item| item.id.as_str()).collect();
	let zeroed_ids: Vec<&str> = zeroed.items.iter().map(|item| item.id.as_str()).collect();

	assert_eq!(natural_ids, zeroed_ids);
}

#[tokio::test]
async fn higher_diversity_widens_genre_spread() {
	let engine = engine().await;
	let natural = engine
		.execute(preference_query(&["400"], &[], 4, Some(0.0), None))
		.await
		.expect("Discovery failed.");
	let diverse = engine
		.execute(preference_query(&["400"], &[], 4, Some(0.9), None))
		.await
		.expect("Discovery failed.");
	let distinct = |items: &[ludex_domain::ResultItem]| {
		let mut genres: Vec<String> =
			items.iter().map(|item| item.payload.genres.clone()).collect();

		genres.sort();
		genres.dedup();
		genres.len()
	};

	assert!(distinct(&diverse.items) >= distinct(&natural.items));
}

#[tokio::test]
async fn diversity_leaves_page_metadata_intact() {
	let engine = engine().await;
	let natural = engine
		.execute(preference_query(&["400"], &[], 4, None, None))
		.await
		.expect("Discovery failed.");
	let diverse = engine
		.execute(preference_query(&["400"], &[], 4, Some(0.9), None))
		.await
		.expect("Discovery failed.");

	assert_eq!(diverse.total, natural.total);
	assert_eq!(diverse.pages, natural.pages);
	assert_eq!(diverse.items.len(), natural.items.len());
}

#[tokio::test]
async fn conflicting_preferences_are_rejected() {
	let engine = engine().await;
	let err = engine
		.execute(preference_query(&["400", "620"], &["620"], 5, None, None))
		.await
		.unwrap_err();

	assert!(matches!(err, Error::InvalidParameter { .. }));
}

#[tokio::test]
async fn unknown_negative_example_is_reported() {
	let engine = engine().await;
	let err = engine
		.execute(preference_query(&["400"], &["999999"], 5, None, None))
		.await
		.unwrap_err();

	match err {
		Error::UnknownItem { id } => assert_eq!(id, "999999"),
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn single_store_failure_is_retried() {
	let store = Arc::new(InMemoryStore::new(catalog()));
	let engine = Engine::bootstrap(config(), store.clone(), Arc::new(StaticEmbedder::new()))
		.await
		.expect("Failed to bootstrap engine.");

	store.fail_next(1);

	let page = engine.execute(text_query("portal", 5, false)).await.expect("Search failed.");

	assert!(!page.items.is_empty());
}

#[tokio::test]
async fn repeated_store_failures_surface_backend_unavailable() {
	let store = Arc::new(InMemoryStore::new(catalog()));
	let engine = Engine::bootstrap(config(), store.clone(), Arc::new(StaticEmbedder::new()))
		.await
		.expect("Failed to bootstrap engine.");

	// A dense search makes exactly one store call; two injected failures
	// exhaust the single retry.
	store.fail_next(2);

	let err = engine.execute(text_query("portal", 5, false)).await.unwrap_err();

	assert!(matches!(err, Error::BackendUnavailable { .. }));
}

#[tokio::test]
async fn pagination_metadata_survives_out_of_range_offsets() {
	let engine = engine().await;
	let page = engine
		.execute(Query::Seed(SeedQuery {
			seed_id: "400".to_string(),
			limit: 5,
			offset: 50,
			excluded_ids: Vec::new(),
		}))
		.await
		.expect("Recommend failed.");

	assert!(page.items.is_empty());
	assert!(page.total > 0);
	assert_eq!(page.page, 11);
	assert_eq!(page.page_size, 5);
}

#[tokio::test]
async fn game_lookup_round_trips() {
	let engine = engine().await;
	let item = engine.game("400").await.expect("Lookup failed.");

	assert_eq!(item.payload.name, "Portal");
	assert_eq!(item.score, 1.0);

	let err = engine.game("does-not-exist").await.unwrap_err();

	assert!(matches!(err, Error::UnknownItem { .. }));
}

#[tokio::test]
async fn random_games_are_reproducible_per_seed() {
	let engine = engine().await;
	let first = engine.random(4, Some(7)).await.expect("Sampling failed.");
	let second = engine.random(4, Some(7)).await.expect("Sampling failed.");

	assert_eq!(first, second);
	assert_eq!(first.len(), 4);
}

#[tokio::test]
async fn suggestions_rank_prefix_matches_first() {
	let engine = engine().await;
	let suggestions = engine.suggest("por", 5);

	assert_eq!(suggestions[0].name, "Portal");
	assert!(suggestions.iter().any(|suggestion| suggestion.name == "Portal 2"));
}
