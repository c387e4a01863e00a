use std::sync::Arc;

use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
};
use tower::util::ServiceExt;

use ludex_api::{routes, state::AppState};
use ludex_engine::Engine;
use ludex_testkit::{InMemoryStore, StaticEmbedder, catalog, config};

async fn test_state() -> AppState {
	let engine = Engine::bootstrap(
		config(),
		Arc::new(InMemoryStore::new(catalog())),
		Arc::new(StaticEmbedder::new()),
	)
	.await
	.expect("Failed to bootstrap engine.");

	AppState::with_engine(engine)
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let app = routes::router(test_state().await);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/health")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_returns_a_page() {
	let app = routes::router(test_state().await);
	let payload = serde_json::json!({ "query": "portal", "limit": 3, "use_hybrid": false });
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/search")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;

	assert_eq!(json["page"], 1);
	assert_eq!(json["page_size"], 3);
	assert!(json["items"].as_array().map(|items| items.len() <= 3).unwrap_or(false));
	assert!(json["items"][0]["payload"]["name"].is_string());
}

#[tokio::test]
async fn blank_search_is_a_bad_request() {
	let app = routes::router(test_state().await);
	let payload = serde_json::json!({ "query": "   " });
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/search")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /search.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = read_json(response).await;

	assert_eq!(json["error_code"], "empty_query");
}

#[tokio::test]
async fn unknown_game_is_not_found() {
	let app = routes::router(test_state().await);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/game/999999")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /game.");

	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let json = read_json(response).await;

	assert_eq!(json["error_code"], "unknown_item");
}

#[tokio::test]
async fn game_lookup_returns_payload() {
	let app = routes::router(test_state().await);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/game/400")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /game.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;

	assert_eq!(json["id"], "400");
	assert_eq!(json["payload"]["name"], "Portal");
}

#[tokio::test]
async fn discovery_games_returns_bare_list() {
	let app = routes::router(test_state().await);
	let payload = serde_json::json!({
		"positive_ids": ["400"],
		"negative_ids": [],
		"limit": 4,
		"diversity_factor": 0.5
	});
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/discovery-games")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /discovery-games.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;
	let items = json.as_array().expect("Expected a bare item list.");

	assert!(items.len() <= 4);
	assert!(items.iter().all(|item| item["id"] != "400"));
}

#[tokio::test]
async fn conflicting_discovery_sets_are_rejected() {
	let app = routes::router(test_state().await);
	let payload = serde_json::json!({
		"positive_ids": ["400"],
		"negative_ids": ["400"]
	});
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/discovery-games")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /discovery-games.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = read_json(response).await;

	assert_eq!(json["error_code"], "invalid_parameter");
}

#[tokio::test]
async fn discovery_context_honors_exclusions() {
	let app = routes::router(test_state().await);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/discovery-context/400?limit=5&excluded_ids=620,220")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /discovery-context.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;
	let items = json["items"].as_array().expect("Expected page items.");

	assert!(items.iter().all(|item| item["id"] != "400"));
	assert!(items.iter().all(|item| item["id"] != "620"));
	assert!(items.iter().all(|item| item["id"] != "220"));
	assert_eq!(json["page"], 1);
}

#[tokio::test]
async fn suggest_matches_names() {
	let app = routes::router(test_state().await);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/suggest?query=por&limit=5")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /suggest.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;
	let suggestions = json.as_array().expect("Expected a suggestion list.");

	assert_eq!(suggestions[0]["name"], "Portal");
}

#[tokio::test]
async fn random_games_honor_seed_and_limit() {
	let app = routes::router(test_state().await);
	let first = app
		.clone()
		.oneshot(
			Request::builder()
				.uri("/random-games?limit=4&random_seed=7")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /random-games.");

	assert_eq!(first.status(), StatusCode::OK);

	let first_json = read_json(first).await;
	let second = app
		.oneshot(
			Request::builder()
				.uri("/random-games?limit=4&random_seed=7")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /random-games.");
	let second_json = read_json(second).await;

	assert_eq!(first_json, second_json);
	assert_eq!(first_json.as_array().map(Vec::len), Some(4));
}
