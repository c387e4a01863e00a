use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use ludex_domain::{
	ResultItem, Suggestion,
	pager::Page,
	query::{PreferenceQuery, Query as EngineQuery, SeedQuery, TextQuery},
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/search", post(search))
		.route("/suggest", get(suggest))
		.route("/game/{id}", get(game))
		.route("/random-games", get(random_games))
		.route("/discovery-games", post(discovery_games))
		.route("/discovery-context/{id}", get(discovery_context))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct SearchBody {
	query: String,
	limit: Option<u32>,
	offset: Option<u32>,
	#[serde(default = "default_true")]
	use_hybrid: bool,
}

async fn search(
	State(state): State<AppState>,
	Json(body): Json<SearchBody>,
) -> Result<Json<Page<ResultItem>>, ApiError> {
	let engine = &state.engine;
	let query = EngineQuery::Text(TextQuery {
		text: body.query,
		limit: body.limit.unwrap_or(engine.cfg.search.default_limit),
		offset: body.offset.unwrap_or(0),
		hybrid: body.use_hybrid,
	});
	let page = engine.execute(query).await?;

	Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct SuggestParams {
	query: String,
	limit: Option<usize>,
}

async fn suggest(
	State(state): State<AppState>,
	Query(params): Query<SuggestParams>,
) -> Json<Vec<Suggestion>> {
	let engine = &state.engine;
	let limit = params.limit.unwrap_or(engine.cfg.search.suggest_limit as usize);

	Json(engine.suggest(&params.query, limit))
}

async fn game(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<ResultItem>, ApiError> {
	let item = state.engine.game(&id).await?;

	Ok(Json(item))
}

#[derive(Debug, Deserialize)]
struct RandomParams {
	limit: Option<u32>,
	random_seed: Option<u64>,
}

async fn random_games(
	State(state): State<AppState>,
	Query(params): Query<RandomParams>,
) -> Result<Json<Vec<ResultItem>>, ApiError> {
	let engine = &state.engine;
	let limit = params.limit.unwrap_or(engine.cfg.search.discovery_limit);
	let items = engine.random(limit, params.random_seed).await?;

	Ok(Json(items))
}

#[derive(Debug, Deserialize)]
struct DiscoveryBody {
	#[serde(default)]
	positive_ids: Vec<String>,
	#[serde(default)]
	negative_ids: Vec<String>,
	#[serde(default)]
	excluded_ids: Vec<String>,
	limit: Option<u32>,
	diversity_factor: Option<f32>,
	random_seed: Option<u64>,
}

async fn discovery_games(
	State(state): State<AppState>,
	Json(body): Json<DiscoveryBody>,
) -> Result<Json<Vec<ResultItem>>, ApiError> {
	let engine = &state.engine;
	let query = EngineQuery::Preference(PreferenceQuery {
		positive_ids: body.positive_ids,
		negative_ids: body.negative_ids,
		excluded_ids: body.excluded_ids,
		limit: body.limit.unwrap_or(engine.cfg.search.discovery_limit),
		offset: 0,
		diversity_factor: body.diversity_factor,
		random_seed: body.random_seed,
	});
	let page = engine.execute(query).await?;

	Ok(Json(page.items))
}

#[derive(Debug, Deserialize)]
struct DiscoveryContextParams {
	limit: Option<u32>,
	offset: Option<u32>,
	/// Comma-separated list of ids to drop from the results.
	excluded_ids: Option<String>,
}

async fn discovery_context(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(params): Query<DiscoveryContextParams>,
) -> Result<Json<Page<ResultItem>>, ApiError> {
	let engine = &state.engine;
	let excluded_ids = params
		.excluded_ids
		.as_deref()
		.unwrap_or_default()
		.split(',')
		.map(str::trim)
		.filter(|id| !id.is_empty())
		.map(str::to_string)
		.collect();
	let query = EngineQuery::Seed(SeedQuery {
		seed_id: id,
		limit: params.limit.unwrap_or(engine.cfg.search.discovery_limit),
		offset: params.offset.unwrap_or(0),
		excluded_ids,
	});
	let page = engine.execute(query).await?;

	Ok(Json(page))
}

fn default_true() -> bool {
	true
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ludex_engine::Error> for ApiError {
	fn from(err: ludex_engine::Error) -> Self {
		let message = err.to_string();

		match err {
			ludex_engine::Error::EmptyQuery =>
				Self::new(StatusCode::BAD_REQUEST, "empty_query", message),
			ludex_engine::Error::InvalidParameter { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_parameter", message),
			ludex_engine::Error::UnknownItem { .. } =>
				Self::new(StatusCode::NOT_FOUND, "unknown_item", message),
			ludex_engine::Error::EmbeddingUnavailable { .. } =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "embedding_unavailable", message),
			ludex_engine::Error::BackendUnavailable { .. } =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
