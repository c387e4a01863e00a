pub mod discover;
pub mod recommend;
pub mod search;

mod error;
mod normalize;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use ludex_config::{Config, EmbeddingProviderConfig, SparseEmbeddingProviderConfig};
use ludex_domain::{
	ResultItem, SparseVector, Suggestion,
	pager::Page,
	query::Query,
	suggest::SuggestionIndex,
};
use ludex_providers::embedding;
use ludex_storage::{models::ScoredHit, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read seam over the vector store. The default impl delegates to
/// [`QdrantStore`]; tests drive the engine through an in-memory double.
pub trait ItemStore
where
	Self: Send + Sync,
{
	fn fetch<'a>(&'a self, ids: &'a [String])
	-> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>>;

	fn search_dense<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>>;

	fn search_hybrid<'a>(
		&'a self,
		dense: &'a [f32],
		sparse: &'a SparseVector,
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>>;

	fn recommend<'a>(
		&'a self,
		positive: &'a [String],
		negative: &'a [String],
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>>;

	fn sample<'a>(&'a self, limit: u64)
	-> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>>;

	fn list_names<'a>(&'a self) -> BoxFuture<'a, ludex_storage::Result<Vec<(String, String)>>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;

	fn embed_sparse<'a>(
		&'a self,
		cfg: &'a SparseEmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<SparseVector>>>;
}

struct DefaultEmbedding;

impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}

	fn embed_sparse<'a>(
		&'a self,
		cfg: &'a SparseEmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<SparseVector>>> {
		Box::pin(embedding::embed_sparse(cfg, texts))
	}
}

impl ItemStore for QdrantStore {
	fn fetch<'a>(
		&'a self,
		ids: &'a [String],
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(self.fetch(ids))
	}

	fn search_dense<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(self.search_dense(vector, limit))
	}

	fn search_hybrid<'a>(
		&'a self,
		dense: &'a [f32],
		sparse: &'a SparseVector,
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(self.search_hybrid(dense, sparse, limit))
	}

	fn recommend<'a>(
		&'a self,
		positive: &'a [String],
		negative: &'a [String],
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(self.recommend(positive, negative, limit))
	}

	fn sample<'a>(&'a self, limit: u64) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(self.sample(limit))
	}

	fn list_names<'a>(&'a self) -> BoxFuture<'a, ludex_storage::Result<Vec<(String, String)>>> {
		Box::pin(self.list_names())
	}
}

pub struct Engine {
	pub cfg: Config,
	pub store: Arc<dyn ItemStore>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	suggestions: SuggestionIndex,
}
impl Engine {
	/// Builds the engine over an already-bootstrapped store, loading the
	/// suggestion index from a name scroll.
	pub async fn bootstrap(
		cfg: Config,
		store: Arc<dyn ItemStore>,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Result<Self> {
		let backoff = Duration::from_millis(cfg.storage.qdrant.retry_backoff_ms);
		let names = retry_once(backoff, || store.list_names()).await?;
		let suggestions = SuggestionIndex::build(names);

		tracing::info!(names = suggestions.len(), "Suggestion index built.");

		Ok(Self { cfg, store, embedding, suggestions })
	}

	/// Convenience constructor wiring the default embedding provider.
	pub async fn with_store(cfg: Config, store: Arc<dyn ItemStore>) -> Result<Self> {
		Self::bootstrap(cfg, store, Arc::new(DefaultEmbedding)).await
	}

	/// Validates the query and dispatches on its variant.
	pub async fn execute(&self, query: Query) -> Result<Page<ResultItem>> {
		match query.validate()? {
			Query::Text(query) => self.search(query).await,
			Query::Seed(query) => self.similar(query).await,
			Query::Preference(query) => self.discover(query).await,
		}
	}

	pub fn suggest(&self, partial: &str, limit: usize) -> Vec<Suggestion> {
		self.suggestions.suggest(partial, limit)
	}

	pub(crate) fn backoff(&self) -> Duration {
		Duration::from_millis(self.cfg.storage.qdrant.retry_backoff_ms)
	}

	/// Candidate pool fetched before client-side pagination and re-ranking.
	pub(crate) fn candidate_pool(&self, limit: u32, offset: u32) -> u64 {
		(self.cfg.search.candidate_k as u64).max(offset as u64 + limit as u64)
	}

	/// Checks that every id resolves to a stored point, naming the first
	/// missing one in input order.
	pub(crate) async fn ensure_known(&self, ids: &[String]) -> Result<()> {
		if ids.is_empty() {
			return Ok(());
		}

		let hits = retry_once(self.backoff(), || self.store.fetch(ids)).await?;

		if let Some(missing) = ids.iter().find(|id| !hits.iter().any(|hit| &hit.id == *id)) {
			return Err(Error::UnknownItem { id: missing.clone() });
		}

		Ok(())
	}
}

/// Retries a failed collaborator call exactly once after `backoff`.
pub(crate) async fn retry_once<T, E, Fut, F>(
	backoff: Duration,
	mut op: F,
) -> std::result::Result<T, E>
where
	E: std::fmt::Display,
	F: FnMut() -> Fut,
	Fut: Future<Output = std::result::Result<T, E>>,
{
	match op().await {
		Ok(value) => Ok(value),
		Err(err) => {
			tracing::warn!(error = %err, "Call failed; retrying once.");
			tokio::time::sleep(backoff).await;

			op().await
		},
	}
}
