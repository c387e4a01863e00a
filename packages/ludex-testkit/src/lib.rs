//! In-memory doubles for driving the engine and the HTTP app without a
//! running Qdrant or embedding service.

use std::{
	collections::hash_map::DefaultHasher,
	hash::{Hash, Hasher},
	sync::atomic::{AtomicUsize, Ordering},
};

use serde_json::{Map, Value};

use ludex_config::{
	Config, EmbeddingProviderConfig, Providers, Qdrant, Search, Service,
	SparseEmbeddingProviderConfig, Storage,
};
use ludex_domain::SparseVector;
use ludex_engine::{BoxFuture, EmbeddingProvider, ItemStore};
use ludex_storage::models::ScoredHit;

pub const TEST_VECTOR_DIM: u32 = 4;

/// A catalog item held by [`InMemoryStore`].
#[derive(Debug, Clone)]
pub struct TestItem {
	pub id: String,
	pub name: String,
	pub genres: String,
	pub price: f64,
	pub vector: Vec<f32>,
	pub sparse: SparseVector,
}
impl TestItem {
	pub fn new(id: &str, name: &str, genres: &str, vector: Vec<f32>) -> Self {
		Self {
			id: id.to_string(),
			name: name.to_string(),
			genres: genres.to_string(),
			price: 9.99,
			vector,
			sparse: sparse_of(name),
		}
	}

	fn payload(&self) -> Map<String, Value> {
		let mut payload = Map::new();

		payload.insert("name".to_string(), Value::from(self.name.clone()));
		payload.insert(
			"steam_appid".to_string(),
			Value::from(self.id.parse::<u64>().unwrap_or(0)),
		);
		payload.insert("price".to_string(), Value::from(self.price));
		payload.insert("genres".to_string(), Value::from(self.genres.clone()));

		payload
	}

	fn hit(&self, score: f32) -> ScoredHit {
		ScoredHit { id: self.id.clone(), score, payload: self.payload() }
	}
}

/// Deterministic [`ItemStore`] double with failure injection.
pub struct InMemoryStore {
	items: Vec<TestItem>,
	failures: AtomicUsize,
}
impl InMemoryStore {
	pub fn new(items: Vec<TestItem>) -> Self {
		Self { items, failures: AtomicUsize::new(0) }
	}

	/// Makes the next `count` store calls fail.
	pub fn fail_next(&self, count: usize) {
		self.failures.store(count, Ordering::SeqCst);
	}

	fn check_failure(&self) -> ludex_storage::Result<()> {
		let outcome = self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
			(left > 0).then(|| left - 1)
		});

		match outcome {
			Ok(_) => Err(ludex_storage::Error::InvalidArgument("Injected failure.".to_string())),
			Err(_) => Ok(()),
		}
	}

	fn rank_by<F>(&self, score_fn: F, limit: u64) -> Vec<ScoredHit>
	where
		F: Fn(&TestItem) -> f32,
	{
		let mut hits: Vec<ScoredHit> =
			self.items.iter().map(|item| item.hit(score_fn(item))).collect();

		hits.sort_by(|a, b| {
			b.score
				.partial_cmp(&a.score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| a.id.cmp(&b.id))
		});
		hits.truncate(limit as usize);

		hits
	}

	fn vector_of(&self, id: &str) -> Option<Vec<f32>> {
		self.items.iter().find(|item| item.id == id).map(|item| item.vector.clone())
	}
}

impl ItemStore for InMemoryStore {
	fn fetch<'a>(
		&'a self,
		ids: &'a [String],
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(async move {
			self.check_failure()?;

			Ok(ids
				.iter()
				.filter_map(|id| self.items.iter().find(|item| &item.id == id))
				.map(|item| item.hit(1.0))
				.collect())
		})
	}

	fn search_dense<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(async move {
			self.check_failure()?;

			Ok(self.rank_by(|item| cosine(vector, &item.vector), limit))
		})
	}

	fn search_hybrid<'a>(
		&'a self,
		dense: &'a [f32],
		sparse: &'a SparseVector,
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(async move {
			self.check_failure()?;

			let dense_ranked: Vec<String> = self
				.rank_by(|item| cosine(dense, &item.vector), limit)
				.into_iter()
				.map(|hit| hit.id)
				.collect();
			let sparse_ranked: Vec<String> = self
				.rank_by(|item| sparse_dot(sparse, &item.sparse), limit)
				.into_iter()
				.map(|hit| hit.id)
				.collect();
			let fused = ludex_domain::fusion::reciprocal_rank_fuse(&[dense_ranked, sparse_ranked]);

			Ok(fused
				.into_iter()
				.take(limit as usize)
				.filter_map(|(id, score)| {
					self.items.iter().find(|item| item.id == id).map(|item| item.hit(score))
				})
				.collect())
		})
	}

	fn recommend<'a>(
		&'a self,
		positive: &'a [String],
		negative: &'a [String],
		limit: u64,
	) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(async move {
			self.check_failure()?;

			let positives: Vec<Vec<f32>> =
				positive.iter().filter_map(|id| self.vector_of(id)).collect();
			let negatives: Vec<Vec<f32>> =
				negative.iter().filter_map(|id| self.vector_of(id)).collect();

			if positives.is_empty() && negatives.is_empty() {
				return Err(ludex_storage::Error::InvalidArgument(
					"Recommend requires at least one example id.".to_string(),
				));
			}

			let dim = TEST_VECTOR_DIM as usize;
			let target = subtract(&average(&positives, dim), &average(&negatives, dim));
			let mut hits = self.rank_by(|item| cosine(&target, &item.vector), u64::MAX);

			// Example points never come back from the store.
			hits.retain(|hit| !positive.contains(&hit.id) && !negative.contains(&hit.id));
			hits.truncate(limit as usize);

			Ok(hits)
		})
	}

	fn sample<'a>(&'a self, limit: u64) -> BoxFuture<'a, ludex_storage::Result<Vec<ScoredHit>>> {
		Box::pin(async move {
			self.check_failure()?;

			Ok(self.items.iter().take(limit as usize).map(|item| item.hit(1.0)).collect())
		})
	}

	fn list_names<'a>(&'a self) -> BoxFuture<'a, ludex_storage::Result<Vec<(String, String)>>> {
		Box::pin(async move {
			self.check_failure()?;

			Ok(self.items.iter().map(|item| (item.id.clone(), item.name.clone())).collect())
		})
	}
}

/// Deterministic embedding double: token-hash vectors, with optional exact
/// overrides keyed by input text.
#[derive(Default)]
pub struct StaticEmbedder {
	overrides: Vec<(String, Vec<f32>)>,
}
impl StaticEmbedder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_override(mut self, text: &str, vector: Vec<f32>) -> Self {
		self.overrides.push((text.to_string(), vector));

		self
	}

	fn vector_for(&self, text: &str) -> Vec<f32> {
		self.overrides
			.iter()
			.find(|(key, _)| key == text)
			.map(|(_, vector)| vector.clone())
			.unwrap_or_else(|| hash_vector(text, TEST_VECTOR_DIM as usize))
	}
}

impl EmbeddingProvider for StaticEmbedder {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(texts.iter().map(|text| self.vector_for(text)).collect()) })
	}

	fn embed_sparse<'a>(
		&'a self,
		_cfg: &'a SparseEmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<SparseVector>>> {
		Box::pin(async move { Ok(texts.iter().map(|text| sparse_of(text)).collect()) })
	}
}

/// A complete config pointing at unreachable endpoints; everything real is
/// replaced by doubles in tests.
pub fn config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:1".to_string(),
				api_key: None,
				collection: "ludex_test".to_string(),
				vector_dim: TEST_VECTOR_DIM,
				timeout_ms: 1_000,
				retry_backoff_ms: 1,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				dimensions: TEST_VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			sparse_embedding: Some(SparseEmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			}),
		},
		search: Search {
			candidate_k: 50,
			sample_pool: 100,
			default_limit: 10,
			discovery_limit: 9,
			suggest_limit: 5,
		},
	}
}

/// A small catalog with a genre-skewed neighborhood around "Portal".
pub fn catalog() -> Vec<TestItem> {
	vec![
		TestItem::new("400", "Portal", "Puzzle", vec![1.0, 0.0, 0.0, 0.0]),
		TestItem::new("620", "Portal 2", "Puzzle", vec![0.95, 0.05, 0.0, 0.0]),
		TestItem::new("220", "Half-Life 2", "Action", vec![0.8, 0.2, 0.0, 0.0]),
		TestItem::new("240", "Counter-Strike", "Action", vec![0.7, 0.3, 0.0, 0.0]),
		TestItem::new("440", "Team Fortress 2", "Action", vec![0.6, 0.4, 0.0, 0.0]),
		TestItem::new("570", "Dota 2", "Strategy", vec![0.5, 0.2, 0.3, 0.0]),
		TestItem::new("105600", "Terraria", "Adventure", vec![0.2, 0.1, 0.1, 0.6]),
		TestItem::new("413150", "Stardew Valley", "Simulation", vec![0.1, 0.0, 0.2, 0.7]),
	]
}

fn hash_token(token: &str) -> u64 {
	let mut hasher = DefaultHasher::new();

	token.hash(&mut hasher);

	hasher.finish()
}

fn hash_vector(text: &str, dim: usize) -> Vec<f32> {
	let mut vector = vec![0.0_f32; dim];

	for token in text.to_lowercase().split_whitespace() {
		vector[(hash_token(token) % dim as u64) as usize] += 1.0;
	}

	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > f32::EPSILON {
		for value in &mut vector {
			*value /= norm;
		}
	}

	vector
}

fn sparse_of(text: &str) -> SparseVector {
	let mut indices: Vec<u32> = text
		.to_lowercase()
		.split_whitespace()
		.map(|token| (hash_token(token) % 1_024) as u32)
		.collect();

	indices.sort_unstable();
	indices.dedup();

	let values = vec![1.0; indices.len()];

	SparseVector { indices, values }
}

fn cosine(lhs: &[f32], rhs: &[f32]) -> f32 {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return 0.0;
	}

	let dot: f32 = lhs.iter().zip(rhs.iter()).map(|(l, r)| l * r).sum();
	let lhs_norm: f32 = lhs.iter().map(|value| value * value).sum::<f32>().sqrt();
	let rhs_norm: f32 = rhs.iter().map(|value| value * value).sum::<f32>().sqrt();

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return 0.0;
	}

	(dot / (lhs_norm * rhs_norm)).clamp(-1.0, 1.0)
}

fn sparse_dot(lhs: &SparseVector, rhs: &SparseVector) -> f32 {
	let mut dot = 0.0;

	for (index, value) in lhs.indices.iter().zip(lhs.values.iter()) {
		if let Some(position) = rhs.indices.iter().position(|other| other == index) {
			dot += value * rhs.values[position];
		}
	}

	dot
}

fn average(vectors: &[Vec<f32>], dim: usize) -> Vec<f32> {
	let mut out = vec![0.0_f32; dim];

	if vectors.is_empty() {
		return out;
	}

	for vector in vectors {
		for (slot, value) in out.iter_mut().zip(vector.iter()) {
			*slot += value;
		}
	}

	for slot in &mut out {
		*slot /= vectors.len() as f32;
	}

	out
}

fn subtract(lhs: &[f32], rhs: &[f32]) -> Vec<f32> {
	lhs.iter().zip(rhs.iter()).map(|(l, r)| l - r).collect()
}
