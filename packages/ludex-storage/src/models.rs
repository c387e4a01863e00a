use serde_json::{Map, Value};

use ludex_domain::SparseVector;

/// A point returned from the store with its payload snapshot. Retrieval by id
/// carries a score of `1.0`.
#[derive(Debug, Clone)]
pub struct ScoredHit {
	pub id: String,
	pub score: f32,
	pub payload: Map<String, Value>,
}

/// A catalog item ready for upsert.
#[derive(Debug, Clone)]
pub struct CatalogPoint {
	pub id: String,
	pub dense: Vec<f32>,
	pub sparse: Option<SparseVector>,
	pub payload: Map<String, Value>,
}
