pub const DENSE_VECTOR_NAME: &str = "dense";
pub const SPARSE_VECTOR_NAME: &str = "sparse";

const SCROLL_BATCH: u32 = 512;

use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		CountPointsBuilder, CreateCollectionBuilder, Distance, Fusion, GetPointsBuilder, Modifier,
		PayloadIncludeSelector, PointId, PointStruct, PrefetchQueryBuilder, Query,
		QueryPointsBuilder, RetrievedPoint, ScoredPoint, ScrollPointsBuilder,
		SparseVectorParamsBuilder, SparseVectorsConfigBuilder, UpsertPointsBuilder, Value, Vector,
		VectorInput, VectorParamsBuilder, VectorsConfigBuilder, point_id::PointIdOptions,
		value::Kind,
	},
};
use serde_json::{Map, Value as JsonValue};

use crate::{
	Result,
	models::{CatalogPoint, ScoredHit},
};
use ludex_domain::SparseVector;

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &ludex_config::Qdrant) -> Result<Self> {
		let mut builder =
			Qdrant::from_url(&cfg.url).timeout(Duration::from_millis(cfg.timeout_ms));

		if let Some(api_key) = cfg.api_key.as_deref() {
			builder = builder.api_key(api_key);
		}

		let client = builder.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the collection with named dense and sparse vector params when
	/// it does not exist yet.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.create_collection().await
	}

	pub async fn recreate_collection(&self) -> Result<()> {
		let _ = self.client.delete_collection(self.collection.clone()).await;

		self.create_collection().await
	}

	async fn create_collection(&self) -> Result<()> {
		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
		);

		let mut sparse_vectors_config = SparseVectorsConfigBuilder::default();

		sparse_vectors_config.add_named_vector_params(
			SPARSE_VECTOR_NAME,
			SparseVectorParamsBuilder::default().modifier(Modifier::Idf as i32),
		);

		let builder = CreateCollectionBuilder::new(self.collection.clone())
			.vectors_config(vectors_config)
			.sparse_vectors_config(sparse_vectors_config);

		self.client.create_collection(builder).await?;

		Ok(())
	}

	/// Retrieves points by id with their payloads. Missing ids are absent from
	/// the result rather than an error.
	pub async fn fetch(&self, ids: &[String]) -> Result<Vec<ScoredHit>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let point_ids: Vec<PointId> = ids.iter().map(|id| point_id(id)).collect();
		let request =
			GetPointsBuilder::new(self.collection.clone(), point_ids).with_payload(true);
		let response = self.client.get_points(request).await?;

		Ok(response.result.into_iter().map(retrieved_to_hit).collect())
	}

	pub async fn search_dense(&self, vector: &[f32], limit: u64) -> Result<Vec<ScoredHit>> {
		let request = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(limit);
		let response = self.client.query(request).await?;

		Ok(response.result.into_iter().map(scored_to_hit).collect())
	}

	/// Dense + sparse prefetches fused server-side with reciprocal-rank fusion.
	pub async fn search_hybrid(
		&self,
		dense: &[f32],
		sparse: &SparseVector,
		limit: u64,
	) -> Result<Vec<ScoredHit>> {
		let dense_prefetch = PrefetchQueryBuilder::default()
			.query(Query::new_nearest(dense.to_vec()))
			.using(DENSE_VECTOR_NAME)
			.limit(limit);
		let sparse_prefetch = PrefetchQueryBuilder::default()
			.query(Query::new_nearest(VectorInput::new_sparse(
				sparse.indices.clone(),
				sparse.values.clone(),
			)))
			.using(SPARSE_VECTOR_NAME)
			.limit(limit);
		let request = QueryPointsBuilder::new(self.collection.clone())
			.add_prefetch(dense_prefetch)
			.add_prefetch(sparse_prefetch)
			.query(Fusion::Rrf)
			.with_payload(true)
			.limit(limit);
		let response = self.client.query(request).await?;

		Ok(response.result.into_iter().map(scored_to_hit).collect())
	}

	/// Nearest neighbors of the average of the positive examples, pushed away
	/// from the negative ones. Example points never appear in the result.
	pub async fn recommend(
		&self,
		positive: &[String],
		negative: &[String],
		limit: u64,
	) -> Result<Vec<ScoredHit>> {
		if positive.is_empty() && negative.is_empty() {
			return Err(crate::Error::InvalidArgument(
				"Recommend requires at least one example id.".to_string(),
			));
		}

		let input = qdrant_client::qdrant::RecommendInput {
			positive: positive.iter().map(|id| VectorInput::new_id(point_id(id))).collect(),
			negative: negative.iter().map(|id| VectorInput::new_id(point_id(id))).collect(),
			strategy: Some(qdrant_client::qdrant::RecommendStrategy::AverageVector as i32),
		};
		let request = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_recommend(input))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(limit);
		let response = self.client.query(request).await?;

		Ok(response.result.into_iter().map(scored_to_hit).collect())
	}

	/// A stable slice of the collection for randomized sampling downstream.
	pub async fn sample(&self, limit: u64) -> Result<Vec<ScoredHit>> {
		let request = ScrollPointsBuilder::new(self.collection.clone())
			.limit(limit.min(u32::MAX as u64) as u32)
			.with_payload(true);
		let response = self.client.scroll(request).await?;

		Ok(response.result.into_iter().map(retrieved_to_hit).collect())
	}

	/// Scrolls the whole collection collecting `(id, name)` pairs.
	pub async fn list_names(&self) -> Result<Vec<(String, String)>> {
		let mut names = Vec::new();
		let mut cursor: Option<PointId> = None;

		loop {
			let mut request = ScrollPointsBuilder::new(self.collection.clone())
				.limit(SCROLL_BATCH)
				.with_payload(include_fields(&["name"]));

			if let Some(offset) = cursor.take() {
				request = request.offset(offset);
			}

			let response = self.client.scroll(request).await?;

			for point in &response.result {
				let Some(id) = point.id.as_ref().map(id_string) else {
					continue;
				};
				let Some(name) = payload_str(&point.payload, "name") else {
					continue;
				};

				names.push((id, name));
			}

			match response.next_page_offset {
				Some(offset) => cursor = Some(offset),
				None => break,
			}
		}

		Ok(names)
	}

	pub async fn count(&self) -> Result<u64> {
		let response =
			self.client.count(CountPointsBuilder::new(self.collection.clone()).exact(true)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	pub async fn upsert_batch(&self, batch: Vec<CatalogPoint>) -> Result<()> {
		if batch.is_empty() {
			return Ok(());
		}

		let mut points = Vec::with_capacity(batch.len());

		for item in batch {
			let mut payload_map = HashMap::new();

			for (key, value) in item.payload {
				payload_map.insert(key, Value::from(value));
			}

			let mut vector_map = HashMap::new();

			vector_map.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(item.dense));

			if let Some(sparse) = item.sparse {
				vector_map.insert(
					SPARSE_VECTOR_NAME.to_string(),
					Vector::new_sparse(sparse.indices, sparse.values),
				);
			}

			points.push(PointStruct::new(
				point_id(&item.id),
				vector_map,
				Payload::from(payload_map),
			));
		}

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), points).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}
}

/// Numeric catalog ids become numeric point ids; anything else is treated as
/// a UUID-style string id.
fn point_id(id: &str) -> PointId {
	match id.parse::<u64>() {
		Ok(num) => PointId::from(num),
		Err(_) => PointId::from(id.to_string()),
	}
}

/// Payload selector restricting scroll responses to the named fields.
fn include_fields(fields: &[&str]) -> PayloadIncludeSelector {
	PayloadIncludeSelector { fields: fields.iter().map(|field| field.to_string()).collect() }
}

fn id_string(point_id: &PointId) -> String {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(num)) => num.to_string(),
		Some(PointIdOptions::Uuid(id)) => id.clone(),
		None => String::new(),
	}
}

fn scored_to_hit(point: ScoredPoint) -> ScoredHit {
	ScoredHit {
		id: point.id.as_ref().map(id_string).unwrap_or_default(),
		score: point.score,
		payload: payload_to_json(point.payload),
	}
}

fn retrieved_to_hit(point: RetrievedPoint) -> ScoredHit {
	ScoredHit {
		id: point.id.as_ref().map(id_string).unwrap_or_default(),
		score: 1.0,
		payload: payload_to_json(point.payload),
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_to_json(payload: HashMap<String, Value>) -> Map<String, JsonValue> {
	payload.into_iter().map(|(key, value)| (key, value_to_json(value))).collect()
}

fn value_to_json(value: Value) -> JsonValue {
	match value.kind {
		Some(Kind::NullValue(_)) | None => JsonValue::Null,
		Some(Kind::BoolValue(flag)) => JsonValue::Bool(flag),
		Some(Kind::IntegerValue(num)) => JsonValue::from(num),
		Some(Kind::DoubleValue(num)) => JsonValue::from(num),
		Some(Kind::StringValue(text)) => JsonValue::String(text),
		Some(Kind::ListValue(list)) =>
			JsonValue::Array(list.values.into_iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => JsonValue::Object(
			object.fields.into_iter().map(|(key, value)| (key, value_to_json(value))).collect(),
		),
	}
}
