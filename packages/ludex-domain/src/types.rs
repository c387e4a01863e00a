use serde::{Deserialize, Serialize};

/// Catalog item payload. Absent fields are backfilled with defaults so the
/// serialized shape stays stable regardless of what the store returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMetadata {
	pub name: String,
	pub steam_appid: u64,
	pub price: f64,
	pub genres: String,
	pub tags: String,
	pub release_date: String,
	pub developers: String,
	pub platforms: String,
	pub short_description: String,
	pub detailed_description: String,
}
impl GameMetadata {
	/// Genre labels split out of the comma-separated payload field.
	pub fn genre_labels(&self) -> Vec<String> {
		self.genres
			.split(',')
			.map(|genre| genre.trim().to_lowercase())
			.filter(|genre| !genre.is_empty())
			.collect()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
	pub id: String,
	pub score: f32,
	pub payload: GameMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
	pub indices: Vec<u32>,
	pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
	pub id: String,
	pub name: String,
	pub score: f32,
}
