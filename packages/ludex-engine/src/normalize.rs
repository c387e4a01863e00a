//! Maps store payload snapshots into the stable [`GameMetadata`] shape,
//! backfilling defaults for absent or mistyped fields. Scores are copied
//! verbatim.

use serde_json::{Map, Value};

use ludex_domain::{GameMetadata, ResultItem};
use ludex_storage::models::ScoredHit;

pub(crate) fn hit_to_item(hit: ScoredHit) -> ResultItem {
	ResultItem { id: hit.id, score: hit.score, payload: metadata_from_payload(&hit.payload) }
}

pub(crate) fn metadata_from_payload(payload: &Map<String, Value>) -> GameMetadata {
	GameMetadata {
		name: payload_str(payload, "name"),
		steam_appid: payload_u64(payload, "steam_appid"),
		price: payload_f64(payload, "price"),
		genres: payload_str(payload, "genres"),
		tags: payload_str(payload, "tags"),
		release_date: payload_str(payload, "release_date"),
		developers: payload_str(payload, "developers"),
		platforms: payload_str(payload, "platforms"),
		short_description: payload_str(payload, "short_description"),
		detailed_description: payload_str(payload, "detailed_description"),
	}
}

fn payload_str(payload: &Map<String, Value>, key: &str) -> String {
	payload.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn payload_u64(payload: &Map<String, Value>, key: &str) -> u64 {
	let Some(value) = payload.get(key) else {
		return 0;
	};

	value
		.as_u64()
		.or_else(|| value.as_f64().filter(|num| num.fract() == 0.0).map(|num| num as u64))
		.unwrap_or(0)
}

fn payload_f64(payload: &Map<String, Value>, key: &str) -> f64 {
	payload.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}
