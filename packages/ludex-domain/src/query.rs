//! Caller intent as a sum type, dispatched by pattern matching. Validation
//! rejects bad input loudly instead of silently fixing it.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueryError {
	#[error("Query text must be non-empty.")]
	EmptyText,
	#[error("{message}")]
	InvalidParameter { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Query {
	Text(TextQuery),
	Seed(SeedQuery),
	Preference(PreferenceQuery),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextQuery {
	pub text: String,
	pub limit: u32,
	pub offset: u32,
	pub hybrid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedQuery {
	pub seed_id: String,
	pub limit: u32,
	pub offset: u32,
	pub excluded_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceQuery {
	pub positive_ids: Vec<String>,
	pub negative_ids: Vec<String>,
	pub excluded_ids: Vec<String>,
	pub limit: u32,
	pub offset: u32,
	pub diversity_factor: Option<f32>,
	pub random_seed: Option<u64>,
}

impl Query {
	/// Normalizes and checks the query. Id lists are deduplicated preserving
	/// first occurrence; everything else that is off is an error.
	pub fn validate(self) -> Result<Self, QueryError> {
		match self {
			Self::Text(query) => Ok(Self::Text(query.validate()?)),
			Self::Seed(query) => Ok(Self::Seed(query.validate()?)),
			Self::Preference(query) => Ok(Self::Preference(query.validate()?)),
		}
	}

	pub fn limit(&self) -> u32 {
		match self {
			Self::Text(query) => query.limit,
			Self::Seed(query) => query.limit,
			Self::Preference(query) => query.limit,
		}
	}

	pub fn offset(&self) -> u32 {
		match self {
			Self::Text(query) => query.offset,
			Self::Seed(query) => query.offset,
			Self::Preference(query) => query.offset,
		}
	}
}

impl TextQuery {
	fn validate(mut self) -> Result<Self, QueryError> {
		check_limit(self.limit)?;

		self.text = collapse_whitespace(&self.text);

		if self.text.is_empty() {
			return Err(QueryError::EmptyText);
		}

		Ok(self)
	}
}

impl SeedQuery {
	fn validate(mut self) -> Result<Self, QueryError> {
		check_limit(self.limit)?;

		self.seed_id = self.seed_id.trim().to_string();

		if self.seed_id.is_empty() {
			return Err(QueryError::InvalidParameter {
				message: "seed_id must be non-empty.".to_string(),
			});
		}

		self.excluded_ids = dedup_preserving(self.excluded_ids);

		Ok(self)
	}
}

impl PreferenceQuery {
	fn validate(mut self) -> Result<Self, QueryError> {
		check_limit(self.limit)?;

		self.positive_ids = dedup_preserving(self.positive_ids);
		self.negative_ids = dedup_preserving(self.negative_ids);
		self.excluded_ids = dedup_preserving(self.excluded_ids);

		if let Some(id) =
			self.positive_ids.iter().find(|id| self.negative_ids.contains(*id))
		{
			return Err(QueryError::InvalidParameter {
				message: format!("Id {id} appears in both positive_ids and negative_ids."),
			});
		}
		if let Some(factor) = self.diversity_factor {
			if !factor.is_finite() {
				return Err(QueryError::InvalidParameter {
					message: "diversity_factor must be a finite number.".to_string(),
				});
			}
			if !(0.0..=1.0).contains(&factor) {
				return Err(QueryError::InvalidParameter {
					message: "diversity_factor must be in the range 0.0-1.0.".to_string(),
				});
			}
		}

		Ok(self)
	}
}

fn check_limit(limit: u32) -> Result<(), QueryError> {
	if limit == 0 {
		return Err(QueryError::InvalidParameter {
			message: "limit must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn dedup_preserving(ids: Vec<String>) -> Vec<String> {
	let mut seen = Vec::with_capacity(ids.len());

	for id in ids {
		let id = id.trim().to_string();

		if !id.is_empty() && !seen.contains(&id) {
			seen.push(id);
		}
	}

	seen
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn text_query_collapses_whitespace() {
		let query = TextQuery {
			text: "  space \t exploration  ".to_string(),
			limit: 10,
			offset: 0,
			hybrid: true,
		}
		.validate()
		.expect("validate failed");

		assert_eq!(query.text, "space exploration");
	}

	#[test]
	fn blank_text_is_empty_query() {
		let result = TextQuery { text: " \t ".to_string(), limit: 10, offset: 0, hybrid: false }
			.validate();

		assert_eq!(result.unwrap_err(), QueryError::EmptyText);
	}

	#[test]
	fn overlapping_preference_sets_are_rejected() {
		let result = PreferenceQuery {
			positive_ids: vec!["10".to_string(), "20".to_string()],
			negative_ids: vec!["20".to_string()],
			excluded_ids: Vec::new(),
			limit: 9,
			offset: 0,
			diversity_factor: None,
			random_seed: None,
		}
		.validate();

		assert!(matches!(result, Err(QueryError::InvalidParameter { .. })));
	}

	#[test]
	fn id_lists_are_deduplicated_in_order() {
		let query = PreferenceQuery {
			positive_ids: vec!["20".to_string(), "10".to_string(), "20".to_string()],
			negative_ids: Vec::new(),
			excluded_ids: Vec::new(),
			limit: 9,
			offset: 0,
			diversity_factor: None,
			random_seed: None,
		}
		.validate()
		.expect("validate failed");

		assert_eq!(query.positive_ids, vec!["20".to_string(), "10".to_string()]);
	}

	#[test]
	fn diversity_factor_out_of_range_is_rejected() {
		let result = PreferenceQuery {
			positive_ids: vec!["10".to_string()],
			negative_ids: Vec::new(),
			excluded_ids: Vec::new(),
			limit: 9,
			offset: 0,
			diversity_factor: Some(1.5),
			random_seed: None,
		}
		.validate();

		assert!(matches!(result, Err(QueryError::InvalidParameter { .. })));
	}
}
