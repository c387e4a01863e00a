//! Prefix/substring name completion over the catalog, built once at startup
//! and independent of the embedding path.

use crate::Suggestion;

struct Entry {
	id: String,
	name: String,
	lowered: String,
}

pub struct SuggestionIndex {
	entries: Vec<Entry>,
}
impl SuggestionIndex {
	pub fn build(names: Vec<(String, String)>) -> Self {
		let mut entries: Vec<Entry> = names
			.into_iter()
			.filter(|(_, name)| !name.trim().is_empty())
			.map(|(id, name)| {
				let lowered = name.to_lowercase();

				Entry { id, name, lowered }
			})
			.collect();

		entries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

		Self { entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Case-insensitive substring match. The score is the match position
	/// normalized by name length, so prefix matches rank first; ties break by
	/// name then id. An empty partial yields nothing.
	pub fn suggest(&self, partial: &str, limit: usize) -> Vec<Suggestion> {
		let needle = partial.trim().to_lowercase();

		if needle.is_empty() || limit == 0 {
			return Vec::new();
		}

		let mut matches: Vec<Suggestion> = self
			.entries
			.iter()
			.filter_map(|entry| {
				let position = entry.lowered.find(&needle)?;
				let score = 1.0 - position as f32 / entry.lowered.len() as f32;

				Some(Suggestion { id: entry.id.clone(), name: entry.name.clone(), score })
			})
			.collect();

		matches.sort_by(|a, b| {
			b.score
				.partial_cmp(&a.score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| a.name.cmp(&b.name))
				.then_with(|| a.id.cmp(&b.id))
		});
		matches.truncate(limit);

		matches
	}
}
