//! Preference-driven discovery: liked/disliked example sets steer the store's
//! recommend, optionally re-ranked for genre diversity. Empty preferences
//! degrade to a reproducible randomized sample.

use std::collections::HashMap;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use ludex_domain::{
	ResultItem,
	diversity::{self, DiversityCandidate},
	pager,
	pager::Page,
	query::PreferenceQuery,
};

use crate::{Engine, Result, normalize, retry_once};

impl Engine {
	pub async fn discover(&self, query: PreferenceQuery) -> Result<Page<ResultItem>> {
		if query.positive_ids.is_empty() && query.negative_ids.is_empty() {
			return self
				.sample_page(query.limit, query.offset, &query.excluded_ids, query.random_seed)
				.await;
		}

		let examples: Vec<String> = query
			.positive_ids
			.iter()
			.chain(query.negative_ids.iter())
			.cloned()
			.collect();

		self.ensure_known(&examples).await?;

		let mut excluded = examples;

		excluded.extend(query.excluded_ids.iter().cloned());

		let fetch_k = self.candidate_pool(query.limit, query.offset) + excluded.len() as u64;
		let hits = retry_once(self.backoff(), || {
			self.store.recommend(&query.positive_ids, &query.negative_ids, fetch_k)
		})
		.await?;
		let mut items: Vec<ResultItem> = hits
			.into_iter()
			.filter(|hit| !excluded.contains(&hit.id))
			.map(normalize::hit_to_item)
			.collect();

		if let Some(factor) = query.diversity_factor
			&& factor > 0.0
		{
			items = apply_diversity(items, (query.offset + query.limit) as usize, factor);
		}

		Ok(pager::paginate(items, query.limit, query.offset))
	}

	/// A randomized slice of the catalog, reproducible for a given seed.
	pub async fn random(&self, limit: u32, random_seed: Option<u64>) -> Result<Vec<ResultItem>> {
		if limit == 0 {
			return Err(crate::Error::InvalidParameter {
				message: "limit must be greater than zero.".to_string(),
			});
		}

		let page = self.sample_page(limit, 0, &[], random_seed).await?;

		Ok(page.items)
	}

	async fn sample_page(
		&self,
		limit: u32,
		offset: u32,
		excluded_ids: &[String],
		random_seed: Option<u64>,
	) -> Result<Page<ResultItem>> {
		// The scan must cover at least the requested window.
		let pool_size = (self.cfg.search.sample_pool as u64).max(offset as u64 + limit as u64);
		let pool = retry_once(self.backoff(), || self.store.sample(pool_size)).await?;
		let mut items: Vec<ResultItem> = pool
			.into_iter()
			.filter(|hit| !excluded_ids.contains(&hit.id))
			.map(normalize::hit_to_item)
			.collect();
		let mut rng = match random_seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		};

		items.shuffle(&mut rng);

		// Sampled items carry no similarity signal.
		for item in &mut items {
			item.score = 1.0;
		}

		Ok(pager::paginate(items, limit, offset))
	}
}

/// Re-ranks the head of the pool for diversity without dropping anything:
/// unselected candidates keep their retrieval order after the re-ranked head,
/// so pagination metadata matches the non-diversity path.
fn apply_diversity(items: Vec<ResultItem>, top_k: usize, factor: f32) -> Vec<ResultItem> {
	let order: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
	let candidates = items
		.iter()
		.map(|item| DiversityCandidate {
			id: item.id.clone(),
			score: item.score,
			genres: item.payload.genre_labels(),
		})
		.collect();
	let picked = diversity::select_diverse(candidates, top_k, factor);
	let mut by_id: HashMap<String, ResultItem> =
		items.into_iter().map(|item| (item.id.clone(), item)).collect();
	let mut reordered: Vec<ResultItem> =
		picked.into_iter().filter_map(|candidate| by_id.remove(&candidate.id)).collect();

	reordered.extend(order.into_iter().filter_map(|id| by_id.remove(&id)));

	reordered
}
