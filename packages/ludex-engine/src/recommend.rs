//! Seed-based similarity: more items like this one, via the store's
//! example-based recommend. The seed and caller exclusions never appear in
//! the result.

use ludex_domain::{ResultItem, pager, pager::Page, query::SeedQuery};

use crate::{Engine, Result, normalize, retry_once};

impl Engine {
	pub async fn similar(&self, query: SeedQuery) -> Result<Page<ResultItem>> {
		self.ensure_known(std::slice::from_ref(&query.seed_id)).await?;

		let mut excluded = vec![query.seed_id.clone()];

		excluded.extend(query.excluded_ids.iter().cloned());

		// Over-fetch to cover post-hoc removals.
		let fetch_k = self.candidate_pool(query.limit, query.offset) + excluded.len() as u64;
		let positive = vec![query.seed_id.clone()];
		let hits =
			retry_once(self.backoff(), || self.store.recommend(&positive, &[], fetch_k)).await?;
		let items = hits
			.into_iter()
			.filter(|hit| !excluded.contains(&hit.id))
			.map(normalize::hit_to_item)
			.collect();

		Ok(pager::paginate(items, query.limit, query.offset))
	}

	/// Point lookup by id; retrieval carries a score of `1.0`.
	pub async fn game(&self, id: &str) -> Result<ResultItem> {
		let id = id.trim();

		if id.is_empty() {
			return Err(crate::Error::InvalidParameter {
				message: "id must be non-empty.".to_string(),
			});
		}

		let ids = vec![id.to_string()];
		let hits = retry_once(self.backoff(), || self.store.fetch(&ids)).await?;

		hits.into_iter()
			.next()
			.map(normalize::hit_to_item)
			.ok_or_else(|| crate::Error::UnknownItem { id: id.to_string() })
	}
}
