//! Free-text search over the catalog: dense-only, or dense + sparse fused
//! server-side when a sparse embedding provider is configured.

use ludex_domain::{ResultItem, SparseVector, pager, pager::Page, query::TextQuery};

use crate::{Engine, Error, Result, normalize, retry_once};

impl Engine {
	pub async fn search(&self, query: TextQuery) -> Result<Page<ResultItem>> {
		let fetch_k = self.candidate_pool(query.limit, query.offset);
		let texts = vec![query.text.clone()];
		let dense = self.embed_query(&texts).await?;
		let hits = if query.hybrid {
			match self.cfg.providers.sparse_embedding.as_ref() {
				Some(_) => {
					let sparse = self.embed_query_sparse(&texts).await?;

					retry_once(self.backoff(), || {
						self.store.search_hybrid(&dense, &sparse, fetch_k)
					})
					.await?
				},
				None => {
					tracing::debug!(
						"Sparse embedding provider not configured; using dense-only search."
					);

					retry_once(self.backoff(), || self.store.search_dense(&dense, fetch_k))
						.await?
				},
			}
		} else {
			retry_once(self.backoff(), || self.store.search_dense(&dense, fetch_k)).await?
		};
		let items = hits.into_iter().map(normalize::hit_to_item).collect();

		Ok(pager::paginate(items, query.limit, query.offset))
	}

	async fn embed_query(&self, texts: &[String]) -> Result<Vec<f32>> {
		let vectors = retry_once(self.backoff(), || {
			self.embedding.embed(&self.cfg.providers.embedding, texts)
		})
		.await?;
		let vector = vectors.into_iter().next().ok_or_else(|| Error::EmbeddingUnavailable {
			message: "Embedding response was empty.".to_string(),
		})?;
		let expected = self.cfg.storage.qdrant.vector_dim as usize;

		if vector.len() != expected {
			return Err(Error::EmbeddingUnavailable {
				message: format!(
					"Embedding dimension {} does not match configured dimension {expected}.",
					vector.len()
				),
			});
		}

		Ok(vector)
	}

	async fn embed_query_sparse(&self, texts: &[String]) -> Result<SparseVector> {
		let Some(cfg) = self.cfg.providers.sparse_embedding.as_ref() else {
			return Err(Error::EmbeddingUnavailable {
				message: "Sparse embedding provider is not configured.".to_string(),
			});
		};
		let vectors =
			retry_once(self.backoff(), || self.embedding.embed_sparse(cfg, texts)).await?;

		vectors.into_iter().next().ok_or_else(|| Error::EmbeddingUnavailable {
			message: "Sparse embedding response was empty.".to_string(),
		})
	}
}
