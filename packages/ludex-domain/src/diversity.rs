//! Greedy maximal-marginal-relevance re-ranking over a ranked candidate pool.

#[derive(Debug, Clone)]
pub struct DiversityCandidate {
	pub id: String,
	pub score: f32,
	/// Lowercased genre labels used as the redundancy signal.
	pub genres: Vec<String>,
}

#[derive(Clone, Copy)]
struct DiversityPick {
	remaining_pos: usize,
	mmr_score: f32,
	retrieval_rank: usize,
}
impl DiversityPick {
	fn better_than(self, other: &Self) -> bool {
		self.mmr_score > other.mmr_score
			|| (self.mmr_score == other.mmr_score && self.retrieval_rank < other.retrieval_rank)
	}
}

/// Re-ranks `candidates` (already in retrieval order) and keeps at most
/// `top_k`. Each step maximizes `(1 - factor) * relevance - factor * redundancy`
/// where relevance is the rank-normalized retrieval position and redundancy is
/// the highest genre overlap with an already-selected candidate. Ties break by
/// retrieval rank, so `factor = 0.0` reproduces the retrieval order exactly.
pub fn select_diverse(
	candidates: Vec<DiversityCandidate>,
	top_k: usize,
	factor: f32,
) -> Vec<DiversityCandidate> {
	if candidates.is_empty() || top_k == 0 {
		return Vec::new();
	}

	let factor = factor.clamp(0.0, 1.0);

	if factor == 0.0 {
		return candidates.into_iter().take(top_k).collect();
	}

	let total = candidates.len().max(1);
	let relevance_by_idx: Vec<f32> =
		(0..candidates.len()).map(|idx| 1.0 - idx as f32 / total as f32).collect();
	let mut remaining_indices: Vec<usize> = (0..candidates.len()).collect();
	let mut selected_indices: Vec<usize> = vec![remaining_indices.remove(0)];

	while selected_indices.len() < top_k && !remaining_indices.is_empty() {
		let mut best: Option<DiversityPick> = None;

		for (remaining_pos, candidate_idx) in remaining_indices.iter().copied().enumerate() {
			let redundancy = nearest_selected_overlap(
				&candidates[candidate_idx],
				&candidates,
				&selected_indices,
			);
			let mmr_score =
				(1.0 - factor) * relevance_by_idx[candidate_idx] - factor * redundancy;
			let pick =
				DiversityPick { remaining_pos, mmr_score, retrieval_rank: candidate_idx };

			if best.as_ref().map(|current| pick.better_than(current)).unwrap_or(true) {
				best = Some(pick);
			}
		}

		let Some(pick) = best else {
			break;
		};

		selected_indices.push(remaining_indices.remove(pick.remaining_pos));
	}

	let mut by_idx: Vec<Option<DiversityCandidate>> =
		candidates.into_iter().map(Some).collect();

	selected_indices
		.into_iter()
		.filter_map(|idx| by_idx[idx].take())
		.collect()
}

/// Genre overlap (Jaccard) between two candidates, in `[0, 1]`.
pub fn genre_overlap(lhs: &[String], rhs: &[String]) -> f32 {
	if lhs.is_empty() || rhs.is_empty() {
		return 0.0;
	}

	let shared = lhs.iter().filter(|genre| rhs.contains(genre)).count();
	let distinct = lhs.len() + rhs.len() - shared;

	if distinct == 0 {
		return 0.0;
	}

	shared as f32 / distinct as f32
}

fn nearest_selected_overlap(
	candidate: &DiversityCandidate,
	candidates: &[DiversityCandidate],
	selected_indices: &[usize],
) -> f32 {
	selected_indices
		.iter()
		.map(|idx| genre_overlap(&candidate.genres, &candidates[*idx].genres))
		.fold(0.0_f32, f32::max)
}
