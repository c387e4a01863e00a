//! Reciprocal-rank fusion over id lists from independent retrieval signals.

pub const RRF_K: f32 = 60.0;

/// Fuses ranked id lists into one ranking. Each list contributes
/// `1 / (RRF_K + rank)` per id with 1-based ranks; ids are ordered by fused
/// score descending, ties broken by id ascending.
pub fn reciprocal_rank_fuse(lists: &[Vec<String>]) -> Vec<(String, f32)> {
	let mut scores: Vec<(String, f32)> = Vec::new();

	for list in lists {
		for (position, id) in list.iter().enumerate() {
			let contribution = 1.0 / (RRF_K + position as f32 + 1.0);

			match scores.iter_mut().find(|(existing, _)| existing == id) {
				Some((_, score)) => *score += contribution,
				None => scores.push((id.clone(), contribution)),
			}
		}
	}

	scores.sort_by(|(a_id, a_score), (b_id, b_score)| {
		b_score.partial_cmp(a_score).unwrap_or(std::cmp::Ordering::Equal).then(a_id.cmp(b_id))
	});

	scores
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ids(raw: &[&str]) -> Vec<String> {
		raw.iter().map(|id| id.to_string()).collect()
	}

	#[test]
	fn id_present_in_both_lists_wins() {
		let fused = reciprocal_rank_fuse(&[ids(&["a", "b", "c"]), ids(&["b", "d"])]);

		assert_eq!(fused[0].0, "b");
	}

	#[test]
	fn ties_break_by_id_ascending() {
		let fused = reciprocal_rank_fuse(&[ids(&["b"]), ids(&["a"])]);

		assert_eq!(fused[0].0, "a");
		assert_eq!(fused[1].0, "b");
		assert_eq!(fused[0].1, fused[1].1);
	}

	#[test]
	fn fusion_is_deterministic() {
		let lists = [ids(&["a", "b", "c", "d"]), ids(&["c", "a", "e"])];

		assert_eq!(reciprocal_rank_fuse(&lists), reciprocal_rank_fuse(&lists));
	}
}
