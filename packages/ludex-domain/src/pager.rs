use serde::{Deserialize, Serialize};

/// One page of ranked results with 1-based page numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub total: u32,
	pub page: u32,
	pub page_size: u32,
	pub pages: u32,
}

/// Slices a ranked candidate pool into one page. An offset at or past the end
/// yields an empty page with intact metadata. Offsets that do not align to a
/// page boundary round down to the page they fall inside.
pub fn paginate<T>(items: Vec<T>, limit: u32, offset: u32) -> Page<T> {
	debug_assert!(limit > 0);

	let total = items.len() as u32;
	let items =
		items.into_iter().skip(offset as usize).take(limit as usize).collect::<Vec<_>>();

	Page {
		items,
		total,
		page: offset / limit + 1,
		page_size: limit,
		pages: total.div_ceil(limit),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slices_in_rank_order() {
		let page = paginate((0..10).collect(), 3, 3);

		assert_eq!(page.items, vec![3, 4, 5]);
		assert_eq!(page.total, 10);
		assert_eq!(page.page, 2);
		assert_eq!(page.page_size, 3);
		assert_eq!(page.pages, 4);
	}

	#[test]
	fn out_of_range_offset_yields_empty_page() {
		let page = paginate((0..10).collect::<Vec<u32>>(), 5, 12);

		assert!(page.items.is_empty());
		assert_eq!(page.total, 10);
		assert_eq!(page.pages, 2);
	}

	#[test]
	fn non_aligned_offset_rounds_down() {
		let page = paginate((0..10).collect::<Vec<u32>>(), 4, 5);

		assert_eq!(page.items, vec![5, 6, 7, 8]);
		assert_eq!(page.page, 2);
	}
}
