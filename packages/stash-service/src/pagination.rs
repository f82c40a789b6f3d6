use serde::Serialize;
use stash_storage::filter::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub current_page: u32,
	pub total_pages: u64,
	pub total_count: u64,
	pub has_next: bool,
	pub has_prev: bool,
	pub limit: u32,
}
impl Pagination {
	pub fn new(page: Page, total_count: u64) -> Self {
		Self::combined(page, &[total_count])
	}

	/// Several kinds paged side by side with the same page and limit: counts add up, and the
	/// page total is that of the longest kind.
	pub fn combined(page: Page, counts: &[u64]) -> Self {
		let total_count = counts.iter().sum();
		let total_pages =
			counts.iter().map(|count| page_count(*count, page.limit)).max().unwrap_or_default();

		Self {
			current_page: page.page,
			total_pages,
			total_count,
			has_next: u64::from(page.page) < total_pages,
			has_prev: page.page > 1,
			limit: page.limit,
		}
	}
}

pub fn page_count(total: u64, limit: u32) -> u64 {
	total.div_ceil(u64::from(limit.max(1)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_kind_pages() {
		let pagination = Pagination::new(Page::new(2, 10), 25);

		assert_eq!(pagination.total_pages, 3);
		assert!(pagination.has_next);
		assert!(pagination.has_prev);

		let last = Pagination::new(Page::new(3, 10), 25);

		assert!(!last.has_next);
	}

	#[test]
	fn empty_results_have_no_pages() {
		let pagination = Pagination::new(Page::new(1, 10), 0);

		assert_eq!(pagination.total_pages, 0);
		assert!(!pagination.has_next);
		assert!(!pagination.has_prev);
	}

	#[test]
	fn combined_counts_sum_and_pages_follow_the_longest_kind() {
		let pagination = Pagination::combined(Page::new(1, 5), &[12, 3]);

		assert_eq!(pagination.total_count, 15);
		assert_eq!(pagination.total_pages, 3);
		assert!(pagination.has_next);
	}
}
