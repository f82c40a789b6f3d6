use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
	pub tag: String,
	pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
	pub total_notes: u64,
	pub favorite_notes: u64,
	pub unique_tags: u64,
	pub popular_tags: Vec<TagCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkStats {
	pub total_bookmarks: u64,
	pub favorite_bookmarks: u64,
	pub unique_tags: u64,
	pub popular_tags: Vec<TagCount>,
}

/// Counts how many records carry each tag, most used first, ties by tag in byte order.
pub fn tally<'a, I>(tag_lists: I) -> Vec<TagCount>
where
	I: IntoIterator<Item = &'a Vec<String>>,
{
	let mut counts = HashMap::<&str, u64>::new();

	for tags in tag_lists {
		for tag in tags {
			*counts.entry(tag.as_str()).or_default() += 1;
		}
	}

	let mut tally = counts
		.into_iter()
		.map(|(tag, count)| TagCount { tag: tag.to_string(), count })
		.collect::<Vec<_>>();

	tally.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

	tally
}

/// Sorted, de-duplicated union of every tag.
pub fn distinct_tags<'a, I>(tag_lists: I) -> Vec<String>
where
	I: IntoIterator<Item = &'a Vec<String>>,
{
	let mut tags = tag_lists.into_iter().flatten().cloned().collect::<Vec<_>>();

	tags.sort();
	tags.dedup();

	tags
}
