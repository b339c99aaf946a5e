use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical record for one catalog item, produced by [`crate::normalize`].
///
/// `id` is assigned once at normalization time and never mutated; it is the
/// dedup and lookup key everywhere downstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionObject {
	pub id: String,
	pub title: String,
	pub unit_code: Option<String>,
	pub unit_name: Option<String>,
	/// Lower-cased and trimmed when derived from upstream free text.
	pub object_type: Option<String>,
	pub description: Option<String>,
	pub date: Option<String>,
	pub makers: Vec<String>,
	pub materials: Vec<String>,
	pub topics: Vec<String>,
	pub credit_line: Option<String>,
	pub record_link: Option<String>,
	pub images: Vec<ImageRef>,
	pub is_cc0: bool,
	/// Raw upstream on-exhibit flag. See [`crate::visibility`] for the
	/// corroborated verdict.
	pub is_on_view: bool,
	pub exhibition_title: Option<String>,
	pub exhibition_location: Option<String>,
	/// Opaque pass-through of the upstream record. Never consulted for
	/// decisions.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub raw_metadata: Option<Value>,
}

/// One media attachment. URLs are validated at normalization time; a field
/// holding anything other than an absolute http(s) URL is dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
	pub url: Option<String>,
	pub thumbnail_url: Option<String>,
	pub width: Option<u32>,
	pub height: Option<u32>,
	pub format: Option<String>,
	pub is_cc0: bool,
}

/// Abstract search intent, translated to upstream parameters by
/// [`crate::query::build_query`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
	pub query: Option<String>,
	pub unit_code: Option<String>,
	pub object_type: Option<String>,
	pub maker: Option<String>,
	pub material: Option<String>,
	pub topic: Option<String>,
	pub has_images: Option<bool>,
	pub is_cc0: Option<bool>,
	pub on_view: Option<bool>,
	pub limit: u32,
	pub offset: u32,
}

/// One page of search results with pagination bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
	pub objects: Vec<CollectionObject>,
	pub total_count: u64,
	pub returned_count: u32,
	pub offset: u32,
	pub has_more: bool,
	pub next_offset: Option<u32>,
}
impl SearchPage {
	/// Builds a page from normalized objects, deriving the pagination fields
	/// so the invariants hold by construction.
	pub fn from_objects(objects: Vec<CollectionObject>, total_count: u64, offset: u32) -> Self {
		let returned_count = objects.len() as u32;
		let has_more = u64::from(offset) + u64::from(returned_count) < total_count;
		let next_offset = has_more.then(|| offset + returned_count);

		Self { objects, total_count, returned_count, offset, has_more, next_offset }
	}

	pub fn empty() -> Self {
		Self {
			objects: Vec::new(),
			total_count: 0,
			returned_count: 0,
			offset: 0,
			has_more: false,
			next_offset: None,
		}
	}
}

/// Request for a diversity-sampled exploration of a topic.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SampleRequest {
	pub topic: String,
	/// Free-text institution name or code; resolved via [`crate::units`].
	pub collection: Option<String>,
	pub max_samples: u32,
	/// Continue mode: objects already shown to the caller.
	#[serde(default)]
	pub excluded_ids: HashSet<String>,
}

/// A member institution of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Unit {
	pub code: &'static str,
	pub name: &'static str,
	pub description: &'static str,
	pub location: &'static str,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn object(id: &str) -> CollectionObject {
		CollectionObject {
			id: id.to_string(),
			title: format!("Object {id}"),
			unit_code: None,
			unit_name: None,
			object_type: None,
			description: None,
			date: None,
			makers: Vec::new(),
			materials: Vec::new(),
			topics: Vec::new(),
			credit_line: None,
			record_link: None,
			images: Vec::new(),
			is_cc0: false,
			is_on_view: false,
			exhibition_title: None,
			exhibition_location: None,
			raw_metadata: None,
		}
	}

	#[test]
	fn page_invariants_hold_with_more_results_available() {
		let page = SearchPage::from_objects(vec![object("a"), object("b")], 10, 3);

		assert_eq!(page.returned_count, 2);
		assert!(page.has_more);
		assert_eq!(page.next_offset, Some(5));
	}

	#[test]
	fn page_next_offset_absent_on_final_page() {
		let page = SearchPage::from_objects(vec![object("a")], 4, 3);

		assert!(!page.has_more);
		assert_eq!(page.next_offset, None);
	}

	#[test]
	fn empty_page_carries_no_pagination() {
		let page = SearchPage::empty();

		assert_eq!(page.returned_count, 0);
		assert!(!page.has_more);
	}
}
