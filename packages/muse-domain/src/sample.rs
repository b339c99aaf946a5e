use std::collections::HashMap;

use crate::model::CollectionObject;

/// How a candidate pool is partitioned before quota allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
	/// Across institutions; used when no institution filter was given.
	ByUnit,
	/// Across object types; used inside a single institution.
	ByObjectType,
}

const UNKNOWN_BUCKET: &str = "unknown";

/// Stratified fill: representative, size-bounded sampling of a candidate pool.
///
/// Candidates are partitioned into groups, each group gets a quota of
/// `max(1, max_samples / group_count)`, and any shortfall is backfilled from
/// still-unselected candidates in original order. Quota-first-then-backfill
/// guarantees every group is represented before any one group gains depth,
/// and the result is deterministic for a given pool.
pub fn stratified_fill(
	candidates: &[CollectionObject],
	max_samples: usize,
	grouping: Grouping,
) -> Vec<CollectionObject> {
	if candidates.is_empty() || max_samples == 0 {
		return Vec::new();
	}

	// Group membership by candidate index, preserving first-appearance group
	// order and original order within each group.
	let mut group_order: Vec<String> = Vec::new();
	let mut groups: HashMap<String, Vec<usize>> = HashMap::new();

	for (idx, candidate) in candidates.iter().enumerate() {
		let key = group_key(candidate, grouping);
		let members = groups.entry(key.clone()).or_insert_with(|| {
			group_order.push(key);

			Vec::new()
		});

		members.push(idx);
	}

	let quota = (max_samples / group_order.len()).max(1);
	let mut taken = vec![false; candidates.len()];
	let mut selected: Vec<usize> = Vec::new();

	for key in &group_order {
		if selected.len() >= max_samples {
			break;
		}

		for idx in groups[key].iter().take(quota) {
			selected.push(*idx);
			taken[*idx] = true;
		}
	}

	// Some groups may be smaller than their quota; backfill from whatever is
	// left, in original order.
	if selected.len() < max_samples {
		for idx in 0..candidates.len() {
			if selected.len() >= max_samples {
				break;
			}
			if !taken[idx] {
				selected.push(idx);
				taken[idx] = true;
			}
		}
	}

	selected.truncate(max_samples);

	selected.into_iter().map(|idx| candidates[idx].clone()).collect()
}

fn group_key(candidate: &CollectionObject, grouping: Grouping) -> String {
	let key = match grouping {
		Grouping::ByUnit => candidate.unit_code.as_deref(),
		Grouping::ByObjectType => candidate.object_type.as_deref(),
	};

	key.filter(|value| !value.is_empty()).unwrap_or(UNKNOWN_BUCKET).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn object(id: &str, unit: Option<&str>, object_type: Option<&str>) -> CollectionObject {
		CollectionObject {
			id: id.to_string(),
			title: format!("Object {id}"),
			unit_code: unit.map(str::to_string),
			unit_name: None,
			object_type: object_type.map(str::to_string),
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

	fn ids(selected: &[CollectionObject]) -> Vec<&str> {
		selected.iter().map(|obj| obj.id.as_str()).collect()
	}

	#[test]
	fn every_group_is_represented_when_budget_allows() {
		let pool = vec![
			object("a1", Some("NMAH"), None),
			object("a2", Some("NMAH"), None),
			object("a3", Some("NMAH"), None),
			object("b1", Some("FSG"), None),
			object("c1", Some("NMNH"), None),
		];
		let selected = stratified_fill(&pool, 3, Grouping::ByUnit);

		assert_eq!(ids(&selected), vec!["a1", "b1", "c1"]);
	}

	#[test]
	fn backfill_tops_up_from_larger_groups_in_original_order() {
		let pool = vec![
			object("a1", Some("NMAH"), None),
			object("a2", Some("NMAH"), None),
			object("a3", Some("NMAH"), None),
			object("b1", Some("FSG"), None),
		];
		let selected = stratified_fill(&pool, 3, Grouping::ByUnit);

		// Quota is 1 per group; a2 backfills the remaining slot.
		assert_eq!(ids(&selected), vec!["a1", "b1", "a2"]);
	}

	#[test]
	fn output_never_exceeds_max_samples() {
		let pool: Vec<_> = (0..40).map(|i| object(&format!("x{i}"), Some("NMAH"), None)).collect();

		assert_eq!(stratified_fill(&pool, 7, Grouping::ByUnit).len(), 7);
		assert_eq!(stratified_fill(&pool, 100, Grouping::ByUnit).len(), 40);
	}

	#[test]
	fn missing_classification_lands_in_the_unknown_bucket() {
		let pool = vec![
			object("a1", None, Some("painting")),
			object("b1", None, None),
			object("c1", None, Some("sculpture")),
		];
		let selected = stratified_fill(&pool, 3, Grouping::ByObjectType);

		// Nothing is dropped for lacking a type.
		assert_eq!(ids(&selected), vec!["a1", "b1", "c1"]);
	}

	#[test]
	fn grouping_by_object_type_spreads_across_types() {
		let pool = vec![
			object("p1", Some("FSG"), Some("painting")),
			object("p2", Some("FSG"), Some("painting")),
			object("s1", Some("FSG"), Some("sculpture")),
			object("j1", Some("FSG"), Some("jar")),
		];
		let selected = stratified_fill(&pool, 3, Grouping::ByObjectType);

		assert_eq!(ids(&selected), vec!["p1", "s1", "j1"]);
	}

	#[test]
	fn empty_pool_yields_empty_sample() {
		assert!(stratified_fill(&[], 10, Grouping::ByUnit).is_empty());
	}

	#[test]
	fn determinism_for_identical_pools() {
		let pool = vec![
			object("a1", Some("NMAH"), None),
			object("b1", Some("FSG"), None),
			object("a2", Some("NMAH"), None),
		];

		assert_eq!(
			stratified_fill(&pool, 2, Grouping::ByUnit),
			stratified_fill(&pool, 2, Grouping::ByUnit)
		);
	}
}
