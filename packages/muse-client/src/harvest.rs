use std::collections::HashSet;

use muse_domain::{CollectionObject, SearchFilter};

use crate::{Catalog, Error, Result};

/// Outcome of an exhaustive multi-batch retrieval.
///
/// `complete` is false when the run stopped early on repeated transport
/// failure; whatever was accumulated is still returned, with the cause in
/// `failure`. Partial progress is never discarded.
#[derive(Debug)]
pub struct Harvest {
	pub objects: Vec<CollectionObject>,
	pub total_available: Option<u64>,
	pub complete: bool,
	pub failure: Option<String>,
}

/// Collects up to `max_total` unique objects by paging through the upstream.
///
/// Batches are issued in increasing offset order and appended in that order,
/// so output is upstream-order-preserving modulo deduplication. Upstream
/// ordering is not perfectly stable across requests, so an object may appear
/// in two overlapping batches; it is counted once.
pub async fn collect_all(
	catalog: &dyn Catalog,
	filter: &SearchFilter,
	max_total: u32,
	page_rows: u32,
) -> Result<Harvest> {
	let page_rows = page_rows.max(1);
	let mut seen: HashSet<String> = HashSet::new();
	let mut objects: Vec<CollectionObject> = Vec::new();
	let mut offset = filter.offset;
	let mut total_available: Option<u64> = None;
	let mut consecutive_failures = 0_u32;

	while (objects.len() as u32) < max_total {
		// The final batch is shrunk to exactly fill the remaining budget.
		let batch_rows = page_rows.min(max_total - objects.len() as u32);
		let batch_filter = SearchFilter { limit: batch_rows, offset, ..filter.clone() };
		let page = match catalog.search(&batch_filter).await {
			Ok(page) => {
				consecutive_failures = 0;

				page
			},
			Err(Error::Unavailable { message }) => {
				consecutive_failures += 1;

				if consecutive_failures >= 2 {
					tracing::warn!(
						offset,
						collected = objects.len(),
						"Harvest aborted after two consecutive transport failures."
					);

					return Ok(Harvest {
						objects,
						total_available,
						complete: false,
						failure: Some(message),
					});
				}

				// Retry the same offset once before giving up.
				continue;
			},
			Err(other) => return Err(other),
		};

		if total_available.is_none() {
			total_available = Some(page.total_count);
		}

		for object in page.objects {
			if (objects.len() as u32) >= max_total {
				break;
			}
			if seen.insert(object.id.clone()) {
				objects.push(object);
			}
		}

		if !page.has_more || page.returned_count == 0 {
			break;
		}

		offset += batch_rows;
	}

	Ok(Harvest { objects, total_available, complete: true, failure: None })
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use muse_domain::SearchPage;

	use super::*;
	use crate::BoxFuture;

	fn object(id: &str) -> CollectionObject {
		CollectionObject {
			id: id.to_string(),
			title: format!("Object {id}"),
			unit_code: Some("NMAH".to_string()),
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

	/// Synthetic upstream with a fixed record set, optional duplicated edge
	/// rows, and a scriptable failure schedule.
	struct FakeCatalog {
		records: Vec<CollectionObject>,
		duplicate_first_at_offset: Option<u32>,
		failures: Mutex<Vec<bool>>,
	}
	impl FakeCatalog {
		fn with_records(count: usize) -> Self {
			Self {
				records: (0..count).map(|i| object(&format!("obj-{i}"))).collect(),
				duplicate_first_at_offset: None,
				failures: Mutex::new(Vec::new()),
			}
		}

		fn failing_with(mut schedule: Vec<bool>, count: usize) -> Self {
			schedule.reverse();

			Self {
				records: (0..count).map(|i| object(&format!("obj-{i}"))).collect(),
				duplicate_first_at_offset: None,
				failures: Mutex::new(schedule),
			}
		}
	}
	impl Catalog for FakeCatalog {
		fn search<'a>(&'a self, filter: &'a SearchFilter) -> BoxFuture<'a, Result<SearchPage>> {
			Box::pin(async move {
				let should_fail =
					self.failures.lock().expect("failure schedule").pop().unwrap_or(false);

				if should_fail {
					return Err(Error::Unavailable { message: "connection reset".to_string() });
				}

				let start = filter.offset as usize;
				let end = (start + filter.limit as usize).min(self.records.len());
				let mut rows: Vec<_> =
					self.records.get(start..end).unwrap_or_default().to_vec();

				// Simulate unstable upstream ordering: a later batch repeats
				// the very first record.
				if self.duplicate_first_at_offset == Some(filter.offset)
					&& let Some(first) = self.records.first()
				{
					rows.insert(0, first.clone());
				}

				Ok(SearchPage::from_objects(rows, self.records.len() as u64, filter.offset))
			})
		}

		fn get_object<'a>(
			&'a self,
			id: &'a str,
		) -> BoxFuture<'a, Result<Option<CollectionObject>>> {
			Box::pin(async move {
				Ok(self.records.iter().find(|record| record.id == id).cloned())
			})
		}
	}

	#[tokio::test]
	async fn collects_every_record_when_budget_allows() {
		let catalog = FakeCatalog::with_records(25);
		let harvest = collect_all(&catalog, &SearchFilter::default(), 100, 10)
			.await
			.expect("harvest");

		assert!(harvest.complete);
		assert_eq!(harvest.objects.len(), 25);
		assert_eq!(harvest.total_available, Some(25));
	}

	#[tokio::test]
	async fn budget_caps_the_harvest_with_no_duplicates() {
		let catalog = FakeCatalog::with_records(25);
		let harvest = collect_all(&catalog, &SearchFilter::default(), 12, 10)
			.await
			.expect("harvest");

		assert_eq!(harvest.objects.len(), 12);

		let mut ids: Vec<_> = harvest.objects.iter().map(|o| o.id.clone()).collect();

		ids.sort();
		ids.dedup();

		assert_eq!(ids.len(), 12);
	}

	#[tokio::test]
	async fn overlapping_batches_deduplicate_by_id() {
		let mut catalog = FakeCatalog::with_records(15);

		catalog.duplicate_first_at_offset = Some(10);

		let harvest = collect_all(&catalog, &SearchFilter::default(), 100, 10)
			.await
			.expect("harvest");

		assert_eq!(harvest.objects.len(), 15);
	}

	#[tokio::test]
	async fn one_transport_failure_is_retried() {
		let catalog = FakeCatalog::failing_with(vec![true, false, false], 15);
		let harvest = collect_all(&catalog, &SearchFilter::default(), 100, 10)
			.await
			.expect("harvest");

		assert!(harvest.complete);
		assert_eq!(harvest.objects.len(), 15);
	}

	#[tokio::test]
	async fn two_consecutive_failures_surface_partial_results() {
		let catalog = FakeCatalog::failing_with(vec![false, true, true], 30);
		let harvest = collect_all(&catalog, &SearchFilter::default(), 100, 10)
			.await
			.expect("harvest");

		assert!(!harvest.complete);
		assert_eq!(harvest.objects.len(), 10);
		assert_eq!(harvest.failure.as_deref(), Some("connection reset"));
	}

	#[tokio::test]
	async fn rejection_propagates_as_an_error() {
		struct Rejecting;
		impl Catalog for Rejecting {
			fn search<'a>(
				&'a self,
				_filter: &'a SearchFilter,
			) -> BoxFuture<'a, Result<SearchPage>> {
				Box::pin(async { Err(Error::Rejected { status: 403 }) })
			}

			fn get_object<'a>(
				&'a self,
				_id: &'a str,
			) -> BoxFuture<'a, Result<Option<CollectionObject>>> {
				Box::pin(async { Ok(None) })
			}
		}

		let err = collect_all(&Rejecting, &SearchFilter::default(), 100, 10)
			.await
			.expect_err("rejection");

		assert!(matches!(err, Error::Rejected { status: 403 }));
	}
}
