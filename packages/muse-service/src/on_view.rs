use muse_client::harvest;
use muse_domain::{CollectionObject, SearchFilter, SearchPage, visibility};
use serde::Serialize;

use crate::{Error, Result, Service};

/// Verdict on a single object's physical visibility.
#[derive(Clone, Debug, Serialize)]
pub struct OnViewVerdict {
	pub object: CollectionObject,
	/// Flag OR a non-blank exhibition title/location. The upstream flag alone
	/// misses records whose exhibition notes are filled in but unflagged.
	pub effectively_on_view: bool,
}

/// Result of an exhaustive on-view scan.
#[derive(Clone, Debug, Serialize)]
pub struct FindOnViewResult {
	pub page: SearchPage,
	/// Records inspected upstream, which can far exceed the matches kept.
	pub scanned: u64,
	/// `false` when the scan stopped early; `failure` carries the reason.
	pub complete: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub failure: Option<String>,
}

impl Service {
	/// One broad upstream page of an institution's objects, filtered locally
	/// to the verified on-view subset. The upstream on-view filter is left
	/// unset on purpose; it both under- and over-reports.
	pub async fn objects_on_view(
		&self,
		unit_code: &str,
		limit: u32,
		offset: u32,
	) -> Result<SearchPage> {
		let unit_code = unit_code.trim();

		if unit_code.is_empty() {
			return Err(Error::InvalidRequest {
				message: "unit_code must be non-empty.".to_string(),
			});
		}

		let filter = SearchFilter {
			query: Some("*".to_string()),
			unit_code: Some(unit_code.to_string()),
			limit: limit.clamp(1, self.upstream().page_rows),
			offset,
			..Default::default()
		};
		let page = self.catalog().search(&filter).await?;
		let returned = page.returned_count;
		let verified: Vec<_> = page
			.objects
			.into_iter()
			.filter(visibility::is_effectively_on_view)
			.collect();

		tracing::info!(
			unit_code,
			returned,
			verified = verified.len(),
			"On-view page verified."
		);

		// A single verified page: the upstream total counts the flag, not the
		// verified state, so it cannot be used for continuation.
		let total = verified.len() as u64;

		Ok(SearchPage::from_objects(verified, total, 0))
	}

	/// Exhaustive search for on-view objects matching a query, verifying
	/// visibility locally across every harvested page.
	pub async fn find_on_view(
		&self,
		query: &str,
		unit_code: Option<&str>,
		max_scan: u32,
	) -> Result<FindOnViewResult> {
		let query = query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let max_scan = max_scan.clamp(1, self.upstream().max_scan);
		let filter = SearchFilter {
			query: Some(query.to_string()),
			unit_code: unit_code.map(|code| code.trim().to_string()).filter(|code| !code.is_empty()),
			..Default::default()
		};
		let harvest =
			harvest::collect_all(self.catalog(), &filter, max_scan, self.upstream().page_rows)
				.await?;
		let scanned = harvest.objects.len() as u64;
		let verified: Vec<_> = harvest
			.objects
			.into_iter()
			.filter(visibility::is_effectively_on_view)
			.collect();

		tracing::info!(
			query,
			scanned,
			verified = verified.len(),
			complete = harvest.complete,
			"On-view scan finished."
		);

		let total = verified.len() as u64;

		Ok(FindOnViewResult {
			page: SearchPage::from_objects(verified, total, 0),
			scanned,
			complete: harvest.complete,
			failure: harvest.failure,
		})
	}

	/// Single lookup plus the effective-visibility verdict. `None` means no
	/// such object exists upstream.
	pub async fn check_on_view(&self, id: &str) -> Result<Option<OnViewVerdict>> {
		let Some(object) = self.get_object(id).await? else { return Ok(None) };
		let effectively_on_view = visibility::is_effectively_on_view(&object);

		Ok(Some(OnViewVerdict { object, effectively_on_view }))
	}
}
