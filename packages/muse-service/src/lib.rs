mod error;
pub mod explore;
pub mod on_view;

pub use error::{Error, Result};
pub use on_view::{FindOnViewResult, OnViewVerdict};

use std::sync::Arc;

use muse_client::Catalog;
use muse_config::{Explore, Upstream};
use muse_domain::{CollectionObject, SearchFilter, SearchPage, Unit, units};

/// Collection discovery operations over an explicit catalog seam.
///
/// The catalog is passed in rather than held as a process-wide singleton so
/// tests can substitute a synthetic upstream and concurrent callers share
/// nothing but the connection pool inside the production client.
pub struct Service {
	catalog: Arc<dyn Catalog>,
	upstream: Upstream,
	explore: Explore,
}
impl Service {
	pub fn new(catalog: Arc<dyn Catalog>, upstream: Upstream, explore: Explore) -> Self {
		Self { catalog, upstream, explore }
	}

	/// Straight filtered search; one upstream round trip.
	pub async fn search(&self, mut filter: SearchFilter) -> Result<SearchPage> {
		filter.limit = filter.limit.clamp(1, self.upstream.page_rows);

		let page = self.catalog.search(&filter).await?;

		tracing::info!(
			query = filter.query.as_deref().unwrap_or_default(),
			returned = page.returned_count,
			total = page.total_count,
			"Search completed."
		);

		Ok(page)
	}

	/// Single-object lookup. `None` means "no object with this identifier".
	pub async fn get_object(&self, id: &str) -> Result<Option<CollectionObject>> {
		let id = id.trim();

		if id.is_empty() {
			return Err(Error::InvalidRequest { message: "object_id must be non-empty.".to_string() });
		}

		Ok(self.catalog.get_object(id).await?)
	}

	/// The static institution catalog.
	pub fn list_units(&self) -> &'static [Unit] {
		units::all_units()
	}

	pub(crate) fn catalog(&self) -> &dyn Catalog {
		self.catalog.as_ref()
	}

	pub(crate) fn upstream(&self) -> &Upstream {
		&self.upstream
	}

	pub(crate) fn explore_cfg(&self) -> &Explore {
		&self.explore
	}
}
