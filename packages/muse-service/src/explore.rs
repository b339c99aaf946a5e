use muse_domain::{
	SampleRequest, SearchFilter, SearchPage,
	sample::{Grouping, stratified_fill},
	units,
};

use crate::{Error, Result, Service};

/// Progression of one explore call. Validation failure moves Primary to
/// Fallback exactly once; a Fallback failure surfaces the original error.
enum Attempt {
	Primary,
	Fallback { original: Error },
}

impl Service {
	/// Diversity-sampled exploration of a topic.
	///
	/// Fetches a broad candidate pool, then stratifies it across institutions
	/// (or across object types when scoped to one institution) so the caller
	/// sees the range of what is available instead of the first N rows.
	pub async fn explore(&self, request: SampleRequest) -> Result<SearchPage> {
		let mut attempt = Attempt::Primary;

		loop {
			match attempt {
				Attempt::Primary => match self.explore_sampled(&request).await {
					Ok(page) => return Ok(page),
					Err(err @ Error::InvalidRequest { .. }) => {
						tracing::warn!(
							%err,
							"Explore validation failed; retrying once with a truncated topic."
						);

						attempt = Attempt::Fallback { original: err };
					},
					Err(other) => return Err(other),
				},
				Attempt::Fallback { original } =>
					return match self.explore_fallback(&request).await {
						Ok(page) => Ok(page),
						Err(fallback_err) => {
							tracing::error!(%fallback_err, "Explore fallback also failed.");

							Err(original)
						},
					},
			}
		}
	}

	async fn explore_sampled(&self, request: &SampleRequest) -> Result<SearchPage> {
		let topic = request.topic.trim();

		if topic.is_empty() {
			return Err(Error::InvalidRequest { message: "Topic must be non-empty.".to_string() });
		}
		if topic.chars().count() < 2 {
			return Err(Error::InvalidRequest {
				message: "Topic must be at least 2 characters long.".to_string(),
			});
		}

		let cfg = self.explore_cfg();
		let max_samples = request.max_samples.clamp(cfg.min_samples, cfg.max_samples);
		let unit_code = request.collection.as_deref().and_then(resolve_collection);
		let continuing = !request.excluded_ids.is_empty();
		let pool_limit = pool_limit(
			max_samples,
			cfg.pool_multiplier,
			self.upstream().page_rows,
			continuing,
			unit_code.is_some(),
		);
		let filter = SearchFilter {
			query: Some(topic.to_string()),
			unit_code: unit_code.map(str::to_string),
			limit: pool_limit,
			offset: 0,
			..Default::default()
		};
		let pool = self.catalog().search(&filter).await?;
		let candidates: Vec<_> = pool
			.objects
			.into_iter()
			.filter(|object| !request.excluded_ids.contains(&object.id))
			.collect();

		if continuing && candidates.is_empty() {
			tracing::info!(
				topic,
				pool_total = pool.total_count,
				"Continue-explore pool is exhausted; returning an empty page."
			);

			return Ok(SearchPage::empty());
		}

		let grouping =
			if unit_code.is_some() { Grouping::ByObjectType } else { Grouping::ByUnit };
		let sampled = stratified_fill(&candidates, max_samples as usize, grouping);
		let total_count = pool.total_count.max(sampled.len() as u64);

		tracing::info!(
			topic,
			unit = unit_code.unwrap_or("all"),
			sampled = sampled.len(),
			pool_total = pool.total_count,
			"Explore sampling completed."
		);

		Ok(SearchPage::from_objects(sampled, total_count, 0))
	}

	/// Best-effort second attempt: plain search with a truncated topic and a
	/// smaller pool. The original validation error is logged by the caller
	/// and surfaced if this also fails.
	async fn explore_fallback(&self, request: &SampleRequest) -> Result<SearchPage> {
		let truncated: String = request.topic.trim().chars().take(100).collect();

		if truncated.is_empty() {
			return Err(Error::InvalidRequest { message: "Topic must be non-empty.".to_string() });
		}

		let filter = SearchFilter {
			query: Some(truncated),
			limit: request.max_samples.clamp(1, 100),
			offset: request.excluded_ids.len() as u32,
			..Default::default()
		};

		Ok(self.catalog().search(&filter).await?)
	}
}

fn resolve_collection(collection: &str) -> Option<&'static str> {
	let code = units::resolve(collection);

	if code.is_none() {
		// Unresolved names are an expected outcome; search all institutions
		// rather than failing.
		tracing::debug!(collection, "Institution name did not resolve; searching unscoped.");
	}

	code
}

/// Continue mode scans a deeper pool than a fresh explore, since the shallow
/// rows have already been seen.
fn pool_limit(
	max_samples: u32,
	multiplier: u32,
	page_rows: u32,
	continuing: bool,
	scoped: bool,
) -> u32 {
	let raw = match (continuing, scoped) {
		(false, _) => (max_samples * multiplier).min(400),
		(true, true) => (max_samples * 4).min(800),
		(true, false) => (max_samples * 6).min(1_200),
	};

	raw.min(page_rows).max(1)
}
