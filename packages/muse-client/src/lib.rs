mod error;
pub mod harvest;

pub use error::{Error, Result};
pub use harvest::{Harvest, collect_all};

use std::{future::Future, pin::Pin, time::Duration};

use reqwest::{Client, StatusCode};
use serde_json::Value;

use muse_domain::{CollectionObject, SearchFilter, SearchPage, normalize, query};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Seam between orchestration and the network. The production implementation
/// is [`CatalogClient`]; tests substitute a synthetic upstream.
pub trait Catalog
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, filter: &'a SearchFilter) -> BoxFuture<'a, Result<SearchPage>>;

	fn get_object<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<CollectionObject>>>;
}

/// Client for the upstream open-access search service.
///
/// Holds one connection pool; safe for concurrent reuse since every request
/// carries its own parameters and response.
#[derive(Clone)]
pub struct CatalogClient {
	http: Client,
	api_base: String,
	api_key: Option<String>,
}
impl CatalogClient {
	pub fn new(upstream: &muse_config::Upstream) -> Result<Self> {
		let http = Client::builder()
			.timeout(Duration::from_millis(upstream.timeout_ms))
			.build()
			.map_err(|err| Error::Unavailable { message: err.to_string() })?;

		Ok(Self {
			http,
			api_base: upstream.api_base.trim_end_matches('/').to_string(),
			api_key: upstream.api_key.clone(),
		})
	}

	/// One search round trip: translate, request, normalize.
	///
	/// Rows that fail normalization are logged and skipped; a partially
	/// normalized page is preferred over aborting the whole request.
	pub async fn search_page(&self, filter: &SearchFilter) -> Result<SearchPage> {
		let mut params = query::build_query(filter);

		if let Some(key) = &self.api_key {
			params.push(("api_key".to_string(), key.clone()));
		}

		let url = format!("{}/search", self.api_base);
		let response = self.http.get(&url).query(&params).send().await?;
		let status = response.status();

		if !status.is_success() {
			return Err(Error::Rejected { status: status.as_u16() });
		}

		let envelope: Value = response
			.json()
			.await
			.map_err(|err| Error::InvalidResponse { message: err.to_string() })?;

		Ok(parse_search_envelope(&envelope, filter.offset))
	}

	/// Single-object lookup. A 404 is "no object with this identifier", not
	/// an error.
	pub async fn fetch_object(&self, id: &str) -> Result<Option<CollectionObject>> {
		let mut params = Vec::new();

		if let Some(key) = &self.api_key {
			params.push(("api_key".to_string(), key.clone()));
		}

		let url = format!("{}/content/{id}", self.api_base);
		let response = self.http.get(&url).query(&params).send().await?;
		let status = response.status();

		if status == StatusCode::NOT_FOUND {
			return Ok(None);
		}
		if !status.is_success() {
			return Err(Error::Rejected { status: status.as_u16() });
		}

		let envelope: Value = response
			.json()
			.await
			.map_err(|err| Error::InvalidResponse { message: err.to_string() })?;
		let Some(record) = envelope.get("response") else {
			tracing::warn!(object_id = id, "Object envelope is missing the response field.");

			return Ok(None);
		};

		match normalize(record) {
			Ok(object) => Ok(Some(object)),
			Err(err) => Err(Error::InvalidResponse { message: err.to_string() }),
		}
	}
}
impl Catalog for CatalogClient {
	fn search<'a>(&'a self, filter: &'a SearchFilter) -> BoxFuture<'a, Result<SearchPage>> {
		Box::pin(self.search_page(filter))
	}

	fn get_object<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<CollectionObject>>> {
		Box::pin(self.fetch_object(id))
	}
}

fn parse_search_envelope(envelope: &Value, offset: u32) -> SearchPage {
	let response = envelope.get("response");
	let rows = response
		.and_then(|r| r.get("rows"))
		.and_then(Value::as_array)
		.cloned()
		.unwrap_or_default();
	let total_count =
		response.and_then(|r| r.get("rowCount")).and_then(Value::as_u64).unwrap_or(0);
	let mut objects = Vec::with_capacity(rows.len());

	for row in &rows {
		match normalize(row) {
			Ok(object) => objects.push(object),
			Err(err) => {
				let row_id = row.get("id").and_then(Value::as_str).unwrap_or("<unknown>");

				tracing::warn!(row_id, %err, "Skipping row that failed normalization.");
			},
		}
	}

	SearchPage::from_objects(objects, total_count, offset)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn row(id: &str) -> Value {
		json!({ "id": id, "title": format!("Object {id}"), "unitCode": "NMAH" })
	}

	#[test]
	fn envelope_with_rows_becomes_a_page_with_pagination() {
		let envelope = json!({
			"response": { "rows": [row("a"), row("b")], "rowCount": 12 }
		});
		let page = parse_search_envelope(&envelope, 0);

		assert_eq!(page.total_count, 12);
		assert_eq!(page.returned_count, 2);
		assert!(page.has_more);
		assert_eq!(page.next_offset, Some(2));
	}

	#[test]
	fn zero_matches_is_an_empty_page_not_an_error() {
		let envelope = json!({ "response": { "rows": [], "rowCount": 0 } });
		let page = parse_search_envelope(&envelope, 0);

		assert_eq!(page.returned_count, 0);
		assert!(!page.has_more);
	}

	#[test]
	fn rows_that_fail_normalization_are_skipped_not_fatal() {
		let envelope = json!({
			"response": { "rows": [row("a"), 42, row("b")], "rowCount": 3 }
		});
		let page = parse_search_envelope(&envelope, 0);

		// The malformed middle row is dropped; returned_count reflects only
		// what normalized.
		assert_eq!(page.returned_count, 2);
		assert_eq!(page.objects[0].id, "a");
		assert_eq!(page.objects[1].id, "b");
	}

	#[test]
	fn missing_envelope_fields_degrade_to_an_empty_page() {
		let page = parse_search_envelope(&json!({}), 5);

		assert_eq!(page.returned_count, 0);
		assert_eq!(page.offset, 5);
	}
}
