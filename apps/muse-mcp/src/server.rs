use std::{collections::HashSet, net::SocketAddr, sync::Arc};

use axum::{
	Router,
	body::Body,
	extract::State,
	http::{HeaderMap, Request},
	middleware::{self, Next},
	response::IntoResponse,
};
use color_eyre::Result;
use rmcp::{
	ErrorData, ServerHandler,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo},
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::McpAuthState;
use muse_domain::{SampleRequest, SearchFilter, units};
use muse_service::Service;

const HEADER_AUTHORIZATION: &str = "Authorization";

#[derive(Clone)]
struct MuseMcp {
	service: Arc<Service>,
	tool_router: ToolRouter<Self>,
}
impl MuseMcp {
	fn new(service: Arc<Service>) -> Self {
		Self { service, tool_router: Self::tool_router() }
	}
}

#[rmcp::tool_router]
impl MuseMcp {
	#[rmcp::tool(
		name = "muse_search",
		description = "Search open-access museum collections with optional filters for institution, object type, maker, material, topic, imagery, license and physical display.",
		input_schema = search_schema()
	)]
	async fn muse_search(&self, mut params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let unit_code = take_unit(&mut params, "collection")?;
		let filter = SearchFilter {
			query: take_optional_string(&mut params, "query")?,
			unit_code,
			object_type: take_optional_string(&mut params, "object_type")?,
			maker: take_optional_string(&mut params, "maker")?,
			material: take_optional_string(&mut params, "material")?,
			topic: take_optional_string(&mut params, "topic")?,
			has_images: take_optional_bool(&mut params, "has_images")?,
			is_cc0: take_optional_bool(&mut params, "is_cc0")?,
			on_view: take_optional_bool(&mut params, "on_view")?,
			limit: take_optional_u32(&mut params, "limit")?.unwrap_or(20),
			offset: take_optional_u32(&mut params, "offset")?.unwrap_or(0),
		};

		to_tool_result(self.service.search(filter).await)
	}

	#[rmcp::tool(
		name = "muse_explore",
		description = "Explore a topic with diversity sampling: results are spread across institutions (or object types when scoped to one institution) instead of the first rows.",
		input_schema = explore_schema()
	)]
	async fn muse_explore(&self, mut params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let request = SampleRequest {
			topic: take_required_string(&mut params, "topic")?,
			collection: take_optional_string(&mut params, "collection")?,
			max_samples: take_optional_u32(&mut params, "max_samples")?.unwrap_or(20),
			excluded_ids: HashSet::new(),
		};

		to_tool_result(self.service.explore(request).await)
	}

	#[rmcp::tool(
		name = "muse_explore_continue",
		description = "Continue a previous exploration, excluding already-seen object identifiers so every result is new.",
		input_schema = explore_continue_schema()
	)]
	async fn muse_explore_continue(
		&self,
		mut params: JsonObject,
	) -> Result<CallToolResult, ErrorData> {
		let request = SampleRequest {
			topic: take_required_string(&mut params, "topic")?,
			collection: take_optional_string(&mut params, "collection")?,
			max_samples: take_optional_u32(&mut params, "max_samples")?.unwrap_or(20),
			excluded_ids: take_string_set(&mut params, "excluded_ids")?,
		};

		to_tool_result(self.service.explore(request).await)
	}

	#[rmcp::tool(
		name = "muse_object_get",
		description = "Fetch one collection object by identifier, with full normalized metadata.",
		input_schema = object_get_schema()
	)]
	async fn muse_object_get(&self, mut params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let object_id = take_required_string(&mut params, "object_id")?;

		match self.service.get_object(&object_id).await {
			Ok(Some(object)) => Ok(CallToolResult::structured(encode(&object)?)),
			Ok(None) => Ok(CallToolResult::structured_error(json!({
				"error": format!("No object with identifier {object_id}."),
				"object_id": object_id,
			}))),
			Err(err) => error_result(err),
		}
	}

	#[rmcp::tool(
		name = "muse_units_list",
		description = "List the member institutions that can be used as a collection filter.",
		input_schema = units_list_schema()
	)]
	async fn muse_units_list(&self, _params: JsonObject) -> Result<CallToolResult, ErrorData> {
		Ok(CallToolResult::structured(json!({ "units": self.service.list_units() })))
	}

	#[rmcp::tool(
		name = "muse_on_view_list",
		description = "List one page of an institution's objects currently on physical display, verified against exhibition metadata.",
		input_schema = on_view_list_schema()
	)]
	async fn muse_on_view_list(&self, mut params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let unit_code = take_required_unit(&mut params, "collection")?;
		// A broad page by default; local verification discards most rows.
		let limit = take_optional_u32(&mut params, "limit")?.unwrap_or(500);
		let offset = take_optional_u32(&mut params, "offset")?.unwrap_or(0);

		to_tool_result(self.service.objects_on_view(&unit_code, limit, offset).await)
	}

	#[rmcp::tool(
		name = "muse_on_view_find",
		description = "Exhaustively search for objects on physical display matching a query, scanning up to max_scan records and verifying each locally.",
		input_schema = on_view_find_schema()
	)]
	async fn muse_on_view_find(&self, mut params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let query = take_required_string(&mut params, "query")?;
		let unit_code = take_unit(&mut params, "collection")?;
		let max_scan = take_optional_u32(&mut params, "max_scan")?.unwrap_or(5_000);

		to_tool_result(self.service.find_on_view(&query, unit_code.as_deref(), max_scan).await)
	}

	#[rmcp::tool(
		name = "muse_on_view_check",
		description = "Check whether a single object is effectively on physical display, combining the upstream flag with exhibition metadata.",
		input_schema = object_get_schema()
	)]
	async fn muse_on_view_check(&self, mut params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let object_id = take_required_string(&mut params, "object_id")?;

		match self.service.check_on_view(&object_id).await {
			Ok(Some(verdict)) => Ok(CallToolResult::structured(encode(&verdict)?)),
			Ok(None) => Ok(CallToolResult::structured_error(json!({
				"error": format!("No object with identifier {object_id}."),
				"object_id": object_id,
			}))),
			Err(err) => error_result(err),
		}
	}
}

#[rmcp::tool_handler]
impl ServerHandler for MuseMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(
				"Collection discovery tools over open-access museum records: filtered search, diversity-sampled exploration, and on-view verification.".to_string(),
			),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

pub async fn serve_mcp(
	bind_addr: &str,
	service: Arc<Service>,
	auth_state: McpAuthState,
) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let middleware_auth_state = auth_state.clone();
	let session_manager: Arc<LocalSessionManager> = Default::default();
	let http_service = StreamableHttpService::new(
		move || Ok(MuseMcp::new(service.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new()
		.fallback_service(http_service)
		.layer(middleware::from_fn_with_state(middleware_auth_state, mcp_auth_middleware));
	let listener = TcpListener::bind(bind_addr).await?;

	tracing::info!(%bind_addr, "MCP server listening.");

	axum::serve(listener, router).await?;

	Ok(())
}

fn is_authorized(headers: &HeaderMap, auth_state: &McpAuthState) -> bool {
	match auth_state {
		McpAuthState::Off => true,
		McpAuthState::StaticKeys { bearer_token } =>
			read_bearer_token(headers).is_some_and(|token| token == bearer_token),
	}
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

async fn mcp_auth_middleware(
	State(auth_state): State<McpAuthState>,
	req: Request<Body>,
	next: Next,
) -> axum::response::Response {
	if !is_authorized(req.headers(), &auth_state) {
		return (
			axum::http::StatusCode::UNAUTHORIZED,
			"Authentication required for security.auth_mode=static_keys with a Bearer token.",
		)
			.into_response();
	}

	next.run(req).await
}

fn to_tool_result<T>(result: Result<T, muse_service::Error>) -> Result<CallToolResult, ErrorData>
where
	T: serde::Serialize,
{
	match result {
		Ok(value) => Ok(CallToolResult::structured(encode(&value)?)),
		Err(err) => error_result(err),
	}
}

/// Invalid input is the caller's protocol error; upstream trouble is reported
/// as a structured tool failure the model can read and react to.
fn error_result(err: muse_service::Error) -> Result<CallToolResult, ErrorData> {
	match err {
		muse_service::Error::InvalidRequest { message } =>
			Err(ErrorData::invalid_params(message, None)),
		other => Ok(CallToolResult::structured_error(json!({ "error": other.to_string() }))),
	}
}

fn encode<T>(value: &T) -> Result<Value, ErrorData>
where
	T: serde::Serialize,
{
	serde_json::to_value(value)
		.map_err(|err| ErrorData::internal_error(format!("Encoding failed: {err}"), None))
}

/// Resolves a free-text institution name or code to a unit code, rejecting
/// names that match no institution.
fn take_unit(params: &mut JsonObject, key: &str) -> Result<Option<String>, ErrorData> {
	let Some(raw) = take_optional_string(params, key)? else { return Ok(None) };

	match units::resolve(&raw) {
		Some(code) => Ok(Some(code.to_string())),
		None => Err(ErrorData::invalid_params(
			format!("{key} {raw:?} matches no institution. Use muse_units_list to see valid codes."),
			None,
		)),
	}
}

fn take_required_unit(params: &mut JsonObject, key: &str) -> Result<String, ErrorData> {
	take_unit(params, key)?
		.ok_or_else(|| ErrorData::invalid_params(format!("{key} is required."), None))
}

fn take_required_string(params: &mut JsonObject, key: &str) -> Result<String, ErrorData> {
	let value = params
		.remove(key)
		.ok_or_else(|| ErrorData::invalid_params(format!("{key} is required."), None))?;
	let text = value
		.as_str()
		.ok_or_else(|| ErrorData::invalid_params(format!("{key} must be a string."), None))?
		.trim();

	if text.is_empty() {
		return Err(ErrorData::invalid_params(format!("{key} must be non-empty."), None));
	}

	Ok(text.to_string())
}

fn take_optional_string(params: &mut JsonObject, key: &str) -> Result<Option<String>, ErrorData> {
	let Some(value) = params.remove(key) else { return Ok(None) };

	if value.is_null() {
		return Ok(None);
	}

	let text = value
		.as_str()
		.ok_or_else(|| ErrorData::invalid_params(format!("{key} must be a string."), None))?
		.trim();

	if text.is_empty() { Ok(None) } else { Ok(Some(text.to_string())) }
}

fn take_optional_bool(params: &mut JsonObject, key: &str) -> Result<Option<bool>, ErrorData> {
	let Some(value) = params.remove(key) else { return Ok(None) };

	if value.is_null() {
		return Ok(None);
	}

	value
		.as_bool()
		.map(Some)
		.ok_or_else(|| ErrorData::invalid_params(format!("{key} must be a boolean."), None))
}

fn take_optional_u32(params: &mut JsonObject, key: &str) -> Result<Option<u32>, ErrorData> {
	let Some(value) = params.remove(key) else { return Ok(None) };

	if value.is_null() {
		return Ok(None);
	}

	let number = value
		.as_u64()
		.ok_or_else(|| {
			ErrorData::invalid_params(format!("{key} must be a non-negative integer."), None)
		})?;

	u32::try_from(number).map(Some).map_err(|_| {
		ErrorData::invalid_params(format!("{key} is out of range."), None)
	})
}

fn take_string_set(params: &mut JsonObject, key: &str) -> Result<HashSet<String>, ErrorData> {
	let Some(value) = params.remove(key) else { return Ok(HashSet::new()) };

	if value.is_null() {
		return Ok(HashSet::new());
	}

	let items = value
		.as_array()
		.ok_or_else(|| ErrorData::invalid_params(format!("{key} must be an array."), None))?;

	items
		.iter()
		.map(|item| {
			item.as_str().map(str::to_string).ok_or_else(|| {
				ErrorData::invalid_params(format!("{key} must contain only strings."), None)
			})
		})
		.collect()
}

fn search_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"query": { "type": ["string", "null"] },
			"collection": { "type": ["string", "null"], "description": "Institution name or unit code." },
			"object_type": { "type": ["string", "null"] },
			"maker": { "type": ["string", "null"] },
			"material": { "type": ["string", "null"] },
			"topic": { "type": ["string", "null"] },
			"has_images": { "type": ["boolean", "null"] },
			"is_cc0": { "type": ["boolean", "null"] },
			"on_view": { "type": ["boolean", "null"] },
			"limit": { "type": ["integer", "null"], "minimum": 1, "maximum": 1000 },
			"offset": { "type": ["integer", "null"], "minimum": 0 }
		}
	}))
}

fn explore_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["topic"],
		"properties": {
			"topic": { "type": "string" },
			"collection": { "type": ["string", "null"], "description": "Institution name or unit code." },
			"max_samples": { "type": ["integer", "null"], "minimum": 1 }
		}
	}))
}

fn explore_continue_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["topic", "excluded_ids"],
		"properties": {
			"topic": { "type": "string" },
			"collection": { "type": ["string", "null"], "description": "Institution name or unit code." },
			"max_samples": { "type": ["integer", "null"], "minimum": 1 },
			"excluded_ids": {
				"type": "array",
				"items": { "type": "string" },
				"description": "Object identifiers already shown; none of them will be returned again."
			}
		}
	}))
}

fn object_get_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["object_id"],
		"properties": {
			"object_id": { "type": "string" }
		}
	}))
}

fn units_list_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {}
	}))
}

fn on_view_list_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["collection"],
		"properties": {
			"collection": { "type": "string", "description": "Institution name or unit code." },
			"limit": { "type": ["integer", "null"], "minimum": 1, "maximum": 1000 },
			"offset": { "type": ["integer", "null"], "minimum": 0 }
		}
	}))
}

fn on_view_find_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["query"],
		"properties": {
			"query": { "type": "string" },
			"collection": { "type": ["string", "null"], "description": "Institution name or unit code." },
			"max_scan": { "type": ["integer", "null"], "minimum": 1, "description": "Upper bound on records scanned upstream." }
		}
	}))
}
