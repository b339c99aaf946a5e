use crate::model::SearchFilter;

/// Hard per-request row ceiling documented by the upstream search API.
pub const PAGE_ROW_CEILING: u32 = 1_000;

/// Translates an abstract filter into upstream query parameters.
///
/// Each present field contributes one clause; clauses are AND-joined into a
/// single `fq` parameter. Absent optional fields emit nothing. Emitting a
/// default for an absent three-state flag would silently restrict unrelated
/// queries, so `None` always means "no clause".
pub fn build_query(filter: &SearchFilter) -> Vec<(String, String)> {
	let mut params = Vec::new();
	let mut clauses = Vec::new();

	if let Some(query) = filter.query.as_deref().filter(|q| !q.trim().is_empty()) {
		params.push(("q".to_string(), query.to_string()));
	}
	if let Some(unit_code) = filter.unit_code.as_deref().filter(|v| !v.is_empty()) {
		clauses.push(format!("unit_code:\"{unit_code}\""));
	}
	if let Some(object_type) = filter.object_type.as_deref().filter(|v| !v.is_empty()) {
		clauses.push(format!("content_type:\"{object_type}\""));
	}
	if let Some(maker) = filter.maker.as_deref().filter(|v| !v.is_empty()) {
		clauses.push(format!("indexed_structured_data.name:\"{maker}\""));
	}
	if let Some(material) = filter.material.as_deref().filter(|v| !v.is_empty()) {
		clauses.push(format!("physicalDescription:\"{material}\""));
	}
	if let Some(topic) = filter.topic.as_deref().filter(|v| !v.is_empty()) {
		clauses.push(format!("topic:\"{topic}\""));
	}
	if filter.has_images == Some(true) {
		clauses.push("online_media_type:Images".to_string());
	}
	if filter.is_cc0 == Some(true) {
		clauses.push("usage_rights:CC0".to_string());
	}
	match filter.on_view {
		Some(true) => clauses.push("onPhysicalExhibit:\"Yes\"".to_string()),
		Some(false) => clauses.push("onPhysicalExhibit:\"No\"".to_string()),
		None => {},
	}

	if !clauses.is_empty() {
		params.push(("fq".to_string(), clauses.join(" AND ")));
	}

	params.push(("start".to_string(), filter.offset.to_string()));
	params.push(("rows".to_string(), filter.limit.min(PAGE_ROW_CEILING).to_string()));

	params
}
