use serde_json::Value;
use url::Url;

use crate::model::{CollectionObject, ImageRef};

pub type Result<T, E = NormalizeError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
	#[error("Record is not a JSON object or a JSON-encoded object: {detail}")]
	MalformedRecord { detail: String },
}

/// Normalizes one raw upstream record into the canonical shape.
///
/// Accepts a JSON object or a JSON-encoded string of one. The upstream is
/// inconsistent about nested shapes, so every sub-field access here is
/// tolerant: a missing or unrecognized shape yields an absent field, never an
/// error. Only a record that is not an object at all fails.
pub fn normalize(raw: &Value) -> Result<CollectionObject> {
	let parsed;
	let record = match raw {
		Value::Object(_) => raw,
		Value::String(text) => {
			parsed = serde_json::from_str::<Value>(text).map_err(|err| {
				NormalizeError::MalformedRecord { detail: format!("inner JSON parse failed: {err}") }
			})?;

			if !parsed.is_object() {
				return Err(NormalizeError::MalformedRecord {
					detail: "JSON-encoded payload is not an object".to_string(),
				});
			}

			&parsed
		},
		other => {
			return Err(NormalizeError::MalformedRecord {
				detail: format!("unexpected JSON type {}", type_name(other)),
			});
		},
	};
	let content = record.get("content").cloned().unwrap_or(Value::Null);
	let descriptive = content.get("descriptiveNonRepeating").cloned().unwrap_or(Value::Null);
	let freetext = content.get("freetext").cloned().unwrap_or(Value::Null);
	let indexed = content.get("indexedStructured").cloned().unwrap_or(Value::Null);

	Ok(CollectionObject {
		id: str_field(record, "id").unwrap_or_default(),
		title: str_field(record, "title").unwrap_or_default(),
		unit_code: str_field(record, "unitCode").filter(|code| !code.is_empty()),
		unit_name: first_content(indexed.get("unit_name")),
		object_type: first_content(freetext.get("objectType"))
			.map(|value| value.trim().to_lowercase())
			.filter(|value| !value.is_empty()),
		description: labeled_note(freetext.get("notes"), "Description"),
		date: descriptive.get("date").and_then(|date| str_field(date, "content")),
		makers: content_list(freetext.get("maker")),
		materials: content_list(freetext.get("physicalDescription")),
		topics: string_list(indexed.get("topic")),
		credit_line: str_field(&descriptive, "creditLine").filter(|line| !line.is_empty()),
		record_link: str_field(&descriptive, "record_link"),
		images: extract_images(descriptive.get("online_media")),
		is_cc0: descriptive
			.get("metadata_usage")
			.and_then(|usage| usage.get("access"))
			.and_then(Value::as_str)
			== Some("CC0"),
		is_on_view: parse_on_view(indexed.get("onPhysicalExhibit")),
		exhibition_title: exhibition_field(indexed.get("exhibition"), "exhibitionTitle"),
		exhibition_location: exhibition_location(indexed.get("exhibition")),
		raw_metadata: Some(record.clone()),
	})
}

/// Resolves the three known media shapes into one item list.
///
/// The upstream serves "attached media" as a bare array, as an object with a
/// `media` array, or as a single embedded media object. Anything else is an
/// empty list.
fn media_items(online_media: Option<&Value>) -> Vec<Value> {
	match online_media {
		Some(Value::Array(items)) => items.clone(),
		Some(Value::Object(map)) => match map.get("media") {
			Some(Value::Array(items)) => items.clone(),
			// An object that itself looks like one media item is wrapped in a
			// singleton list.
			None if map.contains_key("type") || map.contains_key("content") =>
				vec![Value::Object(map.clone())],
			_ => Vec::new(),
		},
		_ => Vec::new(),
	}
}

fn extract_images(online_media: Option<&Value>) -> Vec<ImageRef> {
	media_items(online_media)
		.iter()
		.filter(|item| item.get("type").and_then(Value::as_str) == Some("Images"))
		.map(|item| ImageRef {
			url: image_url(item),
			thumbnail_url: str_field(item, "thumbnail").and_then(valid_http_url),
			width: item.get("width").and_then(Value::as_u64).map(|v| v as u32),
			height: item.get("height").and_then(Value::as_u64).map(|v| v as u32),
			format: str_field(item, "format"),
			is_cc0: item.get("usage").and_then(|usage| usage.get("access")).and_then(Value::as_str)
				== Some("CC0"),
		})
		.collect()
}

/// Picks the best candidate URL for a media item.
///
/// Preference order: a resource explicitly labeled high-resolution, then the
/// first of `content` / `url` / `href` / `src` that validates. Invalid
/// candidates are dropped rather than stored.
fn image_url(item: &Value) -> Option<String> {
	if let Some(Value::Array(resources)) = item.get("resources") {
		for resource in resources {
			let label = str_field(resource, "label").unwrap_or_default();

			if label.to_lowercase().contains("high-resolution")
				&& let Some(url) = str_field(resource, "url").and_then(valid_http_url)
			{
				return Some(url);
			}
		}
	}

	["content", "url", "href", "src"]
		.into_iter()
		.filter_map(|key| str_field(item, key).and_then(valid_http_url))
		.next()
}

fn valid_http_url(candidate: String) -> Option<String> {
	let parsed = Url::parse(&candidate).ok()?;

	matches!(parsed.scheme(), "http" | "https").then_some(candidate)
}

/// The physical-exhibit flag arrives either as a list of plain strings or as a
/// list of objects with a `content` key. Only the first element counts;
/// anything unrecognized is "not on view".
fn parse_on_view(flag: Option<&Value>) -> bool {
	let Some(Value::Array(items)) = flag else { return false };
	let Some(first) = items.first() else { return false };

	match first {
		Value::String(text) => text == "Yes",
		Value::Object(map) => map.get("content").and_then(Value::as_str) == Some("Yes"),
		_ => false,
	}
}

fn exhibition_field(exhibitions: Option<&Value>, key: &str) -> Option<String> {
	let Some(Value::Array(items)) = exhibitions else { return None };

	items.first().filter(|first| first.is_object()).and_then(|first| str_field(first, key))
}

fn exhibition_location(exhibitions: Option<&Value>) -> Option<String> {
	let Some(Value::Array(items)) = exhibitions else { return None };
	let first = items.first().filter(|first| first.is_object())?;
	let building = str_field(first, "building").unwrap_or_default();
	let room = str_field(first, "room").unwrap_or_default();

	match (building.is_empty(), room.is_empty()) {
		(false, false) => Some(format!("{building}, {room}")),
		(false, true) => Some(building),
		(true, false) => Some(room),
		(true, true) => None,
	}
}

fn labeled_note(notes: Option<&Value>, label: &str) -> Option<String> {
	let Some(Value::Array(items)) = notes else { return None };

	items
		.iter()
		.find(|note| note.get("label").and_then(Value::as_str) == Some(label))
		.and_then(|note| str_field(note, "content"))
}

fn content_list(field: Option<&Value>) -> Vec<String> {
	let Some(Value::Array(items)) = field else { return Vec::new() };

	items
		.iter()
		.filter(|item| item.is_object())
		.filter_map(|item| str_field(item, "content"))
		.filter(|content| !content.is_empty())
		.collect()
}

fn string_list(field: Option<&Value>) -> Vec<String> {
	let Some(Value::Array(items)) = field else { return Vec::new() };

	items.iter().filter_map(Value::as_str).map(str::to_string).collect()
}

fn first_content(field: Option<&Value>) -> Option<String> {
	let Some(Value::Array(items)) = field else { return None };

	items.first().and_then(|first| str_field(first, "content"))
}

fn str_field(value: &Value, key: &str) -> Option<String> {
	value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
