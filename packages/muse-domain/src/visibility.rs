use crate::model::CollectionObject;

/// Computes the effective "on view" status for an already-normalized object.
///
/// The upstream's physical-exhibit flag both under- and over-reports, so a
/// populated exhibition title or location counts as independent corroborating
/// evidence. Callers that need visibility-filtered results fetch broadly
/// with the upstream on-view filter unset and apply this function locally.
pub fn is_effectively_on_view(object: &CollectionObject) -> bool {
	object.is_on_view
		|| object.exhibition_title.as_deref().is_some_and(|title| !title.trim().is_empty())
		|| object.exhibition_location.as_deref().is_some_and(|location| !location.trim().is_empty())
}
