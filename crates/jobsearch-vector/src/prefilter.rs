//! SQL rendering of [`PreFilter`] for lancedb `only_if`.
//!
//! Geo predicates render as lat/lng boxes; a radius is only approximated this
//! way, so readers re-check [`PreFilter::geo_predicates`] on decoded rows.
use jobsearch_core::filter::{PreFilter, Predicate};
use jobsearch_core::geo::{BoundingBox, GeoPoint};

use crate::table::quote;

/// `None` when the filter has no predicates.
pub fn render_sql(filter: &PreFilter) -> Option<String> {
	let clauses: Vec<String> = filter.predicates.iter().flat_map(render_predicate).collect();
	if clauses.is_empty() {
		None
	} else {
		Some(clauses.join(" AND "))
	}
}

fn render_predicate(predicate: &Predicate) -> Vec<String> {
	match predicate {
		Predicate::Status(status) => vec![format!("status = {}", quote(status.as_str()))],
		Predicate::Moderation(moderation) => vec![format!("moderation = {}", quote(moderation.as_str()))],
		Predicate::DeadlineFrom(t) => vec![format!("deadline >= {}", t.timestamp_millis())],
		Predicate::Equals(field, value) => vec![format!("{} = {}", field.name(), quote(value))],
		Predicate::SalaryOverlap { min, max } => {
			let mut out = Vec::new();
			if let Some(max) = max {
				out.push(format!("(min_salary IS NULL OR min_salary <= {max})"));
			}
			if let Some(min) = min {
				out.push(format!("(max_salary IS NULL OR max_salary >= {min})"));
			}
			out
		}
		Predicate::WithinRadius(radius) => vec![render_box(&radius.bounding_box())],
		Predicate::WithinBox(bbox) => vec![render_box(bbox)],
	}
}

fn render_box(bbox: &BoundingBox) -> String {
	format!(
		"(lat IS NOT NULL AND lng IS NOT NULL AND lat >= {:?} AND lat <= {:?} AND lng >= {:?} AND lng <= {:?})",
		bbox.min_lat, bbox.max_lat, bbox.min_lng, bbox.max_lng
	)
}

/// `ILIKE` pattern matching titles that contain `needle`. LIKE metacharacters
/// in the needle become single-character wildcards, so the pattern may admit
/// a few extra titles; callers re-check the exact substring.
pub fn contains_pattern(needle: &str) -> String {
	let body: String = needle.chars().map(|c| if matches!(c, '%' | '_' | '\\') { '_' } else { c }).collect();
	format!("%{body}%")
}

/// Exact check of the geo predicates the SQL could only approximate.
pub fn geo_matches(filter: &PreFilter, point: Option<GeoPoint>) -> bool {
	filter.geo_predicates().all(|p| match (p, point) {
		(Predicate::WithinRadius(r), Some(point)) => r.contains(point),
		(Predicate::WithinBox(b), Some(point)) => b.contains(point),
		(_, None) => false,
		_ => true,
	})
}
