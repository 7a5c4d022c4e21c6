//! Query construction: filter rendering, fuzzy title patterns and
//! query-side tokenization.
use std::collections::BTreeSet;
use std::ops::Bound::{Included, Unbounded};

use tantivy::query::{AllQuery, BooleanQuery, BoostQuery, ConstScoreQuery, Occur, Query, RangeQuery, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

use jobsearch_core::filter::Predicate;

use crate::index::JobTextIndex;
use crate::schema::JobFields;

/// Characters a fuzzy match must share with the query word.
pub const FUZZY_PREFIX_CHARS: usize = 2;

/// Renders the conjunction of `predicates`. An empty list matches every
/// document.
pub fn render_filter(fields: &JobFields, predicates: &[Predicate]) -> Box<dyn Query> {
	let clauses: Vec<(Occur, Box<dyn Query>)> = predicates
		.iter()
		.flat_map(|p| render_predicate(fields, p))
		.map(|q| (Occur::Must, q))
		.collect();
	if clauses.is_empty() {
		Box::new(AllQuery)
	} else {
		Box::new(BooleanQuery::new(clauses))
	}
}

fn render_predicate(fields: &JobFields, predicate: &Predicate) -> Vec<Box<dyn Query>> {
	match predicate {
		Predicate::Status(status) => vec![keyword(fields.status, status.as_str())],
		Predicate::Moderation(moderation) => vec![keyword(fields.moderation, moderation.as_str())],
		Predicate::DeadlineFrom(t) => vec![Box::new(RangeQuery::new(
			Included(Term::from_field_i64(fields.deadline, t.timestamp_millis())),
			Unbounded,
		))],
		Predicate::Equals(field, value) => vec![keyword(fields.keyword(*field), value)],
		Predicate::SalaryOverlap { min, max } => {
			// Missing job bounds are stored as i64::MIN / i64::MAX, so these
			// ranges admit them without a separate null check.
			let mut out: Vec<Box<dyn Query>> = Vec::new();
			if let Some(max) = max {
				out.push(Box::new(RangeQuery::new(
					Unbounded,
					Included(Term::from_field_i64(fields.min_salary, *max)),
				)));
			}
			if let Some(min) = min {
				out.push(Box::new(RangeQuery::new(
					Included(Term::from_field_i64(fields.max_salary, *min)),
					Unbounded,
				)));
			}
			out
		}
		// Radius renders as its bounding box; callers re-check the exact
		// distance on the hit coordinates.
		Predicate::WithinRadius(radius) => lat_lng_box(fields, &radius.bounding_box()),
		Predicate::WithinBox(bbox) => lat_lng_box(fields, bbox),
	}
}

fn lat_lng_box(fields: &JobFields, bbox: &jobsearch_core::geo::BoundingBox) -> Vec<Box<dyn Query>> {
	vec![
		Box::new(RangeQuery::new(
			Included(Term::from_field_f64(fields.lat, bbox.min_lat)),
			Included(Term::from_field_f64(fields.lat, bbox.max_lat)),
		)),
		Box::new(RangeQuery::new(
			Included(Term::from_field_f64(fields.lng, bbox.min_lng)),
			Included(Term::from_field_f64(fields.lng, bbox.max_lng)),
		)),
	]
}

fn keyword(field: Field, value: &str) -> Box<dyn Query> {
	Box::new(TermQuery::new(Term::from_field_text(field, value), IndexRecordOption::Basic))
}

/// Wraps a filter so it restricts matches without contributing to the score.
pub fn as_filter(query: Box<dyn Query>) -> Box<dyn Query> {
	Box::new(ConstScoreQuery::new(query, 0.0))
}

/// Regex over index terms matching `word` within one edit (insertion,
/// deletion, substitution or adjacent transposition) while keeping its first
/// [`FUZZY_PREFIX_CHARS`] characters intact.
pub fn fuzzy_pattern(word: &str) -> String {
	let chars: Vec<char> = word.chars().collect();
	let split = chars.len().min(FUZZY_PREFIX_CHARS);
	let (prefix, rest) = chars.split_at(split);

	// `None` stands for "any single character".
	let mut variants: Vec<Vec<Option<char>>> = Vec::new();
	let exact: Vec<Option<char>> = rest.iter().copied().map(Some).collect();
	variants.push(exact.clone());
	for i in 0..rest.len() {
		let mut deletion = exact.clone();
		deletion.remove(i);
		variants.push(deletion);

		let mut substitution = exact.clone();
		substitution[i] = None;
		variants.push(substitution);

		if i + 1 < rest.len() && rest[i] != rest[i + 1] {
			let mut transposition = exact.clone();
			transposition.swap(i, i + 1);
			variants.push(transposition);
		}
	}
	for i in 0..=rest.len() {
		let mut insertion = exact.clone();
		insertion.insert(i, None);
		variants.push(insertion);
	}

	let alternatives: BTreeSet<String> = variants.iter().map(|v| render_variant(v)).collect();
	let prefix: String = prefix.iter().collect();
	let alternatives: Vec<String> = alternatives.into_iter().collect();
	format!("{}(?:{})", regex::escape(&prefix), alternatives.join("|"))
}

fn render_variant(variant: &[Option<char>]) -> String {
	let mut out = String::new();
	for c in variant {
		match c {
			Some(c) => out.push_str(&regex::escape(&c.to_string())),
			None => out.push('.'),
		}
	}
	out
}

/// Regex matching any term starting with `prefix`.
pub fn prefix_pattern(prefix: &str) -> String {
	format!("{}.*", regex::escape(prefix))
}

/// Exact term or one-edit fuzzy variant of `word` on `field`.
pub fn fuzzy_word(field: Field, word: &str, exact_boost: f32) -> anyhow::Result<Box<dyn Query>> {
	let exact: Box<dyn Query> = Box::new(TermQuery::new(
		Term::from_field_text(field, word),
		IndexRecordOption::WithFreqs,
	));
	let fuzzy = RegexQuery::from_pattern(&fuzzy_pattern(word), field)?;
	Ok(Box::new(BooleanQuery::new(vec![
		(Occur::Should, Box::new(BoostQuery::new(exact, exact_boost)) as Box<dyn Query>),
		(Occur::Should, Box::new(fuzzy)),
	])))
}

impl JobTextIndex {
	/// Tokens of `text` as the title analyzer produces them.
	pub fn analyze(&self, text: &str) -> anyhow::Result<Vec<String>> {
		let mut analyzer = self.index.tokenizer_for_field(self.fields.title)?;
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() {
			tokens.push(stream.token().text.clone());
		}
		Ok(tokens)
	}
}
