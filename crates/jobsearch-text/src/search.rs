use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{TantivyDocument, Term};

use jobsearch_core::filter::SearchIndexFilter;
use jobsearch_core::geo::{haversine_km, proximity_decay};
use jobsearch_core::types::{SearchHit, SourceKind};

use crate::index::JobTextIndex;
use crate::query::{as_filter, fuzzy_word, render_filter};

pub const TITLE_BOOST: f32 = 2.0;
const EXACT_TERM_BOOST: f32 = 1.5;

/// Text branch: the title must match (fuzzily) at least one query word,
/// description and requirements only add score.
pub fn search_jobs(index: &JobTextIndex, query: &str, filter: &SearchIndexFilter, limit: usize) -> Result<Vec<SearchHit>> {
	let words = index.analyze(query)?;
	if words.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}
	let fields = &index.fields;

	let mut title_words: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(words.len());
	let mut body_words: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(words.len() * 2);
	for word in &words {
		title_words.push((Occur::Should, fuzzy_word(fields.title, word, EXACT_TERM_BOOST)?));
		for field in [fields.description, fields.requirements] {
			body_words.push((
				Occur::Should,
				Box::new(TermQuery::new(Term::from_field_text(field, word), IndexRecordOption::WithFreqs)),
			));
		}
	}

	let title: Box<dyn Query> = Box::new(BoostQuery::new(Box::new(BooleanQuery::new(title_words)), TITLE_BOOST));
	let query = BooleanQuery::new(vec![
		(Occur::Must, title),
		(Occur::Should, Box::new(BooleanQuery::new(body_words)) as Box<dyn Query>),
		(Occur::Must, as_filter(render_filter(fields, &filter.must))),
	]);

	let searcher = index.reader.searcher();
	let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

	let mut hits = Vec::with_capacity(top_docs.len());
	for (score, addr) in top_docs {
		let doc: TantivyDocument = searcher.doc(addr)?;
		let Some(id) = index.stored_text(&doc, fields.id) else {
			tracing::warn!(?addr, "text index document without id");
			continue;
		};
		let location = index.hit_location(&doc);
		let mut score = score;
		if let (Some(near), Some(point)) = (filter.near, location) {
			score += near.weight * proximity_decay(haversine_km(near.origin, point), near.pivot_km) as f32;
		}
		hits.push(SearchHit { id, score, source: SourceKind::Text, location });
	}

	if filter.near.is_some() {
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
	}
	tracing::debug!(words = words.len(), hits = hits.len(), "text branch");
	Ok(hits)
}
