use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, RegexQuery};
use tantivy::{TantivyDocument, Term};

use jobsearch_core::filter::PreFilter;
use jobsearch_core::types::TitleMatch;

use crate::index::JobTextIndex;
use crate::query::{as_filter, fuzzy_word, prefix_pattern, render_filter};

const EXACT_BOOST: f32 = 2.0;
const PREFIX_BOOST: f32 = 2.0;

/// Title candidates for a partially typed query. Every completed word must
/// match a title word exactly or within one edit; the last word is treated as
/// a prefix, with a fuzzy-prefix fallback for typos.
pub fn suggest_titles(index: &JobTextIndex, query: &str, filter: &PreFilter, limit: usize) -> Result<Vec<TitleMatch>> {
	let words = index.analyze(query)?;
	let Some((last, completed)) = words.split_last() else {
		return Ok(Vec::new());
	};
	if limit == 0 {
		return Ok(Vec::new());
	}
	let title = index.fields.title;

	let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(words.len() + 1);
	for word in completed {
		clauses.push((Occur::Must, fuzzy_word(title, word, EXACT_BOOST)?));
	}
	let prefix: Box<dyn Query> = Box::new(RegexQuery::from_pattern(&prefix_pattern(last), title)?);
	let fuzzy_prefix: Box<dyn Query> = Box::new(FuzzyTermQuery::new_prefix(Term::from_field_text(title, last), 1, true));
	clauses.push((
		Occur::Must,
		Box::new(BooleanQuery::new(vec![
			(Occur::Should, Box::new(BoostQuery::new(prefix, PREFIX_BOOST)) as Box<dyn Query>),
			(Occur::Should, fuzzy_prefix),
		])),
	));
	clauses.push((Occur::Must, as_filter(render_filter(&index.fields, &filter.predicates))));

	let searcher = index.reader.searcher();
	let top_docs = searcher.search(&BooleanQuery::new(clauses), &TopDocs::with_limit(limit))?;
	let mut matches = Vec::with_capacity(top_docs.len());
	for (score, addr) in top_docs {
		let doc: TantivyDocument = searcher.doc(addr)?;
		if let Some(title) = index.stored_text(&doc, title) {
			matches.push(TitleMatch { title, score });
		}
	}
	Ok(matches)
}
