//! Title suggestion ranking for the primary index and the regex fallback.
use std::collections::HashMap;

use anyhow::Result;
use regex::RegexBuilder;

use jobsearch_core::types::{Suggestion, TitleMatch};

/// Score given to fallback suggestions, which have no relevance signal.
pub const FALLBACK_SCORE: f32 = 1.0;

pub fn is_prefix_match(title: &str, query: &str) -> bool {
    title.to_lowercase().starts_with(&query.trim().to_lowercase())
}

/// Keeps the best score per distinct title.
fn dedup_by_title(matches: impl IntoIterator<Item = TitleMatch>) -> Vec<TitleMatch> {
    let mut best: HashMap<String, f32> = HashMap::new();
    for m in matches {
        best.entry(m.title)
            .and_modify(|s| *s = s.max(m.score))
            .or_insert(m.score);
    }
    best.into_iter().map(|(title, score)| TitleMatch { title, score }).collect()
}

/// Primary-path ordering: prefix matches first, then score, then title.
pub fn rank_suggestions(query: &str, matches: Vec<TitleMatch>, limit: usize) -> Vec<Suggestion> {
    let mut out: Vec<Suggestion> = dedup_by_title(matches)
        .into_iter()
        .map(|m| Suggestion { is_prefix_match: is_prefix_match(&m.title, query), title: m.title, score: m.score })
        .collect();
    out.sort_by(|a, b| {
        b.is_prefix_match
            .cmp(&a.is_prefix_match)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.title.cmp(&b.title))
    });
    out.truncate(limit);
    out
}

/// Case-insensitive literal substring match over `titles`, ordered prefix
/// matches first and then alphabetically.
pub fn fallback_suggestions(query: &str, titles: Vec<String>, limit: usize) -> Result<Vec<Suggestion>> {
    let needle = RegexBuilder::new(&regex::escape(query.trim())).case_insensitive(true).build()?;
    let matches = titles
        .into_iter()
        .filter(|t| needle.is_match(t))
        .map(|title| TitleMatch { title, score: FALLBACK_SCORE });
    let mut out: Vec<Suggestion> = dedup_by_title(matches)
        .into_iter()
        .map(|m| Suggestion { is_prefix_match: is_prefix_match(&m.title, query), title: m.title, score: m.score })
        .collect();
    out.sort_by(|a, b| {
        b.is_prefix_match
            .cmp(&a.is_prefix_match)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.title.cmp(&b.title))
    });
    out.truncate(limit);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(title: &str, score: f32) -> TitleMatch {
        TitleMatch { title: title.into(), score }
    }

    #[test]
    fn prefix_matches_rank_first_and_titles_dedup() {
        let got = rank_suggestions(
            "dev",
            vec![m("Senior Developer", 9.0), m("Developer", 3.0), m("Developer", 5.0), m("DevOps Engineer", 4.0)],
            10,
        );
        let titles: Vec<&str> = got.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Developer", "DevOps Engineer", "Senior Developer"]);
        assert_eq!(got[0].score, 5.0);
        assert!(got[0].is_prefix_match && got[1].is_prefix_match && !got[2].is_prefix_match);
    }

    #[test]
    fn limit_applies_after_dedup() {
        let got = rank_suggestions("a", vec![m("A", 1.0), m("A", 2.0), m("Ab", 1.5)], 1);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "A");
    }

    #[test]
    fn fallback_escapes_and_orders_alphabetically() {
        let titles = vec![
            "Senior C++ Developer".to_string(),
            "c++ engineer".to_string(),
            "C++ Architect".to_string(),
            "Cook".to_string(),
            "C++ Architect".to_string(),
        ];
        let got = fallback_suggestions("C++", titles, 10).unwrap();
        let titles: Vec<&str> = got.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["C++ Architect", "c++ engineer", "Senior C++ Developer"]);
        assert!(got.iter().all(|s| s.score == FALLBACK_SCORE));
        assert_eq!(got.iter().map(|s| s.is_prefix_match).collect::<Vec<_>>(), vec![true, true, false]);
    }
}
