mod common;

use tempfile::TempDir;

use common::{job, now};
use jobsearch_core::filter::{FilterBuilder, JobFilter};
use jobsearch_core::geo::{GeoPoint, GeoRadius};
use jobsearch_core::traits::TextIndex;
use jobsearch_core::types::SourceKind;
use jobsearch_text::JobTextIndex;

fn open_filter() -> jobsearch_core::filter::SearchIndexFilter {
    FilterBuilder::new(now()).open_jobs().build().search_index_filter(20.0, 1.0)
}

#[test]
fn index_on_disk_and_reopen() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("tantivy");
    {
        let index = JobTextIndex::create(&dir, true).expect("create");
        let n = index.index_jobs(&[job("1", "Rust Engineer"), job("2", "Accountant")]).expect("index");
        assert_eq!(n, 2);
    }
    let index = JobTextIndex::open(&dir).expect("open");
    assert_eq!(index.num_docs(), 2);
    let hits = index.search("rust", &open_filter(), 10).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "1");
    assert_eq!(hits[0].source, SourceKind::Text);
    assert_eq!(hits[0].location, Some(GeoPoint::new(21.03, 105.84)));
}

#[test]
fn upsert_replaces_by_id() {
    let index = JobTextIndex::in_ram().unwrap();
    index.index_jobs(&[job("1", "Rust Engineer")]).unwrap();
    index.index_jobs(&[job("1", "Marketing Manager")]).unwrap();
    assert_eq!(index.num_docs(), 1);
    assert!(index.search("rust", &open_filter(), 10).unwrap().is_empty());
    assert_eq!(index.search("marketing", &open_filter(), 10).unwrap().len(), 1);
}

#[test]
fn title_typo_still_matches() {
    let index = JobTextIndex::in_ram().unwrap();
    index.index_jobs(&[job("1", "Software Engineer"), job("2", "Sales Manager")]).unwrap();

    for q in ["enginer", "engineers", "enigneer", "ENGINEER"] {
        let hits = index.search(q, &open_filter(), 10).unwrap();
        assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["1"], "query {q}");
    }
    assert!(index.search("ngineer", &open_filter(), 10).unwrap().is_empty(), "prefix must be shared");
}

#[test]
fn title_match_is_required() {
    let index = JobTextIndex::in_ram().unwrap();
    let mut body_only = job("1", "Accountant");
    body_only.description = "We use Rust for reporting".into();
    index.index_jobs(&[body_only, job("2", "Rust Developer")]).unwrap();

    let hits = index.search("rust", &open_filter(), 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "2");
}

#[test]
fn body_match_adds_score() {
    let index = JobTextIndex::in_ram().unwrap();
    let mut with_body = job("1", "Rust Developer");
    with_body.requirements = "Rust async experience".into();
    index.index_jobs(&[job("2", "Rust Developer"), with_body]).unwrap();

    let hits = index.search("rust", &open_filter(), 10).unwrap();
    assert_eq!(hits[0].id, "1");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn proximity_boost_prefers_nearby_jobs() {
    let index = JobTextIndex::in_ram().unwrap();
    let mut far = job("far", "Nurse");
    far.location.point = Some(GeoPoint::new(10.82, 106.63));
    let mut near = job("near", "Nurse");
    near.location.point = Some(GeoPoint::new(21.03, 105.84));
    index.index_jobs(&[far, near]).unwrap();

    let filter = FilterBuilder::new(now())
        .open_jobs()
        .radius(Some(GeoRadius { center: GeoPoint::new(21.0, 105.8), radius_km: 5000.0 }))
        .build()
        .search_index_filter(20.0, 1.0);
    let hits = index.search("nurse", &filter, 10).unwrap();
    assert_eq!(hits[0].id, "near");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn suggest_titles_uses_prefix_and_filters_moderation() {
    let index = JobTextIndex::in_ram().unwrap();
    let mut pending = job("3", "Software Tester");
    pending.moderation = jobsearch_core::types::ModerationStatus::Pending;
    index
        .index_jobs(&[job("1", "Software Engineer"), job("2", "Software Engineer"), pending, job("4", "Sales Lead")])
        .unwrap();

    let filter = JobFilter::for_autocomplete().pre_filter();
    let titles = index.suggest_titles("softw", &filter, 10).unwrap();
    assert_eq!(titles.len(), 2);
    assert!(titles.iter().all(|t| t.title == "Software Engineer"));

    let titles = index.suggest_titles("sofware eng", &filter, 10).unwrap();
    assert_eq!(titles.len(), 2, "typo in a completed word is tolerated");

    let titles = index.suggest_titles("sales lex", &filter, 10).unwrap();
    assert_eq!(titles.len(), 1, "fuzzy prefix on the last word");
    assert!(index.suggest_titles("   ", &filter, 10).unwrap().is_empty());
}
