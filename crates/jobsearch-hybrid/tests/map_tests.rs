mod common;

use std::sync::Arc;

use jobsearch_core::error::Error;
use jobsearch_core::geo::BoundingBox;
use jobsearch_core::params::{JobFilters, MapQuery};
use jobsearch_core::types::{Job, JobType, MapView};
use jobsearch_hybrid::{CompanyTable, JobSearchEngine};

use common::{at, companies, fixture, fixture_with, job, now, settings, CountingEmbedder, FailingTextIndex, MemoryStore};

const VIETNAM: BoundingBox = BoundingBox { min_lat: 8.0, min_lng: 102.0, max_lat: 24.0, max_lng: 110.0 };

fn map_query(zoom: f64) -> MapQuery {
    MapQuery { bbox: VIETNAM, zoom, filters: JobFilters::default() }
}

/// 40 jobs on a distinct-coordinate grid inside the viewport.
fn grid() -> Vec<Job> {
    (0..40)
        .map(|i| at(job(&format!("g{i:02}"), "Welder", i), 10.0 + (i / 8) as f64 * 2.5, 103.0 + (i % 8) as f64 * 0.8))
        .collect()
}

#[tokio::test]
async fn high_zoom_returns_capped_points_with_company() {
    let jobs: Vec<Job> = (0..60).map(|i| at(job(&format!("p{i:02}"), "Driver", i), 21.0, 105.8)).collect();
    let table = CompanyTable::new(companies(&jobs));
    let fx = fixture(jobs);
    let engine = fx.engine.with_companies(Arc::new(table));

    let MapView::Points(points) = engine.map_at(&map_query(14.0), now()).await.unwrap() else {
        panic!("expected points at high zoom");
    };
    assert_eq!(points.len(), settings().map.point_cap);
    assert_eq!(points[0].id, "p00", "newest first");
    assert_eq!(points[0].job_type, JobType::FullTime);
    assert_eq!(points[0].company.as_ref().unwrap().name, "Company p00");
}

#[tokio::test]
async fn points_outside_the_viewport_or_closed_are_excluded() {
    let mut closed = at(job("closed", "Driver", 1), 21.0, 105.8);
    closed.deadline = now() - chrono::Duration::days(1);
    let fx = fixture(vec![at(job("in", "Driver", 1), 21.0, 105.8), at(job("out", "Driver", 1), 35.0, 139.0), closed]);
    let points = fx.engine.map_points_at(&map_query(13.0), now()).await.unwrap();
    assert_eq!(points.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["in"]);
}

#[tokio::test]
async fn single_job_viewport_has_no_clusters() {
    let fx = fixture(vec![at(job("only", "Welder", 1), 16.0, 107.0)]);
    let clusters = fx.engine.map_clusters_at(&map_query(6.0), now()).await.unwrap();
    assert!(clusters.is_empty());
}

#[tokio::test]
async fn cluster_count_grows_with_zoom() {
    let fx = fixture(grid());
    let s = settings();
    assert!(s.map.bucket_count(3.0) <= s.map.bucket_count(9.0));

    let coarse = fx.engine.map_clusters_at(&map_query(3.0), now()).await.unwrap();
    let fine = fx.engine.map_clusters_at(&map_query(9.0), now()).await.unwrap();
    assert_eq!(coarse.len(), s.map.bucket_count(3.0));
    assert_eq!(fine.len(), s.map.bucket_count(9.0));
    assert_eq!(coarse.iter().map(|c| c.count).sum::<usize>(), 40);
    assert_eq!(fine.iter().map(|c| c.count).sum::<usize>(), 40);
    assert!(coarse.iter().all(|c| c.count > 1));
    // 20-member buckets list their ids; nothing here exceeds the cap.
    assert!(coarse.iter().all(|c| c.job_ids.as_ref().map(Vec::len) == Some(c.count)));
}

#[tokio::test]
async fn clusters_count_every_job_in_a_dense_viewport() {
    let template = job("t", "Picker", 1);
    let jobs: Vec<Job> = (0..25_000)
        .map(|i| {
            let mut j = template.clone();
            j.id = format!("w{i:05}");
            at(j, 9.0 + (i % 150) as f64 * 0.1, 102.5 + (i / 150) as f64 * 0.04)
        })
        .collect();
    let engine = JobSearchEngine::new(
        Arc::new(FailingTextIndex),
        Arc::new(MemoryStore::new(jobs)),
        Arc::new(CountingEmbedder::new()),
        settings(),
    );

    let clusters = engine.map_clusters_at(&map_query(3.0), now()).await.unwrap();
    assert_eq!(clusters.len(), settings().map.bucket_count(3.0));
    assert_eq!(clusters.iter().map(|c| c.count).sum::<usize>(), 25_000);
    assert!(clusters.iter().all(|c| c.job_ids.is_none()), "large buckets omit member ids");
}

#[tokio::test]
async fn clustering_failure_falls_back_to_raw_points() {
    let store = MemoryStore { fail_positions: true, ..MemoryStore::new(grid()) };
    let fx = fixture_with(store, CountingEmbedder::new());
    let clusters = fx.engine.map_clusters_at(&map_query(6.0), now()).await.unwrap();
    assert_eq!(clusters.len(), 40);
    assert!(clusters.iter().all(|c| c.count == 1 && c.job_ids.as_ref().map(Vec::len) == Some(1)));
}

#[tokio::test]
async fn double_failure_yields_an_empty_cluster_list() {
    let store = MemoryStore { fail_positions: true, fail_listing: true, ..MemoryStore::new(grid()) };
    let fx = fixture_with(store, CountingEmbedder::new());
    let view = fx.engine.map_at(&map_query(6.0), now()).await.unwrap();
    assert_eq!(view, MapView::Clusters(vec![]));
}

#[tokio::test]
async fn malformed_viewport_is_rejected() {
    let fx = fixture(grid());
    let inverted = MapQuery { bbox: BoundingBox { min_lat: 24.0, min_lng: 102.0, max_lat: 8.0, max_lng: 110.0 }, ..map_query(6.0) };
    assert!(matches!(fx.engine.map_at(&inverted, now()).await, Err(Error::InvalidInput(_))));
    let bad_zoom = map_query(f64::NAN);
    assert!(matches!(fx.engine.map_clusters_at(&bad_zoom, now()).await, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn map_filters_apply_to_clusters() {
    let mut jobs = grid();
    for j in jobs.iter_mut().take(10) {
        j.job_type = JobType::PartTime;
    }
    let fx = fixture(jobs);
    let q = MapQuery { filters: JobFilters { job_type: Some(JobType::PartTime), ..Default::default() }, ..map_query(3.0) };
    let clusters = fx.engine.map_clusters_at(&q, now()).await.unwrap();
    assert_eq!(clusters.iter().map(|c| c.count).sum::<usize>(), 10);
}
