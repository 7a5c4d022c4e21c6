//! Equal-population bucketing of job positions.
//!
//! Points are ordered along a Z-order curve over coordinates quantized to the
//! extent of the input, then split into `buckets` runs of roughly equal size.
//! Points sharing a curve key always land in the same bucket. Geohash prefix
//! grouping was the other candidate; it produces fixed cells instead of
//! population-balanced ones.
use std::ops::Range;

use jobsearch_core::geo::GeoPoint;
use jobsearch_core::types::{JobPosition, MapCluster};

const QUANT_MAX: f64 = u16::MAX as f64;

fn quantize(v: f64, lo: f64, hi: f64) -> u16 {
    if hi > lo {
        (((v - lo) / (hi - lo)) * QUANT_MAX).round().clamp(0.0, QUANT_MAX) as u16
    } else {
        0
    }
}

/// Spreads the 16 bits of `v` over the even bit positions of a u32.
fn spread(v: u16) -> u32 {
    let mut x = u32::from(v);
    x = (x | (x << 8)) & 0x00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

pub fn morton_key(lat: u16, lng: u16) -> u32 {
    (spread(lat) << 1) | spread(lng)
}

/// Splits `keys` (sorted) into at most `buckets` contiguous runs, never
/// separating equal keys.
fn bucket_ranges(keys: &[u32], buckets: usize) -> Vec<Range<usize>> {
    let n = keys.len();
    let mut ranges = Vec::with_capacity(buckets);
    let mut start = 0;
    for i in 1..=buckets {
        if start >= n {
            break;
        }
        let mut end = if i == buckets { n } else { i * n / buckets };
        if end <= start {
            continue;
        }
        while end < n && keys[end] == keys[end - 1] {
            end += 1;
        }
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Multi-member clusters over `positions`. Member ids are listed only for
/// clusters of at most `member_id_cap` jobs.
pub fn bucket_auto(positions: &[JobPosition], buckets: usize, member_id_cap: usize) -> Vec<MapCluster> {
    if positions.is_empty() || buckets == 0 {
        return Vec::new();
    }
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in positions {
        min_lat = min_lat.min(p.point.lat);
        max_lat = max_lat.max(p.point.lat);
        min_lng = min_lng.min(p.point.lng);
        max_lng = max_lng.max(p.point.lng);
    }

    let mut keyed: Vec<(u32, &JobPosition)> = positions
        .iter()
        .map(|p| {
            let key = morton_key(quantize(p.point.lat, min_lat, max_lat), quantize(p.point.lng, min_lng, max_lng));
            (key, p)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
    let keys: Vec<u32> = keyed.iter().map(|(k, _)| *k).collect();

    bucket_ranges(&keys, buckets)
        .into_iter()
        .filter(|r| r.len() > 1)
        .map(|r| {
            let members = &keyed[r];
            let count = members.len();
            let lat = members.iter().map(|(_, p)| p.point.lat).sum::<f64>() / count as f64;
            let lng = members.iter().map(|(_, p)| p.point.lng).sum::<f64>() / count as f64;
            let job_ids = (count <= member_id_cap).then(|| members.iter().map(|(_, p)| p.id.clone()).collect());
            MapCluster { centroid: GeoPoint::new(lat, lng), count, job_ids }
        })
        .collect()
}

/// Degenerate one-member clusters, used when bucketing is unavailable.
pub fn singleton_clusters(positions: impl IntoIterator<Item = JobPosition>) -> Vec<MapCluster> {
    positions
        .into_iter()
        .map(|p| MapCluster { centroid: p.point, count: 1, job_ids: Some(vec![p.id]) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(id: &str, lat: f64, lng: f64) -> JobPosition {
        JobPosition { id: id.into(), point: GeoPoint::new(lat, lng) }
    }

    #[test]
    fn morton_interleaves_bits() {
        assert_eq!(morton_key(0, 0), 0);
        assert_eq!(morton_key(0, 1), 1);
        assert_eq!(morton_key(1, 0), 2);
        assert_eq!(morton_key(u16::MAX, u16::MAX), u32::MAX);
    }

    #[test]
    fn ranges_are_balanced_and_keep_equal_keys_together() {
        assert_eq!(bucket_ranges(&[1, 2, 3, 4, 5, 6], 3), vec![0..2, 2..4, 4..6]);
        assert_eq!(bucket_ranges(&[1, 1, 1, 2, 3, 4], 3), vec![0..3, 3..4, 4..6]);
        assert_eq!(bucket_ranges(&[7, 7, 7, 7], 4), vec![0..4]);
        assert_eq!(bucket_ranges(&[1, 2], 8), vec![0..1, 1..2]);
    }

    #[test]
    fn two_distant_groups_become_two_clusters() {
        let positions = vec![
            pos("h1", 21.03, 105.84),
            pos("h2", 21.04, 105.85),
            pos("h3", 21.02, 105.83),
            pos("s1", 10.77, 106.70),
            pos("s2", 10.78, 106.69),
            pos("s3", 10.76, 106.71),
        ];
        let clusters = bucket_auto(&positions, 2, 20);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.count == 3));
        let mut groups: Vec<Vec<String>> = clusters.iter().map(|c| c.job_ids.clone().unwrap()).collect();
        for g in &mut groups {
            g.sort();
        }
        groups.sort();
        assert_eq!(groups, vec![vec!["h1", "h2", "h3"], vec!["s1", "s2", "s3"]]);
        let hanoi = clusters.iter().find(|c| c.centroid.lat > 20.0).unwrap();
        assert!((hanoi.centroid.lat - 21.03).abs() < 1e-9);
        assert!((hanoi.centroid.lng - 105.84).abs() < 1e-9);
    }

    #[test]
    fn singletons_are_dropped() {
        assert!(bucket_auto(&[pos("only", 21.0, 105.0)], 4, 20).is_empty());
        let clusters = bucket_auto(&[pos("a", 0.0, 0.0), pos("b", 0.0, 0.0), pos("c", 50.0, 50.0)], 2, 20);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 2);
    }

    #[test]
    fn large_clusters_omit_member_ids() {
        let positions: Vec<JobPosition> = (0..30).map(|i| pos(&format!("j{i:02}"), 21.0, 105.0)).collect();
        let clusters = bucket_auto(&positions, 2, 20);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 30);
        assert_eq!(clusters[0].job_ids, None);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let mut positions: Vec<JobPosition> =
            (0..40).map(|i| pos(&format!("j{i}"), (i % 7) as f64, (i % 5) as f64 * 3.0)).collect();
        let first = bucket_auto(&positions, 6, 20);
        positions.reverse();
        assert_eq!(bucket_auto(&positions, 6, 20), first);
    }
}
