//! Reciprocal rank fusion over the text and vector branches.
use std::cmp::Ordering;
use std::collections::HashMap;

use jobsearch_core::params::BranchWeights;
use jobsearch_core::types::{FusedResult, JobId, RankedCandidate, SearchHit, SourceKind};

/// Orders one branch's hits by score descending and assigns 1-based ranks.
/// The sort is stable, so equal scores keep retrieval order.
pub fn rank_hits(mut hits: Vec<SearchHit>, branch: SourceKind) -> Vec<RankedCandidate> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.into_iter()
        .enumerate()
        .map(|(i, hit)| RankedCandidate { job_id: hit.id, branch, score: hit.score, rank: i + 1 })
        .collect()
}

#[derive(Default)]
struct Accumulator {
    rrf: f64,
    text: Option<f32>,
    vector: Option<f32>,
}

fn keep_max(slot: &mut Option<f32>, score: f32) {
    *slot = Some(slot.map_or(score, |s| s.max(score)));
}

fn score_desc(a: Option<f32>, b: Option<f32>) -> Ordering {
    let a = a.unwrap_or(f32::NEG_INFINITY);
    let b = b.unwrap_or(f32::NEG_INFINITY);
    b.total_cmp(&a)
}

/// `rrf(job) = Σ weight_b / (k + rank_b(job))` over the branches containing
/// the job, in a total order: rrf desc, vector score desc, text score desc,
/// job id asc.
pub fn fuse(text: &[RankedCandidate], vector: &[RankedCandidate], k: f64, weights: BranchWeights) -> Vec<FusedResult> {
    let mut acc: HashMap<&JobId, Accumulator> = HashMap::new();
    for c in text.iter().chain(vector) {
        let entry = acc.entry(&c.job_id).or_default();
        let weight = match c.branch {
            SourceKind::Text => weights.text,
            SourceKind::Vector => weights.vector,
        };
        entry.rrf += weight / (k + c.rank as f64);
        match c.branch {
            SourceKind::Text => keep_max(&mut entry.text, c.score),
            SourceKind::Vector => keep_max(&mut entry.vector, c.score),
        }
    }

    let mut fused: Vec<FusedResult> = acc
        .into_iter()
        .map(|(id, a)| FusedResult { job_id: id.clone(), rrf_score: a.rrf, text_score: a.text, vector_score: a.vector, rank: 0 })
        .collect();
    fused.sort_by(|a, b| {
        b.rrf_score
            .total_cmp(&a.rrf_score)
            .then_with(|| score_desc(a.vector_score, b.vector_score))
            .then_with(|| score_desc(a.text_score, b.text_score))
            .then_with(|| a.job_id.cmp(&b.job_id))
    });
    for (i, r) in fused.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(ids: &[(&str, f32)], source: SourceKind) -> Vec<SearchHit> {
        ids.iter().map(|(id, s)| SearchHit { id: id.to_string(), score: *s, source, location: None }).collect()
    }

    fn order(fused: &[FusedResult]) -> Vec<&str> {
        fused.iter().map(|r| r.job_id.as_str()).collect()
    }

    const W: BranchWeights = BranchWeights { text: 0.4, vector: 0.6 };

    #[test]
    fn vector_rank_one_overtakes() {
        let text = rank_hits(hits(&[("A", 9.0), ("B", 5.0), ("C", 1.0)], SourceKind::Text), SourceKind::Text);
        let vector = rank_hits(hits(&[("B", 0.9), ("A", 0.8), ("D", 0.7)], SourceKind::Vector), SourceKind::Vector);
        let fused = fuse(&text, &vector, 60.0, W);
        assert_eq!(order(&fused), vec!["B", "A", "D", "C"]);

        let a = &fused[1];
        assert!((a.rrf_score - (0.4 / 61.0 + 0.6 / 62.0)).abs() < 1e-12);
        assert!((fused[2].rrf_score - 0.6 / 63.0).abs() < 1e-12);
        assert!((fused[3].rrf_score - 0.4 / 63.0).abs() < 1e-12);
        assert_eq!(a.text_score, Some(9.0));
        assert_eq!(a.vector_score, Some(0.8));
        assert_eq!(fused[3].vector_score, None);
        assert_eq!(fused.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn ranks_follow_score_with_stable_ties() {
        let ranked = rank_hits(hits(&[("x", 1.0), ("y", 3.0), ("z", 1.0)], SourceKind::Text), SourceKind::Text);
        let got: Vec<(&str, usize)> = ranked.iter().map(|c| (c.job_id.as_str(), c.rank)).collect();
        assert_eq!(got, vec![("y", 1), ("x", 2), ("z", 3)]);
    }

    #[test]
    fn ties_break_on_vector_then_text_then_id() {
        // Same rank in the same single branch cannot happen, so build the
        // candidates directly.
        let c = |id: &str, branch, score, rank| RankedCandidate { job_id: id.into(), branch, score, rank };
        let text = vec![c("t1", SourceKind::Text, 2.0, 1), c("t2", SourceKind::Text, 5.0, 1)];
        let vector = vec![c("v2", SourceKind::Vector, 0.5, 1), c("v1", SourceKind::Vector, 0.9, 1)];
        let fused = fuse(&text, &vector, 60.0, BranchWeights { text: 1.0, vector: 1.0 });
        assert_eq!(order(&fused), vec!["v1", "v2", "t2", "t1"]);

        let same = vec![c("b", SourceKind::Text, 1.0, 1), c("a", SourceKind::Text, 1.0, 1)];
        assert_eq!(order(&fuse(&same, &[], 60.0, W)), vec!["a", "b"]);
    }

    #[test]
    fn zero_weight_branch_still_contributes_members() {
        let text = rank_hits(hits(&[("A", 1.0)], SourceKind::Text), SourceKind::Text);
        let vector = rank_hits(hits(&[("B", 0.5)], SourceKind::Vector), SourceKind::Vector);
        let fused = fuse(&text, &vector, 60.0, BranchWeights { text: 0.0, vector: 1.0 });
        assert_eq!(order(&fused), vec!["B", "A"]);
        assert_eq!(fused[1].rrf_score, 0.0);
    }

    #[test]
    fn fusion_is_deterministic() {
        let text = rank_hits(hits(&[("a", 1.0), ("b", 1.0), ("c", 1.0)], SourceKind::Text), SourceKind::Text);
        let vector = rank_hits(hits(&[("c", 0.1), ("b", 0.1), ("a", 0.1)], SourceKind::Vector), SourceKind::Vector);
        let first = fuse(&text, &vector, 60.0, W);
        for _ in 0..20 {
            assert_eq!(fuse(&text, &vector, 60.0, W), first);
        }
    }
}
