//! Candidate ranking and best-stream selection.

use tracing::{debug, info};

use super::policy::{violated_guard, GuardRule, UpgradePolicy};
use crate::debrid::{AvailabilityFilter, DebridError};
use crate::provider::StreamCandidate;
use crate::quality::{
    should_exclude, NameFilters, ParsedQuality, QualityExclusion, Resolution, ScoreBreakdown,
    ScoringPolicy,
};
use crate::stream_cache::{CachedStreamRecord, NewCachedStream};

/// A candidate with its parsed quality and score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: StreamCandidate,
    pub quality: ParsedQuality,
    pub score: ScoreBreakdown,
}

impl ScoredCandidate {
    pub fn total(&self) -> i32 {
        self.score.total_score
    }

    /// Record payload for this candidate once its playable URL is known.
    pub fn to_new_stream(&self, url: String) -> NewCachedStream {
        NewCachedStream {
            url,
            hash: self.candidate.effective_hash().unwrap_or_default(),
            quality: self.quality.clone(),
            score: self.total(),
            indexer: self.candidate.source_tag.clone(),
        }
    }
}

/// What to do with an available stream given fresh candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeDecision {
    /// Replace the active stream.
    Apply(ScoredCandidate),
    /// Leave the stream but set the advisory upgrade flag.
    AdvisoryOnly(ScoredCandidate),
    /// A higher-scoring candidate exists but breaks a guard rule.
    Reject(GuardRule),
    NoImprovement,
}

/// Pick the winner from candidates ranked best first.
///
/// Without an incumbent any non-negative score wins. With one, the best
/// guard-compliant candidate wins only if it scores strictly higher; ties
/// keep the incumbent.
pub fn pick_best(
    ranked: Vec<ScoredCandidate>,
    incumbent: Option<&CachedStreamRecord>,
) -> Option<ScoredCandidate> {
    match incumbent {
        None => ranked.into_iter().next().filter(|c| c.total() >= 0),
        Some(inc) => {
            let inc_quality = inc.quality();
            ranked
                .into_iter()
                .find(|c| violated_guard(&inc_quality, &c.quality).is_none())
                .filter(|c| c.total() > inc.quality_score)
        }
    }
}

/// Decide whether fresh candidates should replace, flag, or leave an
/// available stream.
pub fn evaluate_upgrade(
    incumbent: &CachedStreamRecord,
    ranked: Vec<ScoredCandidate>,
    policy: &UpgradePolicy,
) -> UpgradeDecision {
    let inc_quality = incumbent.quality();
    let top_guard = ranked
        .first()
        .filter(|top| top.total() > incumbent.quality_score)
        .and_then(|top| violated_guard(&inc_quality, &top.quality));

    let Some(best) = pick_best(ranked, Some(incumbent)) else {
        return match top_guard {
            Some(guard) => UpgradeDecision::Reject(guard),
            None => UpgradeDecision::NoImprovement,
        };
    };

    let delta = best.total() - incumbent.quality_score;
    let growth_gb = best.quality.size_gb - incumbent.file_size_gb;

    if delta >= policy.min_upgrade_points {
        if growth_gb > policy.max_upgrade_size_gb {
            UpgradeDecision::AdvisoryOnly(best)
        } else {
            UpgradeDecision::Apply(best)
        }
    } else if delta > policy.advisory_upgrade_points {
        UpgradeDecision::AdvisoryOnly(best)
    } else {
        UpgradeDecision::NoImprovement
    }
}

/// First `n` ranked candidates.
pub fn top_n(ranked: &[ScoredCandidate], n: usize) -> &[ScoredCandidate] {
    &ranked[..n.min(ranked.len())]
}

/// Drop candidates below a resolution tier or a score floor.
pub fn filter_by_minimum(
    ranked: Vec<ScoredCandidate>,
    min_resolution: Resolution,
    min_score: i32,
) -> Vec<ScoredCandidate> {
    ranked
        .into_iter()
        .filter(|c| c.quality.resolution >= min_resolution && c.total() >= min_score)
        .collect()
}

/// Scores candidates and applies the selection policy.
#[derive(Debug, Clone, Default)]
pub struct StreamSelector {
    scoring: ScoringPolicy,
    exclusions: Vec<QualityExclusion>,
    name_filters: NameFilters,
}

impl StreamSelector {
    pub fn new(scoring: ScoringPolicy, exclusions: Vec<QualityExclusion>) -> Self {
        Self {
            scoring,
            exclusions,
            name_filters: NameFilters::default(),
        }
    }

    /// Also drop candidates whose name carries a blocked group or language tag.
    pub fn with_name_filters(mut self, name_filters: NameFilters) -> Self {
        self.name_filters = name_filters;
        self
    }

    pub fn scoring(&self) -> &ScoringPolicy {
        &self.scoring
    }

    pub fn score(&self, candidate: StreamCandidate) -> ScoredCandidate {
        let quality = candidate.parsed_quality();
        let score = self.scoring.score(&quality);
        ScoredCandidate {
            candidate,
            quality,
            score,
        }
    }

    /// Score candidates, drop excluded quality types and blocked names, and
    /// sort best first. Ties keep provider order.
    pub fn rank(&self, candidates: Vec<StreamCandidate>) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|c| match self.name_filters.find_match(&c.title) {
                Some(blocked) => {
                    debug!(
                        title = %c.title,
                        filter = blocked.kind(),
                        token = blocked.token(),
                        "Candidate filtered by name"
                    );
                    false
                }
                None => true,
            })
            .map(|c| self.score(c))
            .filter(|s| {
                match should_exclude(&s.candidate.title, &s.quality, &self.exclusions) {
                    Some(reason) => {
                        debug!(
                            title = %s.candidate.title,
                            reason = reason.as_str(),
                            "Candidate excluded"
                        );
                        false
                    }
                    None => true,
                }
            })
            .collect();
        scored.sort_by(|a, b| b.total().cmp(&a.total()));
        scored
    }

    /// Pick the winner among candidates already known to be cached.
    pub fn select_best(
        &self,
        cached: Vec<StreamCandidate>,
        incumbent: Option<&CachedStreamRecord>,
    ) -> Option<ScoredCandidate> {
        let ranked = self.rank(cached);
        if let (Some(inc), Some(top)) = (incumbent, ranked.first()) {
            if let Some(guard) = violated_guard(&inc.quality(), &top.quality) {
                if top.total() > inc.quality_score {
                    info!(
                        key = %inc.key,
                        guard = guard.as_str(),
                        incumbent_score = inc.quality_score,
                        candidate_score = top.total(),
                        "Top candidate blocked by guard rule"
                    );
                }
            }
        }
        pick_best(ranked, incumbent)
    }

    /// Filter candidates through the debrid cache, then pick the winner.
    pub async fn select_best_cached(
        &self,
        filter: &AvailabilityFilter,
        candidates: Vec<StreamCandidate>,
        incumbent: Option<&CachedStreamRecord>,
        allow_url_only: bool,
    ) -> Result<Option<ScoredCandidate>, DebridError> {
        let cached = filter.filter_to_cached(candidates, allow_url_only).await?;
        Ok(self.select_best(cached, incumbent))
    }

    /// Best candidate within each resolution tier, best tier first.
    pub fn select_best_per_resolution(&self, cached: Vec<StreamCandidate>) -> Vec<ScoredCandidate> {
        let ranked = self.rank(cached);
        Resolution::TIERS
            .iter()
            .filter_map(|tier| ranked.iter().find(|c| c.quality.resolution == *tier).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{HdrType, VideoSource};
    use crate::stream_cache::ContentKey;
    use crate::testing::fixtures;

    fn hash(n: u32) -> String {
        format!("{:040x}", n)
    }

    fn selector() -> StreamSelector {
        StreamSelector::default()
    }

    fn ranked(titles: &[&str]) -> Vec<ScoredCandidate> {
        selector().rank(
            titles
                .iter()
                .enumerate()
                .map(|(i, t)| fixtures::candidate(t, &hash(i as u32)))
                .collect(),
        )
    }

    #[test]
    fn test_rank_sorts_descending_and_is_stable() {
        let r = ranked(&[
            "A.720p.WEB-DL",
            "B.1080p.WEB-DL",
            "C.2160p.WEB-DL",
            "D.1080p.WEB-DL",
        ]);
        let titles: Vec<&str> = r.iter().map(|c| c.candidate.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["C.2160p.WEB-DL", "B.1080p.WEB-DL", "D.1080p.WEB-DL", "A.720p.WEB-DL"]
        );
    }

    #[test]
    fn test_rank_applies_exclusions() {
        let s = StreamSelector::new(ScoringPolicy::default(), vec![QualityExclusion::Cam]);
        let r = s.rank(vec![
            fixtures::candidate("New.Movie.HDCAM", &hash(1)),
            fixtures::candidate("New.Movie.720p.WEB-DL", &hash(2)),
        ]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].candidate.title, "New.Movie.720p.WEB-DL");
    }

    #[test]
    fn test_rank_applies_name_filters() {
        let s = StreamSelector::new(ScoringPolicy::default(), vec![]).with_name_filters(
            NameFilters::new(&["yts".to_string()], &["GERMAN".to_string()]),
        );
        let r = s.rank(vec![
            fixtures::candidate("New.Movie.2160p.WEB-DL-YTS", &hash(1)),
            fixtures::candidate("New.Movie.German.2160p.BluRay", &hash(2)),
            fixtures::candidate("New.Movie.720p.WEB-DL-FLUX", &hash(3)),
        ]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].candidate.title, "New.Movie.720p.WEB-DL-FLUX");

        let best = s.select_best(
            vec![
                fixtures::candidate("New.Movie.2160p.WEB-DL-YTS", &hash(1)),
                fixtures::candidate("New.Movie.1080p.WEB-DL", &hash(4)),
            ],
            None,
        );
        assert_eq!(best.unwrap().candidate.title, "New.Movie.1080p.WEB-DL");
    }

    #[test]
    fn test_no_incumbent_accepts_top() {
        let best = pick_best(ranked(&["A.480p", "B.720p.WEB-DL"]), None).unwrap();
        assert_eq!(best.candidate.title, "B.720p.WEB-DL");
        assert!(pick_best(Vec::new(), None).is_none());
    }

    #[test]
    fn test_no_incumbent_rejects_negative_score() {
        let policy = ScoringPolicy {
            size_penalty_max: 20,
            ..Default::default()
        };
        let s = StreamSelector::new(policy, vec![]);
        let mut c = fixtures::candidate("Movie.CAM", &hash(1));
        c.size_bytes = 200 * 1024 * 1024 * 1024;
        let r = s.rank(vec![c]);
        assert!(r[0].total() < 0);
        assert!(pick_best(r, None).is_none());
    }

    #[test]
    fn test_tie_keeps_incumbent() {
        let inc = fixtures::record(ContentKey::movie(1), "Old.1080p.WEB-DL", &hash(99));
        let r = ranked(&["New.1080p.WEB-DL"]);
        assert_eq!(r[0].total(), inc.quality_score);
        assert!(pick_best(r, Some(&inc)).is_none());
    }

    #[test]
    fn test_strict_improvement_replaces() {
        let mut inc = fixtures::record(ContentKey::movie(1), "Old.1080p.WEB-DL", &hash(99));
        let r = ranked(&["New.1080p.WEB-DL"]);
        inc.quality_score = r[0].total() - 1;
        let best = pick_best(r, Some(&inc)).unwrap();
        assert_eq!(best.candidate.title, "New.1080p.WEB-DL");
    }

    #[test]
    fn test_guard_blocks_4k_downgrade_regardless_of_score() {
        let mut inc = fixtures::record(ContentKey::movie(1), "Old.2160p.WEB-DL", &hash(99));
        inc.quality_score = 0;
        let r = ranked(&["New.1080p.BluRay.REMUX.Atmos"]);
        assert!(pick_best(r, Some(&inc)).is_none());
    }

    #[test]
    fn test_guard_picks_best_compliant_candidate() {
        let inc = fixtures::record(ContentKey::movie(1), "Old.2160p.WEB-DL", &hash(99));
        let r = ranked(&[
            "A.1080p.BluRay.REMUX.DV.HDR.Atmos",
            "B.2160p.BluRay",
            "C.2160p.WEB-DL",
        ]);
        assert_eq!(r[0].candidate.title, "A.1080p.BluRay.REMUX.DV.HDR.Atmos");
        let best = pick_best(r, Some(&inc)).unwrap();
        assert_eq!(best.candidate.title, "B.2160p.BluRay");
    }

    #[test]
    fn test_remux_and_dv_guards() {
        let remux = fixtures::record(ContentKey::movie(1), "Old.1080p.BluRay.REMUX", &hash(98));
        assert!(pick_best(ranked(&["New.2160p.WEB-DL"]), Some(&remux)).is_none());

        let dv = fixtures::record(ContentKey::movie(2), "Old.2160p.WEB-DL.DV", &hash(97));
        assert_eq!(dv.hdr_type, HdrType::DolbyVision);
        assert!(pick_best(ranked(&["New.2160p.BluRay.HDR10.Atmos"]), Some(&dv)).is_none());
    }

    fn upgrade(inc_title: &str, cand_title: &str) -> UpgradeDecision {
        let inc = fixtures::record(ContentKey::movie(1), inc_title, &hash(99));
        evaluate_upgrade(&inc, ranked(&[cand_title]), &UpgradePolicy::default())
    }

    #[test]
    fn test_upgrade_applied_above_minimum() {
        // 100 -> 125
        match upgrade("Old.1080p.WEB-DL", "New.2160p.WEB-DL") {
            UpgradeDecision::Apply(c) => assert_eq!(c.total(), 125),
            other => panic!("expected Apply, got {:?}", other),
        }
    }

    #[test]
    fn test_small_gain_is_advisory() {
        // 100 -> 114 (HDR): above advisory threshold, below minimum
        assert!(matches!(
            upgrade("Old.1080p.WEB-DL", "New.1080p.WEB-DL.HDR"),
            UpgradeDecision::AdvisoryOnly(_)
        ));
    }

    #[test]
    fn test_tiny_gain_is_no_improvement() {
        // 100 -> 105
        assert_eq!(
            upgrade("Old.1080p.WEB-DL", "New.1080p.BluRay"),
            UpgradeDecision::NoImprovement
        );
        assert_eq!(
            upgrade("Old.1080p.WEB-DL", "New.720p.WEB-DL"),
            UpgradeDecision::NoImprovement
        );
    }

    #[test]
    fn test_oversized_upgrade_is_advisory() {
        let inc = fixtures::record(ContentKey::movie(1), "Old.1080p.WEB-DL", &hash(99));
        let mut big = fixtures::candidate("New.2160p.BluRay.REMUX", &hash(1));
        big.size_bytes = 45 * 1024 * 1024 * 1024;
        let decision =
            evaluate_upgrade(&inc, selector().rank(vec![big]), &UpgradePolicy::default());
        assert!(matches!(decision, UpgradeDecision::AdvisoryOnly(_)));
    }

    #[test]
    fn test_guard_violation_rejects_without_flag() {
        let mut inc = fixtures::record(ContentKey::movie(1), "Old.2160p.WEB-DL", &hash(99));
        inc.quality_score = 100;
        let decision = evaluate_upgrade(
            &inc,
            ranked(&["New.1080p.BluRay.REMUX.DV.HDR.Atmos"]),
            &UpgradePolicy::default(),
        );
        assert_eq!(decision, UpgradeDecision::Reject(GuardRule::Keep4k));
    }

    #[test]
    fn test_select_best_per_resolution() {
        let best = selector().select_best_per_resolution(vec![
            fixtures::candidate("A.1080p.WEB-DL", &hash(1)),
            fixtures::candidate("B.2160p.WEB-DL", &hash(2)),
            fixtures::candidate("C.1080p.BluRay.REMUX", &hash(3)),
            fixtures::candidate("D.720p.HDTV", &hash(4)),
        ]);
        let titles: Vec<&str> = best.iter().map(|c| c.candidate.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["B.2160p.WEB-DL", "C.1080p.BluRay.REMUX", "D.720p.HDTV"]
        );
    }

    #[test]
    fn test_top_n_and_minimum_filter() {
        let r = ranked(&["A.2160p.WEB-DL", "B.1080p.WEB-DL", "C.720p.WEB-DL", "D.480p"]);
        assert_eq!(top_n(&r, 2).len(), 2);
        assert_eq!(top_n(&r, 10).len(), 4);

        let filtered = filter_by_minimum(r, Resolution::R1080p, 0);
        assert_eq!(filtered.len(), 2);
        assert!(filtered
            .iter()
            .all(|c| c.quality.resolution >= Resolution::R1080p));
    }

    #[test]
    fn test_to_new_stream() {
        let r = ranked(&["A.2160p.BluRay.REMUX"]);
        let stream = r[0].to_new_stream("https://dl.example/a".to_string());
        assert_eq!(stream.hash, hash(0));
        assert_eq!(stream.score, 140);
        assert_eq!(stream.quality.source, VideoSource::Remux);
        assert_eq!(stream.indexer, "mock");
    }
}
