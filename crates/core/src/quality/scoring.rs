//! Weighted-sum quality scoring.
//!
//! Resolution dominates, then source, HDR, audio and a small seeders bonus.
//! Oversized files above a soft threshold pay a bounded penalty.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::types::{HdrType, ParsedQuality, Resolution, ScoreBreakdown, VideoSource};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolutionWeights {
    pub r2160p: i32,
    pub r1080p: i32,
    pub r720p: i32,
    pub r480p: i32,
    pub unknown: i32,
}

impl Default for ResolutionWeights {
    fn default() -> Self {
        Self {
            r2160p: 100,
            r1080p: 75,
            r720p: 50,
            r480p: 25,
            unknown: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceWeights {
    pub remux: i32,
    pub bluray: i32,
    pub web_dl: i32,
    pub web_rip: i32,
    pub hdtv: i32,
    pub dvd_rip: i32,
    pub unknown: i32,
    pub screener: i32,
    pub telecine: i32,
    pub telesync: i32,
    pub cam: i32,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            remux: 40,
            bluray: 30,
            web_dl: 25,
            web_rip: 20,
            hdtv: 12,
            dvd_rip: 8,
            unknown: 5,
            screener: 3,
            telecine: 2,
            telesync: 1,
            cam: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HdrWeights {
    pub dv_hdr: i32,
    pub dv: i32,
    pub hdr10_plus: i32,
    pub hdr10: i32,
    pub hdr: i32,
    pub none: i32,
}

impl Default for HdrWeights {
    fn default() -> Self {
        Self {
            dv_hdr: 25,
            dv: 22,
            hdr10_plus: 20,
            hdr10: 16,
            hdr: 14,
            none: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioWeights {
    pub atmos: i32,
    pub truehd: i32,
    pub dts_hd: i32,
    pub dts: i32,
    pub dd_plus: i32,
    pub dd: i32,
    pub aac: i32,
    pub flac: i32,
    pub other: i32,
}

impl Default for AudioWeights {
    fn default() -> Self {
        Self {
            atmos: 15,
            truehd: 13,
            dts_hd: 12,
            dts: 9,
            dd_plus: 8,
            dd: 6,
            aac: 3,
            flac: 3,
            other: 0,
        }
    }
}

/// Tunable scoring policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringPolicy {
    pub resolution: ResolutionWeights,
    pub source: SourceWeights,
    pub hdr: HdrWeights,
    pub audio: AudioWeights,
    /// Seeders needed per bonus point.
    pub seeders_per_point: u32,
    /// Cap on the seeders bonus.
    pub seeders_max_bonus: i32,
    /// Sizes up to this many GB carry no penalty.
    pub size_soft_limit_gb: f64,
    /// Every started step of this many GB above the soft limit costs one point.
    pub size_penalty_step_gb: f64,
    /// Upper bound on the size penalty.
    pub size_penalty_max: i32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            resolution: ResolutionWeights::default(),
            source: SourceWeights::default(),
            hdr: HdrWeights::default(),
            audio: AudioWeights::default(),
            seeders_per_point: 10,
            seeders_max_bonus: 10,
            size_soft_limit_gb: 40.0,
            size_penalty_step_gb: 5.0,
            size_penalty_max: 20,
        }
    }
}

static DEFAULT_POLICY: Lazy<ScoringPolicy> = Lazy::new(ScoringPolicy::default);

/// Score with the default policy table.
pub fn score_quality(quality: &ParsedQuality) -> ScoreBreakdown {
    DEFAULT_POLICY.score(quality)
}

impl ScoringPolicy {
    /// Score a parsed quality. Pure and deterministic.
    pub fn score(&self, quality: &ParsedQuality) -> ScoreBreakdown {
        let resolution_score = self.resolution_score(quality.resolution);
        let hdr_score = self.hdr_score(quality.hdr_type);
        let audio_score = self.audio_score(&quality.audio_format);
        let source_score = self.source_score(quality.source);
        let seeders_score = self.seeders_score(quality.seeders);
        let size_penalty = self.size_penalty(quality.size_gb);

        ScoreBreakdown {
            resolution_score,
            hdr_score,
            audio_score,
            source_score,
            seeders_score,
            size_penalty,
            total_score: resolution_score + hdr_score + audio_score + source_score + seeders_score
                - size_penalty,
        }
    }

    pub fn resolution_score(&self, resolution: Resolution) -> i32 {
        let w = &self.resolution;
        match resolution {
            Resolution::R2160p => w.r2160p,
            Resolution::R1080p => w.r1080p,
            Resolution::R720p => w.r720p,
            Resolution::R480p => w.r480p,
            Resolution::Unknown => w.unknown,
        }
    }

    pub fn source_score(&self, source: VideoSource) -> i32 {
        let w = &self.source;
        match source {
            VideoSource::Remux => w.remux,
            VideoSource::BluRay => w.bluray,
            VideoSource::WebDl => w.web_dl,
            VideoSource::WebRip => w.web_rip,
            VideoSource::Hdtv => w.hdtv,
            VideoSource::DvdRip => w.dvd_rip,
            VideoSource::Unknown => w.unknown,
            VideoSource::Screener => w.screener,
            VideoSource::Telecine => w.telecine,
            VideoSource::Telesync => w.telesync,
            VideoSource::Cam => w.cam,
        }
    }

    pub fn hdr_score(&self, hdr: HdrType) -> i32 {
        let w = &self.hdr;
        match hdr {
            HdrType::DolbyVisionHdr => w.dv_hdr,
            HdrType::DolbyVision => w.dv,
            HdrType::Hdr10Plus => w.hdr10_plus,
            HdrType::Hdr10 => w.hdr10,
            HdrType::Hdr => w.hdr,
            HdrType::None => w.none,
        }
    }

    pub fn audio_score(&self, audio: &str) -> i32 {
        let w = &self.audio;
        match audio.trim().to_ascii_uppercase().as_str() {
            "ATMOS" => w.atmos,
            "TRUEHD" => w.truehd,
            "DTS-HD" | "DTS-X" => w.dts_hd,
            "DTS" => w.dts,
            "DD+" => w.dd_plus,
            "DD" => w.dd,
            "AAC" => w.aac,
            "FLAC" => w.flac,
            _ => w.other,
        }
    }

    pub fn seeders_score(&self, seeders: u32) -> i32 {
        if self.seeders_per_point == 0 {
            return 0;
        }
        let points = (seeders / self.seeders_per_point).min(i32::MAX as u32) as i32;
        points.min(self.seeders_max_bonus)
    }

    pub fn size_penalty(&self, size_gb: f64) -> i32 {
        if !size_gb.is_finite() || size_gb <= self.size_soft_limit_gb {
            return 0;
        }
        if self.size_penalty_step_gb <= 0.0 {
            return self.size_penalty_max;
        }
        let steps = ((size_gb - self.size_soft_limit_gb) / self.size_penalty_step_gb).ceil();
        if steps >= self.size_penalty_max as f64 {
            self.size_penalty_max
        } else {
            steps as i32
        }
    }

    /// Smallest score gap between two adjacent resolution tiers.
    pub fn min_resolution_gap(&self) -> i32 {
        Resolution::TIERS
            .windows(2)
            .map(|pair| self.resolution_score(pair[0]) - self.resolution_score(pair[1]))
            .min()
            .unwrap_or(0)
    }

    /// Check the monotonicity and penalty-bound invariants of the table.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_resolution_gap() <= 0 {
            return Err("resolution weights must strictly decrease from 2160p to unknown".into());
        }

        let sources = [
            VideoSource::Remux,
            VideoSource::BluRay,
            VideoSource::WebDl,
            VideoSource::WebRip,
            VideoSource::Hdtv,
            VideoSource::DvdRip,
            VideoSource::Unknown,
            VideoSource::Screener,
            VideoSource::Telecine,
            VideoSource::Telesync,
            VideoSource::Cam,
        ];
        if sources
            .windows(2)
            .any(|pair| self.source_score(pair[0]) < self.source_score(pair[1]))
        {
            return Err("source weights must not increase for lower source tiers".into());
        }

        if self.size_penalty_max < 0 {
            return Err("size_penalty_max must not be negative".into());
        }
        if self.size_penalty_max >= self.min_resolution_gap() {
            return Err(format!(
                "size_penalty_max ({}) must be below the smallest resolution gap ({})",
                self.size_penalty_max,
                self.min_resolution_gap()
            ));
        }
        Ok(())
    }
}
