//! Release-title quality parsing and scoring.

pub mod exclusions;
mod parser;
mod scoring;
mod types;

pub use exclusions::{should_exclude, NameFilters, NameMatch, QualityExclusion};
pub use parser::{parse_quality, parse_size_gb};
pub use scoring::{
    score_quality, AudioWeights, HdrWeights, ResolutionWeights, ScoringPolicy, SourceWeights,
};
pub use types::{HdrType, ParsedQuality, Resolution, ScoreBreakdown, VideoCodec, VideoSource};
