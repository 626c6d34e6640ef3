//! Guard rules and upgrade thresholds.

use serde::{Deserialize, Serialize};

use crate::quality::{ParsedQuality, VideoSource};

/// A property an upgrade may never regress, whatever the score delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardRule {
    /// A 2160p stream is only replaced by another 2160p stream.
    Keep4k,
    /// A REMUX stream is only replaced by another REMUX.
    KeepRemux,
    /// A Dolby Vision stream is only replaced by another Dolby Vision stream.
    KeepDolbyVision,
}

impl GuardRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardRule::Keep4k => "keep_4k",
            GuardRule::KeepRemux => "keep_remux",
            GuardRule::KeepDolbyVision => "keep_dolby_vision",
        }
    }
}

/// First guard rule that replacing `incumbent` with `candidate` would break.
pub fn violated_guard(incumbent: &ParsedQuality, candidate: &ParsedQuality) -> Option<GuardRule> {
    if incumbent.resolution.is_4k() && !candidate.resolution.is_4k() {
        return Some(GuardRule::Keep4k);
    }
    if incumbent.source == VideoSource::Remux && candidate.source != VideoSource::Remux {
        return Some(GuardRule::KeepRemux);
    }
    if incumbent.hdr_type.has_dolby_vision() && !candidate.hdr_type.has_dolby_vision() {
        return Some(GuardRule::KeepDolbyVision);
    }
    None
}

/// Thresholds for applying or flagging upgrades of an available stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradePolicy {
    /// Minimum score gain before an upgrade is applied.
    pub min_upgrade_points: i32,
    /// Score gain above which a non-applied upgrade is still flagged.
    pub advisory_upgrade_points: i32,
    /// Largest size growth (GB) an applied upgrade may bring.
    pub max_upgrade_size_gb: f64,
}

impl Default for UpgradePolicy {
    fn default() -> Self {
        Self {
            min_upgrade_points: 20,
            advisory_upgrade_points: 10,
            max_upgrade_size_gb: 30.0,
        }
    }
}
