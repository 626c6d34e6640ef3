//! Quality attributes extracted from release titles.

use serde::{Deserialize, Serialize};

/// Video resolution tier, ordered from worst to best.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resolution {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
    #[serde(rename = "2160p")]
    R2160p,
}

impl Resolution {
    /// All tiers from best to worst.
    pub const TIERS: [Resolution; 5] = [
        Resolution::R2160p,
        Resolution::R1080p,
        Resolution::R720p,
        Resolution::R480p,
        Resolution::Unknown,
    ];

    /// Label used for persistence and display.
    pub fn as_label(&self) -> &'static str {
        match self {
            Resolution::Unknown => "unknown",
            Resolution::R480p => "480p",
            Resolution::R720p => "720p",
            Resolution::R1080p => "1080p",
            Resolution::R2160p => "2160p",
        }
    }

    /// Parse a stored label. Accepts the common aliases (`4K`, `UHD`, `FHD`, `SD`).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "2160p" | "4k" | "uhd" => Resolution::R2160p,
            "1080p" | "fhd" => Resolution::R1080p,
            "720p" | "hd" => Resolution::R720p,
            "480p" | "576p" | "sd" => Resolution::R480p,
            _ => Resolution::Unknown,
        }
    }

    /// True for 2160p/4K.
    pub fn is_4k(&self) -> bool {
        matches!(self, Resolution::R2160p)
    }
}

/// High dynamic range flavour.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HdrType {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "HDR")]
    Hdr,
    #[serde(rename = "HDR10")]
    Hdr10,
    #[serde(rename = "HDR10+")]
    Hdr10Plus,
    #[serde(rename = "DV")]
    DolbyVision,
    #[serde(rename = "DV+HDR")]
    DolbyVisionHdr,
}

impl HdrType {
    pub fn as_label(&self) -> &'static str {
        match self {
            HdrType::None => "none",
            HdrType::Hdr => "HDR",
            HdrType::Hdr10 => "HDR10",
            HdrType::Hdr10Plus => "HDR10+",
            HdrType::DolbyVision => "DV",
            HdrType::DolbyVisionHdr => "DV+HDR",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "HDR" => HdrType::Hdr,
            "HDR10" => HdrType::Hdr10,
            "HDR10+" => HdrType::Hdr10Plus,
            "DV" | "DOLBY VISION" | "DOVI" => HdrType::DolbyVision,
            "DV+HDR" => HdrType::DolbyVisionHdr,
            _ => HdrType::None,
        }
    }

    /// Whether the stream carries a Dolby Vision layer.
    pub fn has_dolby_vision(&self) -> bool {
        matches!(self, HdrType::DolbyVision | HdrType::DolbyVisionHdr)
    }
}

/// Release source, ordered from worst to best.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VideoSource {
    #[serde(rename = "CAM")]
    Cam,
    #[serde(rename = "TELESYNC")]
    Telesync,
    #[serde(rename = "TELECINE")]
    Telecine,
    #[serde(rename = "SCR")]
    Screener,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "DVDRip")]
    DvdRip,
    #[serde(rename = "HDTV")]
    Hdtv,
    #[serde(rename = "WEBRip")]
    WebRip,
    #[serde(rename = "WEB-DL")]
    WebDl,
    #[serde(rename = "BluRay")]
    BluRay,
    #[serde(rename = "REMUX")]
    Remux,
}

impl VideoSource {
    pub fn as_label(&self) -> &'static str {
        match self {
            VideoSource::Cam => "CAM",
            VideoSource::Telesync => "TELESYNC",
            VideoSource::Telecine => "TELECINE",
            VideoSource::Screener => "SCR",
            VideoSource::Unknown => "unknown",
            VideoSource::DvdRip => "DVDRip",
            VideoSource::Hdtv => "HDTV",
            VideoSource::WebRip => "WEBRip",
            VideoSource::WebDl => "WEB-DL",
            VideoSource::BluRay => "BluRay",
            VideoSource::Remux => "REMUX",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "CAM" => VideoSource::Cam,
            "TELESYNC" | "TS" => VideoSource::Telesync,
            "TELECINE" | "TC" => VideoSource::Telecine,
            "SCR" | "SCREENER" => VideoSource::Screener,
            "DVDRIP" => VideoSource::DvdRip,
            "HDTV" => VideoSource::Hdtv,
            "WEBRIP" => VideoSource::WebRip,
            "WEB-DL" | "WEBDL" | "WEB" => VideoSource::WebDl,
            "BLURAY" => VideoSource::BluRay,
            "REMUX" => VideoSource::Remux,
            _ => VideoSource::Unknown,
        }
    }
}

/// Video codec.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "AVC")]
    Avc,
    #[serde(rename = "HEVC")]
    Hevc,
}

impl VideoCodec {
    pub fn as_label(&self) -> &'static str {
        match self {
            VideoCodec::Unknown => "unknown",
            VideoCodec::Avc => "AVC",
            VideoCodec::Hevc => "HEVC",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "AVC" | "X264" | "H264" => VideoCodec::Avc,
            "HEVC" | "X265" | "H265" => VideoCodec::Hevc,
            _ => VideoCodec::Unknown,
        }
    }
}

/// Structured quality attributes of one release.
///
/// Produced by [`parse_quality`](super::parse_quality); every field has a
/// well-defined "unknown" value so parsing never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuality {
    pub resolution: Resolution,
    pub hdr_type: HdrType,
    /// Free-form audio token such as `Atmos` or `DTS`; empty when unknown.
    pub audio_format: String,
    pub source: VideoSource,
    pub codec: VideoCodec,
    pub size_gb: f64,
    pub seeders: u32,
}

/// Per-component score of a [`ParsedQuality`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub resolution_score: i32,
    pub hdr_score: i32,
    pub audio_score: i32,
    pub source_score: i32,
    pub seeders_score: i32,
    pub size_penalty: i32,
    pub total_score: i32,
}
