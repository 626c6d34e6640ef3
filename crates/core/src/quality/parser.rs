//! Release-title quality parser.
//!
//! Parsing is total: every category falls back to its "unknown" value and
//! no input (empty, non-ASCII, adversarial) can make it fail or panic.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{HdrType, ParsedQuality, Resolution, VideoCodec, VideoSource};

/// Compile a case-insensitive pattern that must be delimited by separators
/// (anything that is not an ASCII letter or digit) or the ends of the title.
fn standalone(pattern: &str) -> Regex {
    Regex::new(&format!("(?i)(?:^|[^a-z0-9])(?:{})(?:$|[^a-z0-9])", pattern))
        .expect("invalid standalone token pattern")
}

fn anywhere(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).expect("invalid token pattern")
}

static RESOLUTION_PATTERNS: Lazy<Vec<(Regex, Resolution)>> = Lazy::new(|| {
    vec![
        (standalone("2160p|4k|uhd"), Resolution::R2160p),
        (standalone("1080p|1080i|fhd"), Resolution::R1080p),
        (standalone("720p"), Resolution::R720p),
        (standalone("480p|576p|sd"), Resolution::R480p),
    ]
});

static DOLBY_VISION: Lazy<Regex> =
    Lazy::new(|| anywhere(r"(?:^|[^a-z0-9])(?:dv|dovi)(?:$|[^a-z0-9])|dolby[ ._-]?vision"));
static HDR10_PLUS: Lazy<Regex> = Lazy::new(|| anywhere(r"hdr10(?:\+|plus)"));
static HDR10: Lazy<Regex> = Lazy::new(|| standalone("hdr10"));
static HDR: Lazy<Regex> = Lazy::new(|| standalone("hdr"));

static AUDIO_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (anywhere("atmos"), "Atmos"),
        (anywhere("true-?hd"), "TrueHD"),
        (anywhere(r"dts[ ._-]?x(?:$|[^a-z0-9])"), "DTS-X"),
        (anywhere(r"dts[ ._-]?hd"), "DTS-HD"),
        (standalone(r"dts(?:[ ._-]?\d\.\d)?"), "DTS"),
        (anywhere(r"dd\+|ddp|e-?ac-?3"), "DD+"),
        (standalone(r"dd(?:[ ._-]?\d\.\d)?|ac-?3"), "DD"),
        (standalone(r"aac(?:[ ._-]?\d\.\d)?"), "AAC"),
        (standalone("flac"), "FLAC"),
    ]
});

static SOURCE_PATTERNS: Lazy<Vec<(Regex, VideoSource)>> = Lazy::new(|| {
    vec![
        (anywhere("remux"), VideoSource::Remux),
        (anywhere("blu-?ray|bdrip|brrip"), VideoSource::BluRay),
        (anywhere("web-?dl"), VideoSource::WebDl),
        (anywhere("web-?rip"), VideoSource::WebRip),
        (standalone("web"), VideoSource::WebDl),
        (standalone("hdtv|pdtv"), VideoSource::Hdtv),
        (anywhere("dvd-?rip|dvd5|dvd9"), VideoSource::DvdRip),
        (anywhere("dvdscr|bdscr|screener"), VideoSource::Screener),
        (standalone("scr"), VideoSource::Screener),
        (anywhere("telecine"), VideoSource::Telecine),
        (standalone("tc|hdtc"), VideoSource::Telecine),
        (anywhere("telesync"), VideoSource::Telesync),
        (standalone("ts|hdts"), VideoSource::Telesync),
        (anywhere("hdcam|camrip"), VideoSource::Cam),
        (standalone("cam"), VideoSource::Cam),
    ]
});

static CODEC_PATTERNS: Lazy<Vec<(Regex, VideoCodec)>> = Lazy::new(|| {
    vec![
        (anywhere(r"x265|h\.?265|hevc"), VideoCodec::Hevc),
        (anywhere(r"x264|h\.?264"), VideoCodec::Avc),
        (standalone("avc"), VideoCodec::Avc),
    ]
});

static SIZE: Lazy<Regex> =
    Lazy::new(|| anywhere(r"(\d+(?:[.,]\d+)?)\s*(gib|gb|mib|mb)(?:$|[^a-z0-9])"));

/// Parse quality attributes from a raw release title.
///
/// The first matching pattern per category wins; patterns are ordered from
/// most to least specific.
pub fn parse_quality(title: &str) -> ParsedQuality {
    ParsedQuality {
        resolution: first_match(&RESOLUTION_PATTERNS, title).unwrap_or_default(),
        hdr_type: parse_hdr(title),
        audio_format: first_match(&AUDIO_PATTERNS, title)
            .map(str::to_string)
            .unwrap_or_default(),
        source: first_match(&SOURCE_PATTERNS, title).unwrap_or_default(),
        codec: first_match(&CODEC_PATTERNS, title).unwrap_or_default(),
        size_gb: parse_size_gb(title).unwrap_or(0.0),
        seeders: 0,
    }
}

fn first_match<T: Copy>(patterns: &[(Regex, T)], title: &str) -> Option<T> {
    patterns
        .iter()
        .find(|(re, _)| re.is_match(title))
        .map(|(_, value)| *value)
}

fn parse_hdr(title: &str) -> HdrType {
    let hdr = if HDR10_PLUS.is_match(title) {
        HdrType::Hdr10Plus
    } else if HDR10.is_match(title) {
        HdrType::Hdr10
    } else if HDR.is_match(title) {
        HdrType::Hdr
    } else {
        HdrType::None
    };

    match (DOLBY_VISION.is_match(title), hdr) {
        (true, HdrType::None) => HdrType::DolbyVision,
        (true, _) => HdrType::DolbyVisionHdr,
        (false, hdr) => hdr,
    }
}

/// Extract a size like `12.4 GB` or `700MB` from the title, in GB.
pub fn parse_size_gb(title: &str) -> Option<f64> {
    let caps = SIZE.captures(title)?;
    let value: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let unit = caps.get(2)?.as_str().to_ascii_lowercase();
    if unit.starts_with('m') {
        Some(value / 1024.0)
    } else {
        Some(value)
    }
}
