//! Operator-configured quality-type exclusions.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::types::{HdrType, ParsedQuality, Resolution, VideoSource};

static THREE_D: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])(?:3d|h?sbs|h?ou)(?:$|[^a-z0-9])").expect("invalid 3D pattern")
});

/// A class of release an operator never wants selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityExclusion {
    /// Any REMUX release.
    Remux,
    /// HDR, HDR10 or HDR10+ without a Dolby Vision layer.
    Hdr,
    /// Dolby Vision without an HDR fallback layer.
    Dv,
    /// Dolby Vision with an HDR fallback layer.
    Dvhdr,
    #[serde(rename = "3d")]
    ThreeD,
    Scr,
    /// CAM, telesync and telecine releases.
    Cam,
    /// Releases whose resolution could not be determined.
    Unknown,
}

impl QualityExclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityExclusion::Remux => "remux",
            QualityExclusion::Hdr => "hdr",
            QualityExclusion::Dv => "dv",
            QualityExclusion::Dvhdr => "dvhdr",
            QualityExclusion::ThreeD => "3d",
            QualityExclusion::Scr => "scr",
            QualityExclusion::Cam => "cam",
            QualityExclusion::Unknown => "unknown",
        }
    }

    fn matches(&self, title: &str, parsed: &ParsedQuality) -> bool {
        match self {
            QualityExclusion::Remux => parsed.source == VideoSource::Remux,
            QualityExclusion::Hdr => matches!(
                parsed.hdr_type,
                HdrType::Hdr | HdrType::Hdr10 | HdrType::Hdr10Plus
            ),
            QualityExclusion::Dv => parsed.hdr_type == HdrType::DolbyVision,
            QualityExclusion::Dvhdr => parsed.hdr_type == HdrType::DolbyVisionHdr,
            QualityExclusion::ThreeD => THREE_D.is_match(title),
            QualityExclusion::Scr => parsed.source == VideoSource::Screener,
            QualityExclusion::Cam => matches!(
                parsed.source,
                VideoSource::Cam | VideoSource::Telesync | VideoSource::Telecine
            ),
            QualityExclusion::Unknown => parsed.resolution == Resolution::Unknown,
        }
    }
}

/// Returns the first exclusion that applies to this release, if any.
pub fn should_exclude(
    title: &str,
    parsed: &ParsedQuality,
    excluded: &[QualityExclusion],
) -> Option<QualityExclusion> {
    excluded.iter().copied().find(|e| e.matches(title, parsed))
}

/// Why a release name was blocked by [`NameFilters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Group(String),
    Language(String),
}

impl NameMatch {
    pub fn kind(&self) -> &'static str {
        match self {
            NameMatch::Group(_) => "release_group",
            NameMatch::Language(_) => "language",
        }
    }

    pub fn token(&self) -> &str {
        match self {
            NameMatch::Group(t) | NameMatch::Language(t) => t,
        }
    }
}

/// Release-group and language tokens blocked anywhere in a release name.
///
/// Matching is a case-insensitive substring test. Blank tokens are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilters {
    groups: Vec<String>,
    languages: Vec<String>,
}

impl NameFilters {
    pub fn new(groups: &[String], languages: &[String]) -> Self {
        Self {
            groups: normalize_tokens(groups),
            languages: normalize_tokens(languages),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.languages.is_empty()
    }

    /// Groups are checked before languages.
    pub fn find_match(&self, title: &str) -> Option<NameMatch> {
        if self.is_empty() {
            return None;
        }
        let upper = title.to_uppercase();
        if let Some(group) = self.groups.iter().find(|g| upper.contains(g.as_str())) {
            return Some(NameMatch::Group(group.clone()));
        }
        self.languages
            .iter()
            .find(|l| upper.contains(l.as_str()))
            .map(|l| NameMatch::Language(l.clone()))
    }
}

fn normalize_tokens(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::parse_quality;

    fn excluded_by(title: &str, list: &[QualityExclusion]) -> Option<QualityExclusion> {
        should_exclude(title, &parse_quality(title), list)
    }

    #[test]
    fn test_empty_list_excludes_nothing() {
        assert_eq!(excluded_by("Movie.2024.HDCAM", &[]), None);
    }

    #[test]
    fn test_cam_family() {
        let list = [QualityExclusion::Cam];
        assert_eq!(excluded_by("Movie.2024.HDCAM.x264", &list), Some(QualityExclusion::Cam));
        assert_eq!(excluded_by("Movie.2024.TS.x264", &list), Some(QualityExclusion::Cam));
        assert_eq!(excluded_by("Movie 2024 TELECINE", &list), Some(QualityExclusion::Cam));
        assert_eq!(excluded_by("Guardians.Of.The.Galaxy.1080p.WEB-DL", &list), None);
        assert_eq!(excluded_by("Lights.Out.2016.1080p.BluRay", &list), None);
    }

    #[test]
    fn test_dv_and_dvhdr_are_distinct() {
        let dv = [QualityExclusion::Dv];
        let dvhdr = [QualityExclusion::Dvhdr];
        let bare = "Movie.2160p.WEB-DL.DV.x265";
        let hybrid = "Movie.2160p.WEB-DL.DV.HDR10.x265";
        assert!(excluded_by(bare, &dv).is_some());
        assert!(excluded_by(bare, &dvhdr).is_none());
        assert!(excluded_by(hybrid, &dv).is_none());
        assert!(excluded_by(hybrid, &dvhdr).is_some());
    }

    #[test]
    fn test_hdr_does_not_cover_dolby_vision() {
        let list = [QualityExclusion::Hdr];
        assert!(excluded_by("Movie.2160p.HDR10.WEB-DL", &list).is_some());
        assert!(excluded_by("Movie.2160p.DV.HDR.WEB-DL", &list).is_none());
    }

    #[test]
    fn test_3d_and_unknown() {
        let three_d = [QualityExclusion::ThreeD];
        assert!(excluded_by("Avatar.2009.1080p.3D.HSBS.BluRay", &three_d).is_some());
        assert!(excluded_by("Soup.2009.1080p.BluRay", &three_d).is_none());
        assert!(excluded_by("Some Movie WEB-DL", &[QualityExclusion::Unknown]).is_some());
        assert!(excluded_by("Some Movie 720p WEB-DL", &[QualityExclusion::Unknown]).is_none());
    }

    #[test]
    fn test_first_matching_exclusion_reported() {
        let list = [QualityExclusion::Scr, QualityExclusion::Remux];
        assert_eq!(
            excluded_by("Movie.1080p.BluRay.REMUX", &list),
            Some(QualityExclusion::Remux)
        );
    }

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_filters_block_groups_case_insensitively() {
        let filters = NameFilters::new(&tokens(&[" yify ", ""]), &[]);
        assert_eq!(
            filters.find_match("Movie.2020.1080p.WEBRip.x264-YIFY"),
            Some(NameMatch::Group("YIFY".to_string()))
        );
        assert_eq!(filters.find_match("Movie.2020.1080p.BluRay-FGT"), None);
    }

    #[test]
    fn test_name_filters_block_languages() {
        let filters = NameFilters::new(&tokens(&["RARBG"]), &tokens(&["ita", "French"]));
        let found = filters.find_match("Movie.2020.1080p.WEB-DL.iTA.ENG").unwrap();
        assert_eq!(found.kind(), "language");
        assert_eq!(found.token(), "ITA");
        assert_eq!(
            filters.find_match("Film.2020.FRENCH.1080p-RARBG"),
            Some(NameMatch::Group("RARBG".to_string()))
        );
        assert_eq!(filters.find_match("Movie.2020.1080p.WEB-DL.ENG"), None);
    }

    #[test]
    fn test_empty_name_filters_match_nothing() {
        let filters = NameFilters::new(&tokens(&["  "]), &[]);
        assert!(filters.is_empty());
        assert_eq!(filters.find_match("anything"), None);
    }

    #[test]
    fn test_deserialize_from_config_strings() {
        let list: Vec<QualityExclusion> =
            serde_json::from_str(r#"["remux","3d","dvhdr","cam"]"#).unwrap();
        assert_eq!(
            list,
            vec![
                QualityExclusion::Remux,
                QualityExclusion::ThreeD,
                QualityExclusion::Dvhdr,
                QualityExclusion::Cam
            ]
        );
    }
}
