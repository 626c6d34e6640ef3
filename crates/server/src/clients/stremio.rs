//! Stremio addon stream provider (Torrentio and compatible addons).
//!
//! Addons answer `GET {base}/stream/{type}/{id}.json` with a list of
//! streams. Torrent addons put the release name on the first line of
//! `title` and decorate the following lines with seeders, size and
//! origin tracker:
//!
//! ```text
//! The.Matrix.1999.2160p.UHD.BluRay.REMUX.HDR.HEVC.Atmos-EPSiLON
//! 👤 84 💾 57.4 GB ⚙️ ThePirateBay
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use debridarr_core::catalog::ContentKind;
use debridarr_core::config::ProviderConfig;
use debridarr_core::quality::parse_size_gb;
use debridarr_core::{ProviderError, StreamCandidate, StreamProvider, StreamRequest};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

static SEEDERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"👤\s*(\d+)").expect("invalid seeders pattern"));
static ORIGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new("⚙\u{FE0F}?\\s*(\\S+)").expect("invalid origin pattern"));

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    streams: Vec<AddonStream>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonStream {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    info_hash: Option<String>,
    #[serde(default)]
    file_idx: Option<u32>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    behavior_hints: Option<BehaviorHints>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BehaviorHints {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    video_size: Option<u64>,
}

/// Stream provider backed by a Stremio addon.
pub struct StremioProvider {
    client: Client,
    config: ProviderConfig,
}

impl StremioProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .trim_end_matches('/')
            .trim_end_matches("/manifest.json")
    }

    fn stream_url(&self, request: &StreamRequest) -> String {
        format!("{}{}", self.base_url(), stream_path(request))
    }
}

#[async_trait]
impl StreamProvider for StremioProvider {
    fn name(&self) -> &str {
        "stremio"
    }

    async fn streams_for_item(
        &self,
        request: &StreamRequest,
    ) -> Result<Vec<StreamCandidate>, ProviderError> {
        let url = self.stream_url(request);
        debug!(url = %url, "Fetching addon streams");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else if e.is_connect() {
                ProviderError::ConnectionFailed(e.to_string())
            } else {
                ProviderError::ApiError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ProviderError::ApiError(format!("HTTP {}", status)));
        }

        let body: StreamsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let candidates: Vec<StreamCandidate> =
            body.streams.into_iter().filter_map(to_candidate).collect();
        debug!(imdb_id = %request.imdb_id, count = candidates.len(), "Addon streams parsed");
        Ok(candidates)
    }
}

/// `/stream/movie/{id}.json` or `/stream/series/{id}:{season}:{episode}.json`.
fn stream_path(request: &StreamRequest) -> String {
    let id = urlencoding::encode(&request.imdb_id);
    match (request.kind, request.season, request.episode) {
        (ContentKind::Series, Some(season), Some(episode)) => {
            format!("/stream/series/{}:{}:{}.json", id, season, episode)
        }
        (ContentKind::Series, _, _) => format!("/stream/series/{}.json", id),
        (ContentKind::Movie, _, _) => format!("/stream/movie/{}.json", id),
    }
}

/// Streams with neither a hash nor a URL are dropped.
fn to_candidate(stream: AddonStream) -> Option<StreamCandidate> {
    let info_hash = stream
        .info_hash
        .map(|h| h.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let url = stream.url.unwrap_or_default();
    if info_hash.is_empty() && url.is_empty() {
        return None;
    }

    let description = stream
        .title
        .filter(|t| !t.trim().is_empty())
        .or_else(|| stream.name.clone())
        .unwrap_or_default();
    let hints = stream.behavior_hints.unwrap_or_default();
    let release = description
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .or(hints.filename)
        .unwrap_or_default();

    let size_bytes = hints
        .video_size
        .or_else(|| parse_size_gb(&description).map(|gb| (gb * BYTES_PER_GB) as u64))
        .unwrap_or(0);
    let seeders = SEEDERS
        .captures(&description)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0);
    let source_tag = ORIGIN
        .captures(&description)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| {
            stream
                .name
                .as_deref()
                .and_then(|n| n.lines().next())
                .unwrap_or("stremio")
                .trim()
                .to_string()
        });

    Some(StreamCandidate {
        title: release,
        info_hash,
        url,
        size_bytes,
        source_tag,
        seeders,
        file_index: stream.file_idx,
    })
}
