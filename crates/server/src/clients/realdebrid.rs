//! Real-Debrid debrid service implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use debridarr_core::config::DebridConfig;
use debridarr_core::{DebridError, DebridService};

/// How often torrent info is polled while Real-Debrid prepares the links.
const INFO_POLL_ATTEMPTS: u32 = 3;
const INFO_POLL_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct AddMagnetResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TorrentInfo {
    status: String,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UnrestrictResponse {
    download: String,
}

/// Real-Debrid REST client.
pub struct RealDebridClient {
    client: Client,
    config: DebridConfig,
}

impl RealDebridClient {
    pub fn new(config: DebridConfig) -> Result<Self, DebridError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DebridError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url(), endpoint))
            .bearer_auth(&self.config.api_key)
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), endpoint))
            .bearer_auth(&self.config.api_key)
    }

    async fn send(request: RequestBuilder) -> Result<Response, DebridError> {
        let response = request.send().await.map_err(map_request_error)?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, DebridError> {
        Self::send(request)
            .await?
            .json()
            .await
            .map_err(|e| DebridError::InvalidResponse(e.to_string()))
    }

    async fn add_magnet(&self, hash: &str) -> Result<String, DebridError> {
        let magnet = format!("magnet:?xt=urn:btih:{}", hash);
        let added: AddMagnetResponse =
            Self::send_json(self.post("/torrents/addMagnet").form(&[("magnet", magnet)])).await?;
        Ok(added.id)
    }

    async fn select_files(
        &self,
        torrent_id: &str,
        file_index: Option<u32>,
    ) -> Result<(), DebridError> {
        Self::send(
            self.post(&format!("/torrents/selectFiles/{}", torrent_id))
                .form(&[("files", files_param(file_index))]),
        )
        .await?;
        Ok(())
    }

    async fn torrent_info(&self, torrent_id: &str) -> Result<TorrentInfo, DebridError> {
        Self::send_json(self.get(&format!("/torrents/info/{}", torrent_id))).await
    }

    async fn unrestrict(&self, link: &str) -> Result<String, DebridError> {
        let unrestricted: UnrestrictResponse =
            Self::send_json(self.post("/unrestrict/link").form(&[("link", link)])).await?;
        Ok(unrestricted.download)
    }

    /// Poll until the torrent is downloaded and has at least one link.
    async fn ready_link(&self, hash: &str, torrent_id: &str) -> Result<String, DebridError> {
        for attempt in 1..=INFO_POLL_ATTEMPTS {
            let info = self.torrent_info(torrent_id).await?;
            if info.status == "downloaded" {
                if let Some(link) = info.links.into_iter().next() {
                    return Ok(link);
                }
            }
            debug!(hash, status = %info.status, attempt, "Torrent not ready yet");
            if attempt < INFO_POLL_ATTEMPTS {
                tokio::time::sleep(INFO_POLL_DELAY).await;
            }
        }
        Err(DebridError::NotCached(hash.to_string()))
    }
}

#[async_trait]
impl DebridService for RealDebridClient {
    fn name(&self) -> &str {
        "real_debrid"
    }

    fn max_batch_size(&self) -> usize {
        self.config.batch_size
    }

    async fn check_cache(&self, hashes: &[String]) -> Result<HashMap<String, bool>, DebridError> {
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }

        let endpoint = format!("/torrents/instantAvailability/{}", hashes.join("/"));
        let body: Value = Self::send_json(self.get(&endpoint)).await?;
        Ok(parse_availability(&body, hashes))
    }

    async fn stream_url(&self, hash: &str, file_index: Option<u32>) -> Result<String, DebridError> {
        let torrent_id = self.add_magnet(hash).await?;
        self.select_files(&torrent_id, file_index).await?;
        let link = self.ready_link(hash, &torrent_id).await?;
        self.unrestrict(&link).await
    }
}

fn map_request_error(e: reqwest::Error) -> DebridError {
    if e.is_timeout() {
        DebridError::Timeout
    } else if e.is_connect() {
        DebridError::ConnectionFailed(e.to_string())
    } else if e.is_decode() {
        DebridError::InvalidResponse(e.to_string())
    } else {
        DebridError::ConnectionFailed(e.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, DebridError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status.as_u16() {
        401 | 403 => Err(DebridError::Unauthorized),
        429 => {
            warn!("Real-Debrid rate limit hit");
            Err(DebridError::RateLimited)
        }
        code => {
            let message = response.text().await.unwrap_or_default();
            Err(DebridError::ApiError {
                status: code,
                message: message.chars().take(200).collect(),
            })
        }
    }
}

/// Real-Debrid file ids are 1-based; provider file indexes are 0-based.
fn files_param(file_index: Option<u32>) -> String {
    match file_index {
        Some(index) => (index + 1).to_string(),
        None => "all".to_string(),
    }
}

/// A hash is cached when its entry is a non-empty object. Hashes absent
/// from the answer map to false.
fn parse_availability(body: &Value, hashes: &[String]) -> HashMap<String, bool> {
    hashes
        .iter()
        .map(|hash| {
            let cached = body
                .get(hash.to_ascii_lowercase())
                .or_else(|| body.get(hash.to_ascii_uppercase()))
                .and_then(Value::as_object)
                .is_some_and(|hosts| !hosts.is_empty());
            (hash.clone(), cached)
        })
        .collect()
}
