use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{
    AdminStats, ApiResponse, ImageDownloadStats, MtgCard, MtgSet, SetStatus,
};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Startup configuration for the backend connection.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
}

impl Config {
    /// Reads `MTG_API_BASE_URL`, falling back to the local backend.
    pub fn from_env() -> Self {
        let base_url = std::env::var("MTG_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Server(String),
    #[error("unexpected response format")]
    Parse,
}

/// The catalog fetch surface the store depends on. The concrete client also
/// carries the admin, debug, and image endpoints; those are not needed by the
/// store and stay off the trait.
#[async_trait]
pub trait CatalogApi {
    async fn get_all_sets(&self) -> Result<Vec<MtgSet>, ApiError>;
    async fn get_latest_set(&self) -> Result<MtgSet, ApiError>;
    async fn get_latest_set_with_cards(&self) -> Result<MtgSet, ApiError>;
    async fn get_set(&self, set_code: &str) -> Result<MtgSet, ApiError>;
    async fn get_set_with_cards(&self, set_code: &str) -> Result<MtgSet, ApiError>;
    async fn get_cards_from_set(&self, set_code: &str) -> Result<Vec<MtgCard>, ApiError>;
}

/// Client for the `/api/mtg` and `/api/images` backend. One method per
/// endpoint, one request per call: no retries, no caching, no deduplication.
pub struct MtgApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl MtgApiClient {
    pub fn new(config: Config) -> Self {
        Self {
            base_url: config.base_url,
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a request and unwrap the `ApiResponse` envelope. Every failure
    /// mode (transport, non-2xx, `success: false`, undecodable body) is
    /// logged here and handed back to the caller unchanged.
    async fn request_enveloped<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let response = match self.http.request(method, &url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("request to {} failed: {}", url, e);
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            // Backend errors still ship an envelope with a message.
            let message = response
                .json::<ApiResponse<serde_json::Value>>()
                .await
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!("{} returned {}: {}", url, status, message);
            return Err(ApiError::Server(message));
        }

        let envelope: ApiResponse<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("decoding response from {} failed: {}", url, e);
                return Err(e.into());
            }
        };

        unwrap_envelope(envelope)
    }

    async fn get_enveloped<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_enveloped(reqwest::Method::GET, path).await
    }

    async fn post_enveloped<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_enveloped(reqwest::Method::POST, path).await
    }

    // -- Admin endpoints --

    /// Kicks off a background database sync. The reply only confirms the sync
    /// was accepted; completion is observed by polling `get_set_status`.
    pub async fn sync_set(&self, set_code: &str) -> Result<String, ApiError> {
        self.post_enveloped(&format!("/api/mtg/admin/sync-set/{set_code}"))
            .await
    }

    /// Database sync plus image save, also asynchronous on the backend.
    pub async fn save_complete_set(&self, set_code: &str) -> Result<String, ApiError> {
        self.post_enveloped(&format!("/api/mtg/admin/save-complete/{set_code}"))
            .await
    }

    /// Drops the set's cards and re-syncs from the source immediately.
    pub async fn force_sync_realtime(&self, set_code: &str) -> Result<String, ApiError> {
        self.post_enveloped(&format!("/api/mtg/admin/force-sync-realtime/{set_code}"))
            .await
    }

    pub async fn get_set_status(&self, set_code: &str) -> Result<SetStatus, ApiError> {
        self.get_enveloped(&format!("/api/mtg/admin/set-status/{set_code}"))
            .await
    }

    pub async fn get_all_sets_status(&self) -> Result<Vec<SetStatus>, ApiError> {
        self.get_enveloped("/api/mtg/admin/all-sets-status").await
    }

    pub async fn get_admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get_enveloped("/api/mtg/admin/stats").await
    }

    // -- Debug endpoints, loosely shaped on the backend --

    pub async fn debug_all_sets(&self) -> Result<serde_json::Value, ApiError> {
        self.get_enveloped("/api/mtg/debug/all-sets").await
    }

    pub async fn debug_latest_set_detection(&self) -> Result<serde_json::Value, ApiError> {
        self.get_enveloped("/api/mtg/debug/latest-set-detection").await
    }

    // -- Image endpoints: plain bodies, no envelope --

    /// Triggers the async image download for a set. 202 means started, not
    /// finished; progress comes from `image_download_stats`.
    pub async fn download_set_images(&self, set_code: &str) -> Result<String, ApiError> {
        let url = self.url(&format!("/api/images/download-set/{set_code}"));
        debug!("POST {}", url);

        let response = match self.http.post(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("request to {} failed: {}", url, e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!("{} returned {}: {}", url, status, body);
            return Err(ApiError::Server(if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body
            }));
        }
        Ok(body)
    }

    pub async fn image_download_stats(&self) -> Result<ImageDownloadStats, ApiError> {
        let url = self.url("/api/images/stats");
        debug!("GET {}", url);

        let response = match self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(r) => r,
            Err(e) => {
                warn!("request to {} failed: {}", url, e);
                return Err(e.into());
            }
        };

        response.json().await.map_err(|e| {
            warn!("decoding response from {} failed: {}", url, e);
            e.into()
        })
    }
}

#[async_trait]
impl CatalogApi for MtgApiClient {
    async fn get_all_sets(&self) -> Result<Vec<MtgSet>, ApiError> {
        self.get_enveloped("/api/mtg/sets").await
    }

    async fn get_latest_set(&self) -> Result<MtgSet, ApiError> {
        self.get_enveloped("/api/mtg/sets/latest").await
    }

    async fn get_latest_set_with_cards(&self) -> Result<MtgSet, ApiError> {
        self.get_enveloped("/api/mtg/sets/latest/cards").await
    }

    async fn get_set(&self, set_code: &str) -> Result<MtgSet, ApiError> {
        self.get_enveloped(&format!("/api/mtg/sets/{set_code}")).await
    }

    async fn get_set_with_cards(&self, set_code: &str) -> Result<MtgSet, ApiError> {
        self.get_enveloped(&format!("/api/mtg/sets/{set_code}/with-cards"))
            .await
    }

    async fn get_cards_from_set(&self, set_code: &str) -> Result<Vec<MtgCard>, ApiError> {
        self.get_enveloped(&format!("/api/mtg/sets/{set_code}/cards-only"))
            .await
    }
}

fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, ApiError> {
    if !envelope.success {
        return Err(ApiError::Server(
            envelope
                .message
                .unwrap_or_else(|| "Unknown server error".to_owned()),
        ));
    }
    envelope.data.ok_or(ApiError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_path() {
        let client = MtgApiClient::new(Config {
            base_url: "http://backend:9000".to_owned(),
        });
        assert_eq!(
            client.url("/api/mtg/sets"),
            "http://backend:9000/api/mtg/sets"
        );
    }

    #[test]
    fn envelope_unwraps_data_on_success() {
        let envelope = ApiResponse {
            success: true,
            data: Some(vec![1, 2, 3]),
            message: None,
            timestamp: None,
        };
        assert_eq!(unwrap_envelope(envelope).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn envelope_failure_carries_server_message() {
        let envelope: ApiResponse<Vec<i32>> = ApiResponse {
            success: false,
            data: None,
            message: Some("Erreur : boom".to_owned()),
            timestamp: None,
        };
        match unwrap_envelope(envelope) {
            Err(ApiError::Server(message)) => assert_eq!(message, "Erreur : boom"),
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn successful_envelope_without_data_is_a_parse_error() {
        let envelope: ApiResponse<Vec<i32>> = ApiResponse {
            success: true,
            data: None,
            message: None,
            timestamp: None,
        };
        assert!(matches!(unwrap_envelope(envelope), Err(ApiError::Parse)));
    }
}
