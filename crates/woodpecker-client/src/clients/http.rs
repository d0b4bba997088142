use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{
    Hint, MoveRequest, MoveVerdict, PerformanceRecord, Puzzle, PuzzleApi, PuzzleSet, Rating,
    RatingRequest, SessionStart, StartSessionRequest, Summary,
};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// reqwest-backed client for the Woodpecker API.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent("Woodpecker/1.0")
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into `ClientError::Status`, keeping the
    /// `{"detail": "..."}` message when the server sends one.
    async fn check(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or(body);

        tracing::warn!(status = status.as_u16(), %detail, "API request failed");
        Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        tracing::debug!(path, "GET");
        let resp = self.client.get(self.url(path)).send().await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }
}

impl PuzzleApi for HttpApi {
    async fn puzzle_sets(&self) -> Result<Vec<PuzzleSet>, ClientError> {
        self.get_json("/api/puzzle_sets").await
    }

    async fn start_session(&self, puzzle_set_id: i64) -> Result<SessionStart, ClientError> {
        tracing::debug!(puzzle_set_id, "POST /api/sessions");
        let resp = self
            .client
            .post(self.url("/api/sessions"))
            .json(&StartSessionRequest { puzzle_set_id })
            .send()
            .await?;

        match Self::check(resp).await {
            Ok(resp) => Ok(resp.json().await?),
            Err(ClientError::Status { status, detail })
                if matches!(status, 400 | 404 | 422) =>
            {
                Err(ClientError::SessionCreate(detail))
            }
            Err(e) => Err(e),
        }
    }

    async fn next_puzzle(&self, session_id: &str) -> Result<Option<Puzzle>, ClientError> {
        let path = format!("/api/sessions/{session_id}/puzzle");
        tracing::debug!(path = %path, "GET");
        let resp = self.client.get(self.url(&path)).send().await?;

        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let resp = Self::check(resp).await?;
        let text = resp.text().await?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        // `null` and `{}` both mean the set is exhausted
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Null => Ok(None),
            Value::Object(ref map) if map.is_empty() => Ok(None),
            other => Ok(Some(serde_json::from_value(other)?)),
        }
    }

    async fn summary(&self, session_id: &str) -> Result<Summary, ClientError> {
        self.get_json(&format!("/api/sessions/{session_id}/summary"))
            .await
    }

    async fn submit_move(&self, session_id: &str, uci: &str) -> Result<MoveVerdict, ClientError> {
        tracing::debug!(session_id, uci, "POST move");
        let resp = self
            .client
            .post(self.url(&format!("/api/sessions/{session_id}/move")))
            .json(&MoveRequest {
                uci: uci.to_string(),
            })
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    async fn hint(&self, session_id: &str) -> Result<Hint, ClientError> {
        self.get_json(&format!("/api/sessions/{session_id}/hint"))
            .await
    }

    async fn rate(&self, puzzle_id: i64, rating: Rating) -> Result<(), ClientError> {
        tracing::debug!(puzzle_id, value = rating.value(), "POST rating");
        let resp = self
            .client
            .post(self.url(&format!("/api/puzzles/{puzzle_id}/rating")))
            .json(&RatingRequest::from(rating))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn performances(&self) -> Result<Vec<PerformanceRecord>, ClientError> {
        self.get_json("/api/performances").await
    }
}
