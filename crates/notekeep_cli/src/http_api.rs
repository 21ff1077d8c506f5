//! `NotesApi` over HTTP.
//!
//! # Responsibility
//! - Map fetch/push to `GET`/`POST /api/notes` on a Notekeep server.
//! - Turn non-success answers into `TransportError::Status` with the best
//!   detail the server offered.

use async_trait::async_trait;
use notekeep_core::{Note, NotesApi, TransportError};
use reqwest::Response;

const ERROR_DETAIL_HEADER: &str = "x-error-detail";

/// HTTP transport bound to one server base URL.
#[derive(Debug, Clone)]
pub struct HttpNotesApi {
    client: reqwest::Client,
    notes_url: String,
}

impl HttpNotesApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            notes_url: format!("{}/api/notes", base_url.trim_end_matches('/')),
        }
    }

    pub fn notes_url(&self) -> &str {
        &self.notes_url
    }
}

#[async_trait]
impl NotesApi for HttpNotesApi {
    async fn fetch_notes(&self) -> Result<Vec<Note>, TransportError> {
        let response = self
            .client
            .get(&self.notes_url)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        let response = ensure_success(response).await?;
        response
            .json::<Vec<Note>>()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))
    }

    async fn push_notes(&self, notes: &[Note]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.notes_url)
            .json(notes)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_detail = response
        .headers()
        .get(ERROR_DETAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let detail = match header_detail {
        Some(detail) => detail,
        None => response.text().await.unwrap_or_default(),
    };
    Err(TransportError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::HttpNotesApi;

    #[test]
    fn notes_url_ignores_trailing_slash() {
        assert_eq!(
            HttpNotesApi::new("http://localhost:3000/").notes_url(),
            "http://localhost:3000/api/notes"
        );
    }
}
