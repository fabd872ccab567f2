use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;

use crate::{FailureKind, HttpSettings, RemoteError};

/// Thin JSON-over-HTTP wrapper with timeouts and a response size cap.
#[derive(Debug, Clone)]
pub(crate) struct JsonTransport {
    client: Client,
    max_bytes: u64,
}

impl JsonTransport {
    pub(crate) fn new(settings: &HttpSettings) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| RemoteError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
        })
    }

    /// Sends `body` and returns the raw response bytes of a 2xx reply.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<Vec<u8>, RemoteError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(self.too_large(Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(self.too_large(Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<T, RemoteError> {
        let bytes = self.send(method, url, body).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| RemoteError::new(FailureKind::MalformedResponse, err.to_string()))
    }

    fn too_large(&self, actual: Option<u64>) -> RemoteError {
        RemoteError::new(
            FailureKind::TooLarge {
                max_bytes: self.max_bytes,
                actual,
            },
            "response too large",
        )
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, RemoteError> {
    Url::parse(raw).map_err(|err| RemoteError::new(FailureKind::InvalidUrl, err.to_string()))
}

pub(crate) fn encode<T: serde::Serialize + ?Sized>(payload: &T) -> Result<String, RemoteError> {
    serde_json::to_string(payload)
        .map_err(|err| RemoteError::new(FailureKind::InvalidPayload, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::new(FailureKind::Timeout, err.to_string());
    }
    RemoteError::new(FailureKind::Network, err.to_string())
}
