use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use super::ImageGenProvider;
use crate::{
    error::{ImageGenError, Result},
    types::{GenerationRequest, GenerationResult},
};

/// fal.ai queue provider
///
/// Submits one job, polls its status until it leaves the queue and then
/// fetches the output.
pub(crate) struct FalProvider {
    client: Client,
    api_key: Option<SecretString>,
    base_url: Url,
    model: String,
    poll_interval: Duration,
}

impl FalProvider {
    pub fn new(
        client: Client,
        api_key: Option<SecretString>,
        base_url: Url,
        model: String,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url,
            model,
            poll_interval,
        }
    }

    fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn submit_url(&self) -> String {
        format!("{}/{}", self.base(), self.model.trim_matches('/'))
    }

    /// Application id used for request URLs: the first two model segments
    ///
    /// `fal-ai/nano-banana-pro/edit` is served under `fal-ai/nano-banana-pro`.
    fn app_id(&self) -> String {
        self.model
            .trim_matches('/')
            .split('/')
            .take(2)
            .collect::<Vec<_>>()
            .join("/")
    }

    fn status_url(&self, request_id: &str) -> String {
        format!("{}/{}/requests/{request_id}/status", self.base(), self.app_id())
    }

    fn response_url(&self, request_id: &str) -> String {
        format!("{}/{}/requests/{request_id}", self.base(), self.app_id())
    }

    fn authorized(&self, builder: RequestBuilder, key: &SecretString) -> RequestBuilder {
        builder.header("Authorization", format!("Key {}", key.expose_secret()))
    }

    async fn submit(
        &self,
        key: &SecretString,
        request: &GenerationRequest,
    ) -> Result<QueueSubmission> {
        let body = FalInput {
            prompt: &request.prompt,
            image_urls: &request.image_urls,
        };

        tracing::debug!(
            model = %self.model,
            images = request.image_urls.len(),
            "submitting generation to fal queue"
        );

        let response = self
            .authorized(self.client.post(self.submit_url()), key)
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;

        read_json(response).await
    }

    async fn wait_for_completion(&self, key: &SecretString, status_url: &str) -> Result<()> {
        let mut logs_seen = 0;

        loop {
            let response = self
                .authorized(self.client.get(status_url), key)
                .query(&[("logs", "1")])
                .send()
                .await
                .map_err(connection_error)?;

            let status: QueueStatus = read_json(response).await?;

            for entry in status.logs.iter().skip(logs_seen) {
                tracing::info!(target: "keepsake_imagegen::fal", "{}", entry.message);
            }
            logs_seen = logs_seen.max(status.logs.len());

            match status.status {
                QueueState::InQueue => {
                    tracing::debug!(position = ?status.queue_position, "generation queued");
                }
                QueueState::InProgress => {}
                QueueState::Completed => return Ok(()),
                QueueState::Unknown => {
                    return Err(ImageGenError::MalformedResponse(
                        "unrecognized queue status".to_string(),
                    ));
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn fetch_output(&self, key: &SecretString, response_url: &str) -> Result<FalOutput> {
        let response = self
            .authorized(self.client.get(response_url), key)
            .send()
            .await
            .map_err(connection_error)?;

        read_json(response).await
    }
}

/// Submit body for image edit models
#[derive(Serialize)]
struct FalInput<'a> {
    prompt: &'a str,
    image_urls: &'a [String],
}

#[derive(Deserialize)]
struct QueueSubmission {
    request_id: String,
    #[serde(default)]
    status_url: Option<String>,
    #[serde(default)]
    response_url: Option<String>,
}

#[derive(Deserialize)]
struct QueueStatus {
    status: QueueState,
    #[serde(default)]
    queue_position: Option<u64>,
    #[serde(default)]
    logs: Vec<QueueLog>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum QueueState {
    InQueue,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
struct QueueLog {
    message: String,
}

#[derive(Deserialize)]
struct FalOutput {
    #[serde(default)]
    images: Vec<FalImage>,
}

#[derive(Deserialize)]
struct FalImage {
    #[serde(default)]
    url: Option<String>,
}

fn connection_error(e: reqwest::Error) -> ImageGenError {
    tracing::error!(error = %e, "fal request failed");
    ImageGenError::ConnectionError(e.to_string())
}

/// Check the status and decode a JSON body
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!(status = %status, body = %message, "fal API error");

        return Err(ImageGenError::ProviderApiError {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await.map_err(connection_error)?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::error!(error = %e, "failed to parse fal response");
        ImageGenError::MalformedResponse(e.to_string())
    })
}

#[async_trait]
impl ImageGenProvider for FalProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let key = self.api_key.as_ref().ok_or(ImageGenError::MissingCredential)?;

        let submission = self.submit(key, request).await?;
        let request_id = submission.request_id;

        tracing::info!(request_id = %request_id, "generation submitted");

        let status_url = submission
            .status_url
            .unwrap_or_else(|| self.status_url(&request_id));
        let response_url = submission
            .response_url
            .unwrap_or_else(|| self.response_url(&request_id));

        self.wait_for_completion(key, &status_url).await?;

        let output = self.fetch_output(key, &response_url).await?;

        let image_url = output
            .images
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| {
                tracing::error!(request_id = %request_id, "fal output carried no image URL");
                ImageGenError::NoImageInResponse
            })?;

        tracing::info!(request_id = %request_id, "generation complete");

        Ok(GenerationResult { image_url, request_id })
    }

    fn name(&self) -> &str {
        "fal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base: &str, model: &str) -> FalProvider {
        FalProvider::new(
            Client::new(),
            None,
            Url::parse(base).unwrap(),
            model.to_string(),
            Duration::from_millis(10),
        )
    }

    #[test]
    fn submit_url_joins_base_and_model() {
        let fal = provider("https://queue.fal.run/", "fal-ai/nano-banana-pro/edit");
        assert_eq!(fal.submit_url(), "https://queue.fal.run/fal-ai/nano-banana-pro/edit");
    }

    #[test]
    fn request_urls_drop_the_model_path_suffix() {
        let fal = provider("https://queue.fal.run", "fal-ai/nano-banana-pro/edit");

        assert_eq!(
            fal.status_url("abc"),
            "https://queue.fal.run/fal-ai/nano-banana-pro/requests/abc/status"
        );
        assert_eq!(
            fal.response_url("abc"),
            "https://queue.fal.run/fal-ai/nano-banana-pro/requests/abc"
        );
    }

    #[test]
    fn unknown_queue_status_is_tolerated_by_the_decoder() {
        let status: QueueStatus = serde_json::from_str(r#"{"status":"CANCELLED"}"#).unwrap();
        assert_eq!(status.status, QueueState::Unknown);
        assert!(status.logs.is_empty());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // Nothing listens on this port; reaching the network would surface as ConnectionError
        let fal = provider("http://127.0.0.1:9", "fal-ai/nano-banana-pro/edit");
        let request = GenerationRequest {
            prompt: "card".to_string(),
            image_urls: vec!["data:image/png;base64,AAAA".to_string()],
        };

        let err = fal.generate(&request).await.unwrap_err();
        assert!(matches!(err, ImageGenError::MissingCredential));
    }
}
