use genwatch_core::{Job, JobId};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::{ApiError, ClientSettings, FailureKind};

/// REST surface the session needs. Implemented over HTTP by [`ReqwestJobApi`].
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// The user's current generation, if any. May already be terminal.
    async fn active_job(&self) -> Result<Option<Job>, ApiError>;

    async fn history(&self, page: u32, limit: u32) -> Result<Vec<Job>, ApiError>;

    async fn job(&self, job_id: &JobId) -> Result<Job, ApiError>;

    async fn publish(&self, job_id: &JobId) -> Result<(), ApiError>;

    async fn set_like(&self, publication_id: &str, liked: bool) -> Result<(), ApiError>;

    async fn set_follow(&self, user_id: &str, following: bool) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestJobApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            base: settings.api_base_url.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base.as_str().trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn send(&self, method: Method, url: Url) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status_message(status),
            ));
        }
        Ok(response)
    }

    async fn get_data<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.send(Method::GET, url).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn active_job(&self) -> Result<Option<Job>, ApiError> {
        self.get_data(self.endpoint("job/active")?).await
    }

    async fn history(&self, page: u32, limit: u32) -> Result<Vec<Job>, ApiError> {
        let mut url = self.endpoint("job/history")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        self.get_data(url).await
    }

    async fn job(&self, job_id: &JobId) -> Result<Job, ApiError> {
        let url = self.endpoint(&format!("job/jobs/{}", job_id.as_str()))?;
        self.get_data(url).await
    }

    async fn publish(&self, job_id: &JobId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("job/{}/publish", job_id.as_str()))?;
        self.send(Method::POST, url).await.map(drop)
    }

    async fn set_like(&self, publication_id: &str, liked: bool) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("publications/{publication_id}/like"))?;
        self.send(toggle_method(liked), url).await.map(drop)
    }

    async fn set_follow(&self, user_id: &str, following: bool) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("users/{user_id}/follow"))?;
        self.send(toggle_method(following), url).await.map(drop)
    }
}

fn toggle_method(on: bool) -> Method {
    if on {
        Method::POST
    } else {
        Method::DELETE
    }
}

fn status_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.to_string(), ToOwned::to_owned)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
