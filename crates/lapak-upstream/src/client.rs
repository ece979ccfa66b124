//! Shared request plumbing for the catalog and identity clients.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use lapak_core::CallerId;

use crate::credentials::InternalCredentials;
use crate::error::{UpstreamError, UpstreamResult};

/// Longest error body kept in `UpstreamError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// One collaborating service: base URL, HTTP client and credentials.
#[derive(Debug, Clone)]
pub(crate) struct ServiceClient {
    service: &'static str,
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<InternalCredentials>,
}

impl ServiceClient {
    pub(crate) fn new(
        service: &'static str,
        http: reqwest::Client,
        base_url: Url,
        credentials: Arc<InternalCredentials>,
    ) -> Self {
        Self {
            service,
            http,
            base_url,
            credentials,
        }
    }

    /// `base_url` + percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> UpstreamResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        caller: &CallerId,
    ) -> UpstreamResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(service = self.service, %method, %url, "Upstream request");
        Ok(self
            .http
            .request(method, url)
            .headers(self.credentials.headers_for(caller)?))
    }

    /// GET a JSON resource. 404 becomes `NotFound { resource, id }`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        resource: &'static str,
        id: &str,
        caller: &CallerId,
    ) -> UpstreamResult<T> {
        let response = self.send(self.request(Method::GET, segments, caller)?, resource, id).await?;
        response.json::<T>().await.map_err(|e| UpstreamError::Decode {
            service: self.service,
            message: e.to_string(),
        })
    }

    /// POST a JSON body, ignoring the response body.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
        resource: &'static str,
        id: &str,
        caller: &CallerId,
    ) -> UpstreamResult<()> {
        let request = self.request(Method::POST, segments, caller)?.json(body);
        self.send(request, resource, id).await?;
        Ok(())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        resource: &'static str,
        id: &str,
    ) -> UpstreamResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(self.service, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::not_found(resource, id));
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(UpstreamError::Status {
                service: self.service,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}
