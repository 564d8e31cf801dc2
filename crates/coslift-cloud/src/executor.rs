use std::time::Duration;

use crate::transport::TransportError;

/// Timeout for IAM token exchange and status notifications.
pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Abstraction over HTTP execution for testability.
///
/// Production code uses [`ReqwestExecutor`], tests use mockall-generated mocks.
/// Any non-2xx response is returned as [`TransportError::Status`].
#[allow(async_fn_in_trait)]
pub trait HttpExecutor: Send + Sync {
    /// POST a form-encoded body and return the response body.
    /// Bounded by [`EXCHANGE_TIMEOUT`].
    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<String, TransportError>;

    /// POST a JSON body with bearer authorization.
    /// Bounded by [`EXCHANGE_TIMEOUT`].
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<(), TransportError>;

    /// PUT a body. No client-side timeout.
    async fn put(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// DELETE a resource.
    async fn delete(&self, url: &str, headers: &[(String, String)]) -> Result<(), TransportError>;
}

impl<T: HttpExecutor> HttpExecutor for &T {
    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<String, TransportError> {
        (**self).post_form(url, form).await
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<(), TransportError> {
        (**self).post_json(url, bearer, body).await
    }

    async fn put(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<(), TransportError> {
        (**self).put(url, headers, body).await
    }

    async fn delete(&self, url: &str, headers: &[(String, String)]) -> Result<(), TransportError> {
        (**self).delete(url, headers).await
    }
}

/// Real HTTP executor backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        let response = request.send().await.map_err(|e| TransportError::Request {
            url: url.to_owned(),
            source: e,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("<unreadable response body: {e}>"),
        };
        Err(TransportError::Status {
            url: url.to_owned(),
            status: status.as_u16(),
            body,
        })
    }
}

fn with_headers(
    mut request: reqwest::RequestBuilder,
    headers: &[(String, String)],
) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    request
}

impl HttpExecutor for ReqwestExecutor {
    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<String, TransportError> {
        let request = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .timeout(EXCHANGE_TIMEOUT);

        let response = self.send(url, request).await?;
        response.text().await.map_err(|e| TransportError::Request {
            url: url.to_owned(),
            source: e,
        })
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<(), TransportError> {
        let request = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .timeout(EXCHANGE_TIMEOUT);

        self.send(url, request).await?;
        Ok(())
    }

    async fn put(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<(), TransportError> {
        let request = with_headers(self.client.put(url), headers).body(body);
        self.send(url, request).await?;
        Ok(())
    }

    async fn delete(&self, url: &str, headers: &[(String, String)]) -> Result<(), TransportError> {
        let request = with_headers(self.client.delete(url), headers);
        self.send(url, request).await?;
        Ok(())
    }
}
