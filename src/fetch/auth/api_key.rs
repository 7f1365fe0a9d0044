use crate::errors::{EtlError, EtlResult};
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// Used when the exports are served from a protected endpoint; the header
/// name and value are validated once at construction.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> EtlResult<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| {
            EtlError::Config(format!("invalid header name '{header_name}': {e}"))
        })?;
        let mut value = HeaderValue::from_str(key)
            .map_err(|e| EtlError::Config(format!("invalid API key header value: {e}")))?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// Uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> EtlResult<Self> {
        Self::new(inner, "Authorization", &format!("Bearer {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_bearer_builds_authorization_header() {
        let client = ApiKey::bearer(BasicClient::new().unwrap(), "secret").unwrap();
        assert_eq!(client.header_name.as_str(), "authorization");
        assert!(client.value.is_sensitive());
    }

    #[test]
    fn test_invalid_header_name_is_config_error() {
        let result = ApiKey::new(BasicClient::new().unwrap(), "bad header", "x");
        assert!(matches!(result, Err(EtlError::Config(_))));
    }
}
