use crate::error::CatalogError;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = concat!("cmpdl/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over a blocking client that buckets HTTP statuses into [`CatalogError`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, CatalogError> {
        // Hung transfers are not cut off; a stuck request blocks the run.
        let inner = Client::builder()
            .user_agent(user_agent)
            .timeout(None)
            .build()
            .map_err(CatalogError::Client)?;
        Ok(Self { inner })
    }

    pub fn get(&self, url: &str) -> Result<Response, CatalogError> {
        self.send(url, &[])
    }

    pub fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        let response = self.get(url)?;
        response.text().map_err(|source| CatalogError::Transport {
            url: url.to_string(),
            source,
        })
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        self.get_json_with_query(url, &[])
    }

    pub fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let response = self.send(url, query)?;
        let body = response.text().map_err(|source| CatalogError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| CatalogError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response, CatalogError> {
        debug!(url, ?query, "GET");
        let mut request = self.inner.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().map_err(|source| CatalogError::Transport {
            url: url.to_string(),
            source,
        })?;
        check_status(url, response.status())?;
        Ok(response)
    }
}

pub fn check_status(url: &str, status: StatusCode) -> Result<(), CatalogError> {
    if status == StatusCode::NOT_FOUND {
        return Err(CatalogError::NotFound(url.to_string()));
    }
    if status.is_server_error() {
        return Err(CatalogError::ServerError {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    if status.is_client_error() {
        return Err(CatalogError::ClientError {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}
