//! External URL catalog adapter.
//!
//! The streaming portal references managed files by path. After a publish
//! the old path must be remapped to the new one there, but the catalog is
//! not part of this system's state: remap failures are logged and never
//! affect the job's own record.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::CatalogConfig;

/// Boundary to the external catalog.
#[async_trait]
pub trait UrlCatalog: Send + Sync {
    /// Replace references to `old_path` with `new_path`.
    async fn remap_url(&self, old_path: &str, new_path: &str) -> mf_core::Result<()>;
}

/// Catalog client speaking the portal's HTTP remap endpoint.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }
}

#[async_trait]
impl UrlCatalog for HttpCatalog {
    async fn remap_url(&self, old_path: &str, new_path: &str) -> mf_core::Result<()> {
        let url = format!("{}/files/remap", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "old_path": old_path,
            "new_path": new_path,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            mf_core::Error::tool("catalog", format!("remap request failed: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(mf_core::Error::tool(
                "catalog",
                format!("remap returned {}", response.status()),
            ));
        }

        Ok(())
    }
}

/// Catalog stand-in for deployments without a portal.
pub struct NoopCatalog;

#[async_trait]
impl UrlCatalog for NoopCatalog {
    async fn remap_url(&self, _old_path: &str, _new_path: &str) -> mf_core::Result<()> {
        Ok(())
    }
}

/// Build the catalog adapter the configuration asks for.
pub fn from_config(config: &CatalogConfig) -> Arc<dyn UrlCatalog> {
    if config.enabled {
        Arc::new(HttpCatalog::new(
            config.base_url.clone(),
            config.token.clone(),
        ))
    } else {
        Arc::new(NoopCatalog)
    }
}
