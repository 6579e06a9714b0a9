//! Consul HTTP API client

use super::StoreClient;
use crate::error::{Error, Result};
use crate::types::{AclEntry, KvEntry, PreparedQuery};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Agent address used when none is configured
pub const DEFAULT_CONSUL_ADDR: &str = "http://127.0.0.1:8500";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Marker Consul puts in the body of a 401 when ACLs are off
const ACL_DISABLED_MARKER: &str = "ACL support disabled";

/// Connection settings for the Consul agent
#[derive(Clone)]
pub struct ConsulConfig {
    /// Base URL of the agent, e.g. `http://127.0.0.1:8500`
    pub address: String,
    /// ACL token sent as `X-Consul-Token`
    pub token: Option<String>,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONSUL_ADDR.to_string(),
            token: None,
        }
    }
}

impl fmt::Debug for ConsulConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsulConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// [`StoreClient`] backed by the Consul HTTP API
pub struct ConsulClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ConsulClient {
    pub fn new(config: &ConsulConfig) -> Result<Self> {
        let address = if config.address.contains("://") {
            config.address.clone()
        } else {
            format!("http://{}", config.address)
        };

        let base = Url::parse(&address)
            .map_err(|e| Error::config(format!("invalid Consul address {}: {}", address, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::config(format!("invalid Consul address {}", address)));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::store(format!("unable to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("invalid Consul address {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn kv_endpoint(&self, key: &str) -> Result<Url> {
        self.endpoint(["v1", "kv"].into_iter().chain(key.split('/')))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.header("X-Consul-Token", token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| Error::store(format!("{}: {}", what, e)))
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(response, what).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| Error::store(format!("{}: invalid response: {}", what, e)))
    }

    async fn status_error(response: Response, what: &str) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::store(format!("{}: {} {}", what, status, body.trim()))
    }
}

/// True when a response says the cluster runs without ACLs.
fn acl_support_disabled(status: StatusCode, body: &str) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        && body.contains(ACL_DISABLED_MARKER)
}

#[async_trait]
impl StoreClient for ConsulClient {
    async fn list_kv(&self) -> Result<Vec<KvEntry>> {
        let mut url = self.endpoint(["v1", "kv", ""])?;
        url.query_pairs_mut()
            .append_key_only("recurse")
            .append_key_only("consistent");

        debug!("Listing keys: {}", url);
        let response = self
            .send(self.request(Method::GET, url), "listing keys")
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Self::read_json(response, "listing keys").await
    }

    async fn get_kv(&self, key: &str) -> Result<Option<KvEntry>> {
        let url = self.kv_endpoint(key)?;
        let what = format!("reading key {}", key);
        let response = self.send(self.request(Method::GET, url), &what).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let mut entries: Vec<KvEntry> = Self::read_json(response, &what).await?;
        Ok(entries.pop())
    }

    async fn put_kv(&self, entry: &KvEntry) -> Result<()> {
        let mut url = self.kv_endpoint(&entry.key)?;
        if entry.flags != 0 {
            url.query_pairs_mut()
                .append_pair("flags", &entry.flags.to_string());
        }

        let what = format!("writing key {}", entry.key);
        let response = self
            .send(
                self.request(Method::PUT, url).body(entry.value.clone()),
                &what,
            )
            .await?;

        let accepted: bool = Self::read_json(response, &what).await?;
        if !accepted {
            return Err(Error::store(format!("{}: write rejected", what)));
        }
        Ok(())
    }

    async fn list_prepared_queries(&self) -> Result<Vec<PreparedQuery>> {
        let mut url = self.endpoint(["v1", "query"])?;
        url.query_pairs_mut().append_key_only("consistent");

        let response = self
            .send(self.request(Method::GET, url), "listing prepared queries")
            .await?;
        Self::read_json(response, "listing prepared queries").await
    }

    async fn create_prepared_query(&self, query: &PreparedQuery) -> Result<()> {
        let url = self.endpoint(["v1", "query"])?;
        let what = format!("creating prepared query {}", query.name);
        let response = self
            .send(self.request(Method::POST, url).json(query), &what)
            .await?;

        let _created: serde_json::Value = Self::read_json(response, &what).await?;
        Ok(())
    }

    async fn list_acls(&self) -> Result<Vec<AclEntry>> {
        let mut url = self.endpoint(["v1", "acl", "list"])?;
        url.query_pairs_mut().append_key_only("consistent");

        let response = self
            .send(self.request(Method::GET, url), "listing ACLs")
            .await?;

        let status = response.status();
        if status.is_success() {
            return Self::read_json(response, "listing ACLs").await;
        }

        let body = response.text().await.unwrap_or_default();
        if acl_support_disabled(status, &body) {
            return Err(Error::AclSupportDisabled);
        }
        Err(Error::store(format!(
            "listing ACLs: {} {}",
            status,
            body.trim()
        )))
    }

    async fn create_acl(&self, acl: &AclEntry) -> Result<()> {
        let url = self.endpoint(["v1", "acl", "create"])?;
        let what = format!("creating ACL {}", acl.name);
        let response = self
            .send(self.request(Method::PUT, url).json(acl), &what)
            .await?;

        let _created: serde_json::Value = Self::read_json(response, &what).await?;
        Ok(())
    }
}

impl fmt::Debug for ConsulClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsulClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}
