//! Remote browser fleet spoken to over JSON/HTTP.
//!
//! # Protocol
//!
//! ```text
//! GET    /sessions                                  -> [{sessionId, connectionId?}]
//! POST   /sessions              {keepAlive?}        -> {sessionId, connectionId}
//! POST   /sessions/{id}/connect                     -> {connectionId}   (409 if taken)
//! DELETE /sessions/{id}                             terminate instance
//! DELETE /connections/{conn}                        disconnect, instance lives on
//! POST   /connections/{conn}/pages                  -> {pageId}
//! POST   /connections/{conn}/pages/{page}/goto {url}
//! GET    /connections/{conn}/pages/{page}/text      -> {text}
//! POST   /connections/{conn}/pages/{page}/links {selector} -> {hrefs}
//! DELETE /connections/{conn}/pages/{page}
//! ```
//!
//! Ids are percent-encoded into their path segment.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use pipeline::{Browser, BrowserFleet, LaunchOptions, Page, Session};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use urlencoding::encode;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("browser fleet request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("browser fleet returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("session {0} already has a connected client")]
    SessionTaken(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    session_id: String,
    #[serde(default)]
    connection_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Launched {
    session_id: String,
    connection_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connected {
    connection_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenedPage {
    page_id: String,
}

#[derive(Debug, Deserialize)]
struct PageText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    hrefs: Vec<String>,
}

/// Shared HTTP plumbing for the fleet, its browsers and pages.
struct FleetHttp {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl FleetHttp {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, FleetError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FleetError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FleetError> {
        Ok(self.send(builder).await?.json().await?)
    }
}

#[derive(Clone)]
pub struct HttpBrowserFleet {
    http: Arc<FleetHttp>,
}

impl HttpBrowserFleet {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: Arc::new(FleetHttp {
                client: reqwest::Client::new(),
                base_url: base_url.into().trim_end_matches('/').to_string(),
                token,
            }),
        }
    }

    fn browser(&self, session_id: String, connection_id: String) -> Box<dyn Browser> {
        Box::new(HttpBrowser {
            http: self.http.clone(),
            session_id,
            connection_id,
        })
    }
}

#[async_trait]
impl BrowserFleet for HttpBrowserFleet {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let sessions: Vec<SessionInfo> = self
            .http
            .json(self.http.request(Method::GET, "/sessions"))
            .await?;
        Ok(sessions
            .into_iter()
            .map(|s| Session {
                id: s.session_id,
                busy: s.connection_id.is_some(),
            })
            .collect())
    }

    async fn connect(&self, session_id: &str) -> Result<Box<dyn Browser>> {
        let request = self
            .http
            .request(Method::POST, &format!("/sessions/{}/connect", encode(session_id)));
        let connected: Connected = match self.http.json(request).await {
            Ok(connected) => connected,
            Err(FleetError::Api { status: 409, .. }) => {
                return Err(FleetError::SessionTaken(session_id.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };
        debug!(session_id = %session_id, connection_id = %connected.connection_id, "connected to browser session");
        Ok(self.browser(session_id.to_string(), connected.connection_id))
    }

    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn Browser>> {
        let body = LaunchRequest {
            keep_alive: options.keep_alive.map(|d| d.as_millis() as u64),
        };
        let launched: Launched = self
            .http
            .json(self.http.request(Method::POST, "/sessions").json(&body))
            .await?;
        Ok(self.browser(launched.session_id, launched.connection_id))
    }
}

struct HttpBrowser {
    http: Arc<FleetHttp>,
    session_id: String,
    connection_id: String,
}

#[async_trait]
impl Browser for HttpBrowser {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn new_page(&self) -> Result<Box<dyn Page>> {
        let opened: OpenedPage = self
            .http
            .json(
                self.http
                    .request(Method::POST, &format!("/connections/{}/pages", encode(&self.connection_id))),
            )
            .await?;
        Ok(Box::new(HttpPage {
            http: self.http.clone(),
            path: format!(
                "/connections/{}/pages/{}",
                encode(&self.connection_id),
                encode(&opened.page_id)
            ),
        }))
    }

    async fn disconnect(self: Box<Self>) -> Result<()> {
        self.http
            .send(
                self.http
                    .request(Method::DELETE, &format!("/connections/{}", encode(&self.connection_id))),
            )
            .await?;
        Ok(())
    }

    async fn terminate(self: Box<Self>) -> Result<()> {
        self.http
            .send(
                self.http
                    .request(Method::DELETE, &format!("/sessions/{}", encode(&self.session_id))),
            )
            .await?;
        Ok(())
    }
}

struct HttpPage {
    http: Arc<FleetHttp>,
    path: String,
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.http
            .send(
                self.http
                    .request(Method::POST, &format!("{}/goto", self.path))
                    .json(&serde_json::json!({ "url": url })),
            )
            .await?;
        Ok(())
    }

    async fn extract_text(&self) -> Result<String> {
        let text: PageText = self
            .http
            .json(self.http.request(Method::GET, &format!("{}/text", self.path)))
            .await?;
        Ok(text.text)
    }

    async fn extract_links(&self, selector: &str) -> Result<Vec<String>> {
        let links: PageLinks = self
            .http
            .json(
                self.http
                    .request(Method::POST, &format!("{}/links", self.path))
                    .json(&serde_json::json!({ "selector": selector })),
            )
            .await?;
        Ok(links.hrefs)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.http
            .send(self.http.request(Method::DELETE, &self.path))
            .await?;
        Ok(())
    }
}
