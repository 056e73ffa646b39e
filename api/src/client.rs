use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{IntoUrl, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::{
    ApiError, Backend, Result, StartSession,
    types::{Analysis, FullResults, LogEntry, OnlinePeers, SessionList, StartedSession},
};

/// [`Backend`] implementation talking JSON over HTTP.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Creates a new `HttpBackend`.
    ///
    /// # Arguments
    /// * `base_url` - The backend's root url, trailing slashes are ignored.
    /// * `token` - The bearer token of the logged in user, if any.
    /// * `timeout` - An optional per-request timeout, requests wait forever otherwise.
    ///
    /// # Errors
    /// Returns `Transport` if the underlying http client cannot be built.
    pub fn new(base_url: &str, token: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Builds `{base}/sessions/{session_id}/{action}`, percent-encoding the id.
    fn session_url(&self, session_id: &str, action: &str) -> Result<Url> {
        let invalid = || ApiError::InvalidRequest(format!("bad base url: {}", self.base_url));

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(["sessions", session_id, action]);
        Ok(url)
    }

    /// Attaches the bearer token, a missing token means the session is gone.
    fn auth(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_ref().ok_or(ApiError::SessionExpired)?;
        Ok(req.bearer_auth(token))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = self.auth(req)?.send().await?;
        let status = resp.status();
        debug!("backend answered {status} for {}", resp.url().path());

        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn get<T: DeserializeOwned>(&self, url: impl IntoUrl) -> Result<T> {
        let resp = self.send(self.http.get(url)).await?;
        Ok(resp.json().await?)
    }

    async fn post<T: DeserializeOwned>(&self, url: impl IntoUrl) -> Result<T> {
        let resp = self.send(self.http.post(url)).await?;
        Ok(resp.json().await?)
    }

    async fn post_empty(&self, path: &str) -> Result<()> {
        self.send(self.http.post(self.url(path))).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_sessions(&self) -> Result<SessionList> {
        self.get(self.url("/sessions")).await
    }

    async fn join_network(&self) -> Result<()> {
        self.post_empty("/network/join").await
    }

    async fn leave_network(&self) -> Result<()> {
        self.post_empty("/network/leave").await
    }

    async fn start_session(&self, req: StartSession) -> Result<String> {
        let form = req.into_form()?;
        let req = self.http.post(self.url("/sessions/start")).multipart(form);
        let started: StartedSession = self.send(req).await?.json().await?;
        Ok(started.session_uid)
    }

    async fn fetch_full_results(&self, session_id: &str) -> Result<FullResults> {
        self.get(self.session_url(session_id, "results")?).await
    }

    async fn online_peers(&self) -> Result<u64> {
        let peers: OnlinePeers = self.get(self.url("/network/online-peers")).await?;
        Ok(peers.online_peers)
    }

    async fn fetch_logs(&self, session_id: &str) -> Result<Vec<LogEntry>> {
        self.get(self.session_url(session_id, "logs")?).await
    }

    async fn analyze_results(&self, session_id: &str) -> Result<String> {
        let analysis: Analysis = self.post(self.session_url(session_id, "analyze")?).await?;
        Ok(analysis.analysis)
    }
}
