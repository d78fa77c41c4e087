//! HTTP access to the lab backend.

use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    commands::{Command, CommandRequest, Method, RequestBody},
    error::FetchError,
    models::{
        BlockedPayload, Channel, ChannelSnapshot, MailPayload, PasswordsPayload, StatsSnapshot,
        UsersPayload, WhitelistPayload,
    },
};

/// Raw answer to a mutation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl CommandReply {
    /// `status` field of a JSON acknowledgement such as `{"status": "reset"}`.
    pub fn status_field(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        value.get("status")?.as_str().map(str::to_string)
    }
}

/// Seam between the scheduler/dispatcher and the network.
pub trait Backend: Send + Sync + 'static {
    fn fetch(
        &self,
        channel: Channel,
    ) -> impl Future<Output = Result<ChannelSnapshot, FetchError>> + Send;

    fn execute(
        &self,
        command: &Command,
    ) -> impl Future<Output = Result<CommandReply, FetchError>> + Send;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                path: path.to_string(),
                source,
            })?;
        let body = read_success(path, response).await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

async fn read_success(path: &str, response: Response) -> Result<Vec<u8>, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            path: path.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|source| FetchError::Transport {
            path: path.to_string(),
            source,
        })?;
    Ok(bytes.to_vec())
}

impl Backend for ApiClient {
    async fn fetch(&self, channel: Channel) -> Result<ChannelSnapshot, FetchError> {
        debug!(channel = channel.as_str(), "polling");
        let snapshot = match channel {
            Channel::Stats => ChannelSnapshot::Stats(self.get_json::<StatsSnapshot>("/stats").await?),
            Channel::MailLog => {
                let payload: MailPayload = self.get_json("/mailhog").await?;
                ChannelSnapshot::MailLog(payload.into_entries())
            }
            Channel::AccessLists => {
                // both halves must succeed or the channel keeps its old state
                let (blocked, whitelist) = tokio::try_join!(
                    self.get_json::<BlockedPayload>("/blocked"),
                    self.get_json::<WhitelistPayload>("/whitelist"),
                )?;
                ChannelSnapshot::AccessLists {
                    blocked: blocked.blocked,
                    whitelist: whitelist.whitelist,
                }
            }
            Channel::Users => {
                let payload: UsersPayload = self.get_json("/users").await?;
                ChannelSnapshot::Users(payload.users)
            }
            Channel::Passwords => {
                let payload: PasswordsPayload = self.get_json("/passwords").await?;
                ChannelSnapshot::Passwords(payload.passwords)
            }
        };
        Ok(snapshot)
    }

    async fn execute(&self, command: &Command) -> Result<CommandReply, FetchError> {
        let CommandRequest {
            method,
            path,
            query,
            body,
        } = command.request();

        let mut request = match method {
            Method::Get => self.http.get(self.url(&path)),
            Method::Post => self.http.post(self.url(&path)),
        };
        if !query.is_empty() {
            request = request.query(&query);
        }
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart {
                fields,
                file_name,
                contents,
            } => {
                let mut form = multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                form = form.part("file", multipart::Part::bytes(contents).file_name(file_name));
                request.multipart(form)
            }
        };

        let response = request.send().await.map_err(|source| FetchError::Transport {
            path: path.clone(),
            source,
        })?;
        let status = response.status().as_u16();
        let body = read_success(&path, response).await?;
        Ok(CommandReply { status, body })
    }
}
