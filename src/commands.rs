//! Operator actions and their dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    fetcher::{Backend, CommandReply},
    logger::AuditLog,
    models::Channel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Email,
    Password,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Attack,
    Defense,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defense => "defense",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartModule(String),
    StopModule(String),
    AddWhitelistIp { ip: String },
    RemoveWhitelistIp { ip: String },
    BlockUser { user: String },
    UnblockUser { user: String },
    WhitelistUser { user: String },
    AddUser { username: String, password: String },
    AddPassword { password: String },
    SetAttackSpeed { speed: f64 },
    UploadList {
        kind: ListKind,
        file_name: String,
        contents: Vec<u8>,
    },
    ResetStats,
    DownloadLog { kind: LogKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Wire shape of a command, independent of the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart {
        fields: Vec<(&'static str, String)>,
        file_name: String,
        contents: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl CommandRequest {
    fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    fn post_json(path: &str, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.to_string(),
            query: Vec::new(),
            body: RequestBody::Json(body),
        }
    }
}

impl Command {
    /// Destructive or irreversible actions need an explicit yes first.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::RemoveWhitelistIp { .. } | Self::ResetStats)
    }

    /// Channels whose rendered state this action changes.
    pub fn affected_channels(&self) -> Vec<Channel> {
        match self {
            Self::AddWhitelistIp { .. }
            | Self::RemoveWhitelistIp { .. }
            | Self::BlockUser { .. }
            | Self::UnblockUser { .. }
            | Self::WhitelistUser { .. } => vec![Channel::AccessLists],
            Self::AddUser { .. } => vec![Channel::Users],
            Self::AddPassword { .. } => vec![Channel::Passwords],
            Self::UploadList { kind, .. } => match kind {
                ListKind::Email => vec![Channel::Users],
                ListKind::Password => vec![Channel::Passwords],
            },
            Self::ResetStats => vec![Channel::Stats, Channel::AccessLists],
            Self::StartModule(_)
            | Self::StopModule(_)
            | Self::SetAttackSpeed { .. }
            | Self::DownloadLog { .. } => Vec::new(),
        }
    }

    pub fn request(&self) -> CommandRequest {
        match self {
            Self::StartModule(name) => CommandRequest::get(format!("/start/{name}")),
            Self::StopModule(name) => CommandRequest::get(format!("/stop/{name}")),
            Self::AddWhitelistIp { ip } => {
                CommandRequest::post_json("/add_whitelist_ip", json!({ "ip": ip }))
            }
            Self::RemoveWhitelistIp { ip } => {
                CommandRequest::post_json("/remove_whitelist_ip", json!({ "ip": ip }))
            }
            Self::BlockUser { user } => {
                CommandRequest::post_json("/block_user", json!({ "user": user }))
            }
            Self::UnblockUser { user } => CommandRequest {
                query: vec![("user", user.clone())],
                ..CommandRequest::get("/unblock")
            },
            Self::WhitelistUser { user } => {
                CommandRequest::post_json("/whitelist_user", json!({ "user": user }))
            }
            Self::AddUser { username, password } => CommandRequest::post_json(
                "/add_user",
                json!({ "username": username, "password": password }),
            ),
            Self::AddPassword { password } => {
                CommandRequest::post_json("/add_password", json!({ "password": password }))
            }
            Self::SetAttackSpeed { speed } => {
                CommandRequest::post_json("/set_attack_speed", json!({ "speed": speed }))
            }
            Self::UploadList {
                kind,
                file_name,
                contents,
            } => CommandRequest {
                method: Method::Post,
                path: "/upload_list".to_string(),
                query: Vec::new(),
                body: RequestBody::Multipart {
                    fields: vec![("type", kind.as_str().to_string())],
                    file_name: file_name.clone(),
                    contents: contents.clone(),
                },
            },
            Self::ResetStats => CommandRequest {
                method: Method::Post,
                ..CommandRequest::get("/reset_stats")
            },
            Self::DownloadLog { kind } => CommandRequest {
                query: vec![("type", kind.as_str().to_string())],
                ..CommandRequest::get("/download_log")
            },
        }
    }

    /// One-line description for prompts and the audit log. Secrets are elided.
    pub fn describe(&self) -> String {
        match self {
            Self::StartModule(name) => format!("start module {name}"),
            Self::StopModule(name) => format!("stop module {name}"),
            Self::AddWhitelistIp { ip } => format!("whitelist address {ip}"),
            Self::RemoveWhitelistIp { ip } => format!("remove {ip} from the whitelist"),
            Self::BlockUser { user } => format!("block {user}"),
            Self::UnblockUser { user } => format!("unblock {user}"),
            Self::WhitelistUser { user } => format!("whitelist {user}"),
            Self::AddUser { username, .. } => format!("add user {username}"),
            Self::AddPassword { .. } => "add a dictionary password".to_string(),
            Self::SetAttackSpeed { speed } => format!("set attack speed to {speed}"),
            Self::UploadList {
                kind, file_name, ..
            } => format!("upload {} list {file_name}", kind.as_str()),
            Self::ResetStats => "reset all statistics".to_string(),
            Self::DownloadLog { kind } => format!("download {} log", kind.as_str()),
        }
    }
}

/// Result of a finished command, whatever its outcome.
#[derive(Debug)]
pub struct CommandCompletion {
    pub command: Command,
    pub result: Result<CommandReply, FetchError>,
}

impl CommandCompletion {
    /// Whether `/reset_stats` acknowledged with `{"status": "reset"}`.
    pub fn confirmed_reset(&self) -> bool {
        matches!(self.command, Command::ResetStats)
            && self
                .result
                .as_ref()
                .ok()
                .and_then(|reply| reply.status_field())
                .is_some_and(|s| s == "reset")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Dispatched,
    AwaitingConfirmation,
}

pub struct CommandDispatcher<B: Backend> {
    backend: Arc<B>,
    runtime: Handle,
    completions: mpsc::UnboundedSender<CommandCompletion>,
    pending: Option<Command>,
    audit: Option<AuditLog>,
}

impl<B: Backend> CommandDispatcher<B> {
    pub fn new(
        backend: Arc<B>,
        runtime: Handle,
        completions: mpsc::UnboundedSender<CommandCompletion>,
        audit: Option<AuditLog>,
    ) -> Self {
        Self {
            backend,
            runtime,
            completions,
            pending: None,
            audit,
        }
    }

    pub fn submit(&mut self, command: Command) -> Submission {
        if command.requires_confirmation() {
            debug!(action = %command.describe(), "awaiting confirmation");
            self.pending = Some(command);
            return Submission::AwaitingConfirmation;
        }
        self.dispatch(command);
        Submission::Dispatched
    }

    pub fn pending(&self) -> Option<&Command> {
        self.pending.as_ref()
    }

    /// Issues the pending command, if any.
    pub fn confirm(&mut self) -> bool {
        match self.pending.take() {
            Some(command) => {
                self.dispatch(command);
                true
            }
            None => false,
        }
    }

    /// Drops the pending command without contacting the backend.
    pub fn decline(&mut self) -> Option<Command> {
        let dropped = self.pending.take();
        if let Some(cmd) = &dropped {
            debug!(action = %cmd.describe(), "confirmation declined");
        }
        dropped
    }

    fn dispatch(&self, command: Command) {
        let description = command.describe();
        info!(action = %description, "dispatching command");
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.record(&description) {
                warn!("audit log write failed: {e:#}");
            }
        }

        let backend = Arc::clone(&self.backend);
        let completions = self.completions.clone();
        self.runtime.spawn(async move {
            let result = backend.execute(&command).await;
            if let Err(e) = &result {
                debug!(error = %e, "command request failed");
            }
            let _ = completions.send(CommandCompletion { command, result });
        });
    }
}
