use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One independently polled data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Stats,
    MailLog,
    AccessLists,
    Users,
    Passwords,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Stats,
        Channel::MailLog,
        Channel::AccessLists,
        Channel::Users,
        Channel::Passwords,
    ];

    /// Read endpoints polled for this channel, in request order.
    pub fn endpoints(&self) -> &'static [&'static str] {
        match self {
            Self::Stats => &["/stats"],
            Self::MailLog => &["/mailhog"],
            Self::AccessLists => &["/blocked", "/whitelist"],
            Self::Users => &["/users"],
            Self::Passwords => &["/passwords"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::MailLog => "mail_log",
            Self::AccessLists => "access_lists",
            Self::Users => "users",
            Self::Passwords => "passwords",
        }
    }
}

/// Security posture shown by the status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Green,
    Yellow,
    Red,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Green
        } else if score >= 60.0 {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "SECURE",
            Self::Yellow => "CAUTION",
            Self::Red => "ALERT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttackStatus {
    Blocked,
    Success,
    Fail,
}

impl AttackStatus {
    pub const ALL: [AttackStatus; 3] = [Self::Blocked, Self::Success, Self::Fail];

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "BLOCKED" => Some(Self::Blocked),
            "SUCCESS" => Some(Self::Success),
            "FAIL" => Some(Self::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocked => "BLOCKED",
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
        }
    }
}

/// One row of the server's `recent` list. `status` is kept verbatim so
/// values outside the known three survive into the events table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEvent {
    pub time: String,
    pub user: String,
    pub ip: String,
    #[serde(default)]
    pub pwd: Option<String>,
    pub status: String,
}

impl AttackEvent {
    pub fn status_kind(&self) -> Option<AttackStatus> {
        AttackStatus::from_wire(&self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub attacks: u64,
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub fail: u64,
    #[serde(default)]
    pub blocked: u64,
    #[serde(default)]
    pub emails_sent: u64,
    #[serde(default)]
    pub total_last_hour: u64,
    #[serde(default)]
    pub most_targeted_email: String,
    #[serde(default)]
    pub most_used_pwd: String,
    #[serde(default)]
    pub most_aggressive_ip: String,
    #[serde(default)]
    pub geoip_country: String,
    #[serde(default)]
    pub geoip_city: String,
    #[serde(default)]
    pub recent: Vec<AttackEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<u64>,
}

impl StatsSnapshot {
    pub fn aggressor_location(&self) -> String {
        format!("{}, {}", self.geoip_country, self.geoip_city)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailEntry {
    pub time: String,
    pub to: String,
    pub subject: String,
}

/// `/mailhog` answers `{emails: [...]}`; older builds returned the bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MailPayload {
    Wrapped { emails: Vec<MailEntry> },
    Bare(Vec<MailEntry>),
}

impl MailPayload {
    pub fn into_entries(self) -> Vec<MailEntry> {
        match self {
            Self::Wrapped { emails } => emails,
            Self::Bare(emails) => emails,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockedPayload {
    #[serde(default)]
    pub blocked: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhitelistPayload {
    #[serde(default)]
    pub whitelist: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersPayload {
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordsPayload {
    #[serde(default)]
    pub passwords: Vec<String>,
}

/// Complete payload of one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSnapshot {
    Stats(StatsSnapshot),
    MailLog(Vec<MailEntry>),
    AccessLists {
        blocked: Vec<String>,
        whitelist: Vec<String>,
    },
    Users(Vec<String>),
    Passwords(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Info, Self::Success, Self::Warning, Self::Danger];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub title: Option<String>,
    pub timestamp: DateTime<Local>,
}

/// Latest sample of the console host, see `probe`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSample {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_snapshot_tolerates_lab_payload() {
        let body = r#"{
            "attacks": 3, "success": 1, "fail": 2, "blocked": 1, "emails_sent": 0,
            "recent": [{"time": "10:01:02", "user": "bob", "ip": "10.0.0.1", "pwd": "x", "status": "FAIL"},
                       {"time": "10:01:03", "user": "eve", "ip": "10.0.0.2", "status": "SUCCESS"}],
            "most_targeted_email": "bob", "most_used_pwd": "x", "most_aggressive_ip": "10.0.0.1",
            "geoip_country": "N/A", "geoip_city": "N/A", "total_last_hour": 3,
            "hourly_attempts": [0,0,0,0,0,0,0,0,0,0,3,0,0,0,0,0,0,0,0,0,0,0,0,0],
            "per_ip": [["10.0.0.1", 2]]
        }"#;
        let snap: StatsSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snap.attacks, 3);
        assert_eq!(snap.recent.len(), 2);
        assert_eq!(snap.recent[1].pwd, None);
        assert_eq!(snap.detected, None);
        assert_eq!(snap.aggressor_location(), "N/A, N/A");
    }

    #[test]
    fn mail_payload_accepts_both_shapes() {
        let wrapped: MailPayload =
            serde_json::from_str(r#"{"emails":[{"time":"10:00:00","to":"a@b","subject":"hi"}]}"#)
                .unwrap();
        let bare: MailPayload =
            serde_json::from_str(r#"[{"time":"10:00:00","to":"a@b","subject":"hi"}]"#).unwrap();
        assert_eq!(wrapped.into_entries(), bare.into_entries());
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Green);
        assert_eq!(RiskLevel::from_score(79.9), RiskLevel::Yellow);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::Yellow);
        assert_eq!(RiskLevel::from_score(12.0), RiskLevel::Red);
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let ev: AttackEvent = serde_json::from_str(
            r#"{"time":"01:00:00","user":"u","ip":"1.1.1.1","status":"LOCKED"}"#,
        )
        .unwrap();
        assert_eq!(ev.status, "LOCKED");
        assert_eq!(ev.status_kind(), None);
    }
}
