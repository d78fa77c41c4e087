use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::models::Channel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_language: String,
    pub api: ApiConfig,
    pub polling: PollIntervals,
    pub widgets: WidgetConfig,
    pub alerts: AlertThresholds,
    pub log_path: String,
    pub export_dir: String,
    pub preferences_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

/// Fixed polling period per channel, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollIntervals {
    pub stats_ms: u64,
    pub mail_log_ms: u64,
    pub access_lists_ms: u64,
    pub users_ms: u64,
    pub passwords_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub stat_animation_ms: u64,
    pub notification_capacity: usize,
    /// Auto-dismiss delay; 0 keeps notifications until dismissed.
    pub notification_ttl_ms: u64,
    pub stale_after_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub detected_above: u64,
    pub cpu_above: f64,
    pub memory_above: f64,
    pub security_score_below: f64,
    pub connections_above: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            api: ApiConfig::default(),
            polling: PollIntervals::default(),
            widgets: WidgetConfig::default(),
            alerts: AlertThresholds::default(),
            log_path: "logs/console.log".to_string(),
            export_dir: "exports".to_string(),
            preferences_path: "config/preferences.json".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_ms: 2000,
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            stats_ms: 1500,
            mail_log_ms: 2500,
            access_lists_ms: 4000,
            users_ms: 4000,
            passwords_ms: 4000,
        }
    }
}

impl PollIntervals {
    pub fn period(&self, channel: Channel) -> Duration {
        let ms = match channel {
            Channel::Stats => self.stats_ms,
            Channel::MailLog => self.mail_log_ms,
            Channel::AccessLists => self.access_lists_ms,
            Channel::Users => self.users_ms,
            Channel::Passwords => self.passwords_ms,
        };
        // tokio's interval panics on a zero period
        Duration::from_millis(ms.max(1))
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            stat_animation_ms: 1000,
            notification_capacity: 50,
            notification_ttl_ms: 5000,
            stale_after_failures: 3,
        }
    }
}

impl WidgetConfig {
    pub fn notification_ttl(&self) -> Option<Duration> {
        (self.notification_ttl_ms > 0).then(|| Duration::from_millis(self.notification_ttl_ms))
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            detected_above: 100,
            cpu_above: 90.0,
            memory_above: 85.0,
            security_score_below: 70.0,
            connections_above: 2000,
        }
    }
}

impl AppConfig {
    pub fn load_or_create(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Unable to read config at {path}"))?;
            let parsed: Self = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {path}"))?;
            return Ok(parsed);
        }

        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }

        let default = Self::default();
        let json = serde_json::to_string_pretty(&default)?;
        fs::write(path, json).with_context(|| format!("Unable to create config at {path}"))?;
        Ok(default)
    }
}
