//! Threshold rules evaluated once per fresh stats snapshot.
//!
//! Rules fire independently and there is no suppression window: a
//! condition that stays true raises a new alert on every poll.

use crate::{
    config::AlertThresholds,
    models::{HostSample, Severity, StatsSnapshot},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub severity: Severity,
    pub title: &'static str,
    pub message: String,
}

impl Alert {
    fn new(severity: Severity, title: &'static str, message: String) -> Self {
        Self {
            severity,
            title,
            message,
        }
    }
}

pub fn evaluate(
    snapshot: &StatsSnapshot,
    host: Option<&HostSample>,
    limits: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(detected) = snapshot.detected {
        if detected > limits.detected_above {
            alerts.push(Alert::new(
                Severity::Danger,
                "High Threat Activity",
                format!("{detected} threats detected in the last update"),
            ));
        }
    }

    let cpu = snapshot.cpu.or(host.map(|h| h.cpu));
    if let Some(cpu) = cpu {
        if cpu > limits.cpu_above {
            alerts.push(Alert::new(
                Severity::Warning,
                "High CPU Usage",
                format!("CPU usage at {cpu:.0}%"),
            ));
        }
    }

    let memory = snapshot.memory.or(host.map(|h| h.memory));
    if let Some(memory) = memory {
        if memory > limits.memory_above {
            alerts.push(Alert::new(
                Severity::Warning,
                "High Memory Usage",
                format!("Memory usage at {memory:.0}%"),
            ));
        }
    }

    if let Some(score) = snapshot.security_score {
        if score < limits.security_score_below {
            alerts.push(Alert::new(
                Severity::Danger,
                "Security Score Low",
                format!("Security score dropped to {score:.0}%"),
            ));
        }
    }

    if let Some(connections) = snapshot.connections {
        if connections > limits.connections_above {
            alerts.push(Alert::new(
                Severity::Info,
                "High Network Activity",
                format!("{connections} active connections"),
            ));
        }
    }

    alerts
}
