use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    aggregator::DerivedSeries,
    commands::LogKind,
    dashboard::DashboardState,
    models::{NotificationRecord, StatsSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Json, Self::Csv, Self::Xml, Self::Html];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
            Self::Html => "html",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Csv => "CSV",
            Self::Xml => "XML",
            Self::Html => "HTML report",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Local>,
    pub format: ExportFormat,
    pub stats: Option<StatsSnapshot>,
    pub derived: DerivedSeries,
    pub notifications: Vec<NotificationRecord>,
}

impl ExportDocument {
    pub fn capture(state: &DashboardState, format: ExportFormat) -> Self {
        Self {
            exported_at: Local::now(),
            format,
            stats: state.stats.clone(),
            derived: state.derived.clone(),
            notifications: state.notifications.iter().cloned().collect(),
        }
    }
}

pub fn render(doc: &ExportDocument) -> Result<String> {
    match doc.format {
        ExportFormat::Json => {
            serde_json::to_string_pretty(doc).context("Unable to serialize export")
        }
        ExportFormat::Csv => Ok(to_csv(doc)),
        ExportFormat::Xml => Ok(to_xml(doc)),
        ExportFormat::Html => Ok(to_html(doc)),
    }
}

/// Writes `dashboard-export-<millis>.<ext>` into `dir` and returns its path.
pub fn write_export(dir: &str, doc: &ExportDocument) -> Result<PathBuf> {
    let body = render(doc)?;
    let name = format!(
        "dashboard-export-{}.{}",
        doc.exported_at.timestamp_millis(),
        doc.format.extension()
    );
    write_file(dir, &name, body.as_bytes())
}

/// Stores a log fetched through `/download_log`.
pub fn save_download(dir: &str, kind: LogKind, body: &[u8]) -> Result<PathBuf> {
    let name = format!("{}-log-{}.log", kind.as_str(), Local::now().timestamp_millis());
    write_file(dir, &name, body)
}

fn write_file(dir: &str, name: &str, body: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Unable to create {dir}"))?;
    let path = Path::new(dir).join(name);
    fs::write(&path, body).with_context(|| format!("Unable to write {}", path.display()))?;
    Ok(path)
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn to_csv(doc: &ExportDocument) -> String {
    let ts = doc.exported_at.to_rfc3339();
    let mut out = String::from("Timestamp,Type,Value,Details\n");
    if let Some(stats) = &doc.stats {
        let counters = [
            ("attacks", stats.attacks),
            ("success", stats.success),
            ("fail", stats.fail),
            ("blocked", stats.blocked),
            ("emails_sent", stats.emails_sent),
            ("total_last_hour", stats.total_last_hour),
        ];
        for (key, value) in counters {
            let _ = writeln!(out, "{ts},stats.{key},{value},Real-time data");
        }
    }
    for (hour, count) in doc.derived.hourly.iter().enumerate() {
        let _ = writeln!(out, "{ts},hourly.{hour:02},{count},Attempts per hour");
    }
    for (ip, count) in &doc.derived.top_sources {
        let _ = writeln!(out, "{ts},source,{count},{}", csv_field(ip));
    }
    for n in &doc.notifications {
        let _ = writeln!(
            out,
            "{},notification,{},{}",
            n.timestamp.to_rfc3339(),
            n.severity.as_str(),
            csv_field(&n.message)
        );
    }
    out
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn to_xml(doc: &ExportDocument) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<dashboard-export>\n");
    let _ = writeln!(xml, "  <metadata>");
    let _ = writeln!(xml, "    <exportDate>{}</exportDate>", doc.exported_at.to_rfc3339());
    let _ = writeln!(xml, "    <format>{}</format>", doc.format.extension());
    let _ = writeln!(xml, "  </metadata>");
    if let Some(stats) = &doc.stats {
        let _ = writeln!(xml, "  <stats>");
        let _ = writeln!(xml, "    <attacks>{}</attacks>", stats.attacks);
        let _ = writeln!(xml, "    <success>{}</success>", stats.success);
        let _ = writeln!(xml, "    <fail>{}</fail>", stats.fail);
        let _ = writeln!(xml, "    <blocked>{}</blocked>", stats.blocked);
        let _ = writeln!(xml, "    <emailsSent>{}</emailsSent>", stats.emails_sent);
        let _ = writeln!(
            xml,
            "    <mostAggressiveIp>{}</mostAggressiveIp>",
            xml_escape(&stats.most_aggressive_ip)
        );
        let _ = writeln!(xml, "  </stats>");
    }
    let _ = writeln!(xml, "  <topSources>");
    for (ip, count) in &doc.derived.top_sources {
        let _ = writeln!(xml, "    <source ip=\"{}\">{count}</source>", xml_escape(ip));
    }
    let _ = writeln!(xml, "  </topSources>");
    let _ = writeln!(xml, "  <notifications>");
    for n in &doc.notifications {
        let _ = writeln!(
            xml,
            "    <notification severity=\"{}\" timestamp=\"{}\">{}</notification>",
            n.severity.as_str(),
            n.timestamp.to_rfc3339(),
            xml_escape(&n.message)
        );
    }
    let _ = writeln!(xml, "  </notifications>");
    xml.push_str("</dashboard-export>");
    xml
}

fn to_html(doc: &ExportDocument) -> String {
    let mut recent = String::new();
    for n in doc.notifications.iter().take(10) {
        let _ = writeln!(
            recent,
            "<div class=\"notification\"><strong>{}</strong> - {}<br><small>{}</small></div>",
            xml_escape(n.title.as_deref().unwrap_or("Alert")),
            xml_escape(&n.message),
            n.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    let attacks = doc.stats.as_ref().map_or(0, |s| s.attacks);
    format!(
        "<!DOCTYPE html>
<html>
<head>
<title>CrackDefend Security Report</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 20px; }}
.header {{ border-bottom: 2px solid #00ff88; padding-bottom: 10px; }}
.metric {{ display: inline-block; margin: 10px; padding: 10px; border: 1px solid #ccc; }}
</style>
</head>
<body>
<div class=\"header\"><h1>CrackDefend Security Dashboard Report</h1><p>Generated: {generated}</p></div>
<h2>Summary</h2>
<div class=\"metric\"><strong>Total Attacks:</strong> {attacks}</div>
<div class=\"metric\"><strong>Total Notifications:</strong> {count}</div>
<h2>Recent Notifications</h2>
{recent}</body>
</html>
",
        generated = doc.exported_at.format("%Y-%m-%d %H:%M:%S"),
        count = doc.notifications.len(),
    )
}
