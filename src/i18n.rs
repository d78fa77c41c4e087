use crate::{
    models::{Channel, RiskLevel, Severity},
    widgets::ProgressTier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    De,
}

impl Language {
    pub fn from_config(s: &str) -> Self {
        if s.eq_ignore_ascii_case("de") {
            Self::De
        } else {
            Self::En
        }
    }
}

pub fn tr(lang: Language, en: &'static str, de: &'static str) -> &'static str {
    match lang {
        Language::En => en,
        Language::De => de,
    }
}

pub fn posture_label(lang: Language, level: RiskLevel) -> &'static str {
    match lang {
        Language::En => level.as_str(),
        Language::De => match level {
            RiskLevel::Green => "SICHER",
            RiskLevel::Yellow => "VORSICHT",
            RiskLevel::Red => "ALARM",
        },
    }
}

pub fn severity_label(lang: Language, severity: Severity) -> &'static str {
    match (severity, lang) {
        (Severity::Info, Language::En) => "Info",
        (Severity::Info, Language::De) => "Info",
        (Severity::Success, Language::En) => "Success",
        (Severity::Success, Language::De) => "Erfolg",
        (Severity::Warning, Language::En) => "Warning",
        (Severity::Warning, Language::De) => "Warnung",
        (Severity::Danger, Language::En) => "Danger",
        (Severity::Danger, Language::De) => "Gefahr",
    }
}

pub fn channel_label(lang: Language, channel: Channel) -> &'static str {
    match lang {
        Language::En => match channel {
            Channel::Stats => "Statistics",
            Channel::MailLog => "Mail log",
            Channel::AccessLists => "Block & whitelist",
            Channel::Users => "Target users",
            Channel::Passwords => "Password dictionary",
        },
        Language::De => match channel {
            Channel::Stats => "Statistik",
            Channel::MailLog => "Mail-Protokoll",
            Channel::AccessLists => "Sperr- & Freigabeliste",
            Channel::Users => "Zielkonten",
            Channel::Passwords => "Passwortliste",
        },
    }
}

pub fn counter_label(lang: Language, key: &str) -> &'static str {
    match (key, lang) {
        ("attacks", Language::En) => "Total attempts",
        ("attacks", Language::De) => "Versuche gesamt",
        ("success", Language::En) => "Successful",
        ("success", Language::De) => "Erfolgreich",
        ("fail", Language::En) => "Failed",
        ("fail", Language::De) => "Fehlgeschlagen",
        ("blocked", Language::En) => "Blocked",
        ("blocked", Language::De) => "Blockiert",
        ("emails_sent", Language::En) => "Alert mails",
        ("emails_sent", Language::De) => "Alarm-Mails",
        ("total_last_hour", Language::En) => "Last hour",
        ("total_last_hour", Language::De) => "Letzte Stunde",
        (_, Language::En) => "Unknown",
        (_, Language::De) => "Unbekannt",
    }
}

pub fn tier_label(lang: Language, tier: ProgressTier) -> &'static str {
    match (tier, lang) {
        (ProgressTier::Success, Language::En) => "normal",
        (ProgressTier::Success, Language::De) => "normal",
        (ProgressTier::Warning, Language::En) => "elevated",
        (ProgressTier::Warning, Language::De) => "erhoeht",
        (ProgressTier::Danger, Language::En) => "critical",
        (ProgressTier::Danger, Language::De) => "kritisch",
    }
}
