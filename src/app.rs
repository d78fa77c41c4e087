use std::{
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Local;
use eframe::egui::{self, Color32, RichText, Sense, Stroke};
use tokio::runtime::Runtime;
use tracing::warn;

use crate::{
    commands::{Command, ListKind, LogKind},
    config::AppConfig,
    console::Console,
    export::ExportFormat,
    fetcher::ApiClient,
    filters::TimeRange,
    i18n::{self, tr, Language},
    logger::AuditLog,
    models::{AttackStatus, Channel, RiskLevel, Severity},
    preferences::Preferences,
    probe::HostProbe,
    strength,
    widgets::{BadgeTone, ChartKind, ChartSlot, ProgressBar, ProgressTier},
};

const HOST_PROBE_PERIOD: Duration = Duration::from_secs(2);
const LAB_MODULES: [&str; 2] = ["attacker", "defender"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    Events,
    Lists,
    Lab,
    Notifications,
}

struct Forms {
    whitelist_ip: String,
    user: String,
    new_username: String,
    new_password: String,
    dictionary_password: String,
    attack_speed: f64,
    upload_path: String,
    upload_kind: ListKind,
    search: String,
}

impl Forms {
    fn new() -> Self {
        Self {
            whitelist_ip: String::new(),
            user: String::new(),
            new_username: String::new(),
            new_password: String::new(),
            dictionary_password: String::new(),
            attack_speed: 1.0,
            upload_path: String::new(),
            upload_kind: ListKind::Email,
            search: String::new(),
        }
    }
}

pub struct ConsoleApp {
    // dropped before the runtime so timers are aborted first
    console: Console<ApiClient>,
    _runtime: Runtime,
    language: Language,
    tab: Tab,
    prefs: Preferences,
    dark_mode: bool,
    probe: HostProbe,
    last_probe: Option<Instant>,
    forms: Forms,
    export_open: bool,
    export_format: ExportFormat,
}

impl ConsoleApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        runtime: Runtime,
        api: ApiClient,
        audit: AuditLog,
        prefs: Preferences,
    ) -> Self {
        let mut console = Console::new(
            Arc::new(api),
            runtime.handle().clone(),
            &config,
            Some(audit),
        );
        console.start();

        let dark_mode = prefs.dark_mode();
        cc.egui_ctx.set_visuals(visuals(dark_mode));

        Self {
            console,
            _runtime: runtime,
            language: Language::from_config(&config.default_language),
            tab: Tab::Overview,
            prefs,
            dark_mode,
            probe: HostProbe::new(),
            last_probe: None,
            forms: Forms::new(),
            export_open: false,
            export_format: ExportFormat::Json,
        }
    }

    fn risk_color(risk: RiskLevel) -> Color32 {
        match risk {
            RiskLevel::Green => Color32::from_rgb(50, 180, 90),
            RiskLevel::Yellow => Color32::from_rgb(230, 190, 55),
            RiskLevel::Red => Color32::from_rgb(215, 70, 70),
        }
    }

    fn sample_host(&mut self, now: Instant) {
        let due = self
            .last_probe
            .map_or(true, |at| now.duration_since(at) >= HOST_PROBE_PERIOD);
        if due {
            let sample = self.probe.sample();
            self.console.record_host(sample, now);
            self.last_probe = Some(now);
        }
    }

    fn track_visibility(&mut self, ctx: &egui::Context) {
        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        self.console.set_visible(!minimized);
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context, now: Instant) {
        let (refresh, export, escape) = ctx.input_mut(|i| {
            (
                i.consume_key(egui::Modifiers::CTRL, egui::Key::R)
                    || i.consume_key(egui::Modifiers::NONE, egui::Key::F5),
                i.consume_key(egui::Modifiers::CTRL, egui::Key::E),
                i.consume_key(egui::Modifiers::NONE, egui::Key::Escape),
            )
        });
        if refresh {
            self.console.refresh_all(now);
        }
        if export {
            self.export_open = true;
        }
        if escape {
            self.export_open = false;
            self.console.decline();
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context, now: Instant) {
        self.dark_mode = !self.dark_mode;
        ctx.set_visuals(visuals(self.dark_mode));
        if let Err(e) = self.prefs.set_dark_mode(self.dark_mode) {
            warn!("could not persist theme: {e:#}");
        }
        let msg = if self.dark_mode {
            "Dark mode enabled"
        } else {
            "Light mode enabled"
        };
        self.console.state.notify(Severity::Info, None, msg, now);
    }

    fn upload_list(&mut self, now: Instant) {
        let raw = self.forms.upload_path.trim().to_string();
        match std::fs::read(&raw) {
            Ok(contents) => {
                let file_name = Path::new(&raw)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "list.txt".to_string());
                self.console.submit(Command::UploadList {
                    kind: self.forms.upload_kind,
                    file_name,
                    contents,
                });
                self.forms.upload_path.clear();
            }
            Err(e) => {
                self.console.state.notify(
                    Severity::Danger,
                    None,
                    format!("Could not read {raw}: {e}"),
                    now,
                );
            }
        }
    }
}

impl eframe::App for ConsoleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.track_visibility(ctx);
        self.sample_host(now);
        self.console.pump(now);
        let animating = self.console.tick(now);
        self.handle_shortcuts(ctx, now);
        let lang = self.language;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(tr(
                    lang,
                    "CrackDefend Security Console",
                    "CrackDefend Sicherheitskonsole",
                ));
                ui.separator();
                if let Some(level) = self.console.state.posture.level() {
                    let score = self.console.state.posture.score().unwrap_or(0.0);
                    ui.colored_label(
                        Self::risk_color(level),
                        RichText::new(format!("{} {score:.0}%", i18n::posture_label(lang, level)))
                            .strong(),
                    );
                    ui.separator();
                }
                if ui.button(tr(lang, "Refresh", "Aktualisieren")).clicked() {
                    self.console.refresh_all(now);
                }
                if ui.button(tr(lang, "Export", "Exportieren")).clicked() {
                    self.export_open = true;
                }
                let theme = if self.dark_mode { "Light" } else { "Dark" };
                if ui.button(theme).clicked() {
                    self.toggle_theme(ctx, now);
                }
                if ui.button("EN").clicked() {
                    self.language = Language::En;
                }
                if ui.button("DE").clicked() {
                    self.language = Language::De;
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for channel in Channel::ALL {
                    let health = self.console.state.health(channel);
                    let label = i18n::channel_label(lang, channel);
                    if self.console.state.is_stale(channel) {
                        let response = ui.colored_label(
                            Self::risk_color(RiskLevel::Red),
                            format!("{label}: {}", tr(lang, "stale", "veraltet")),
                        );
                        if let Some(err) = health.last_error {
                            response.on_hover_text(err);
                        }
                    } else {
                        let when = health
                            .last_update
                            .map(|t| t.format("%H:%M:%S").to_string())
                            .unwrap_or_else(|| "--".to_string());
                        ui.label(format!("{label}: {when}"));
                    }
                    ui.separator();
                }
                if !self.console.is_visible() {
                    ui.weak(tr(lang, "paused", "pausiert"));
                }
            });
        });

        egui::SidePanel::left("nav").show(ctx, |ui| {
            ui.label(RichText::new(tr(lang, "Views", "Ansichten")).strong());
            nav_button(ui, &mut self.tab, Tab::Overview, tr(lang, "Overview", "Uebersicht"));
            nav_button(ui, &mut self.tab, Tab::Events, tr(lang, "Events", "Ereignisse"));
            nav_button(ui, &mut self.tab, Tab::Lists, tr(lang, "Access lists", "Listen"));
            nav_button(ui, &mut self.tab, Tab::Lab, tr(lang, "Lab control", "Labor"));
            let inbox = match self.console.state.notifications.badge() {
                Some(count) => format!("{} ({count})", tr(lang, "Notifications", "Meldungen")),
                None => tr(lang, "Notifications", "Meldungen").to_string(),
            };
            nav_button(ui, &mut self.tab, Tab::Notifications, &inbox);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.tab {
                Tab::Overview => self.render_overview(ui, now),
                Tab::Events => self.render_events(ui),
                Tab::Lists => self.render_lists(ui, now),
                Tab::Lab => self.render_lab(ui),
                Tab::Notifications => self.render_notifications(ui),
            });
        });

        self.confirmation_dialog(ctx);
        self.export_dialog(ctx, now);

        if animating {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

impl ConsoleApp {
    fn render_overview(&mut self, ui: &mut egui::Ui, now: Instant) {
        let lang = self.language;
        let state = &self.console.state;

        ui.heading(tr(lang, "Attack statistics", "Angriffsstatistik"));
        egui::Grid::new("counters").num_columns(6).show(ui, |ui| {
            for (key, _) in state.counters.fields() {
                ui.label(i18n::counter_label(lang, key));
            }
            ui.end_row();
            for (_, field) in state.counters.fields() {
                ui.label(RichText::new(field.displayed(now).to_string()).size(22.0).strong());
            }
            ui.end_row();
        });

        if let Some(stats) = &state.stats {
            ui.separator();
            egui::Grid::new("highlights").num_columns(2).show(ui, |ui| {
                ui.label(tr(lang, "Most targeted account", "Meist angegriffenes Konto"));
                ui.label(&stats.most_targeted_email);
                ui.end_row();
                ui.label(tr(lang, "Most used password", "Haeufigstes Passwort"));
                ui.label(&stats.most_used_pwd);
                ui.end_row();
                ui.label(tr(lang, "Most aggressive source", "Aggressivste Quelle"));
                ui.label(format!(
                    "{} ({})",
                    stats.most_aggressive_ip,
                    stats.aggressor_location()
                ));
                ui.end_row();
            });
        }

        ui.separator();
        ui.heading(tr(lang, "System performance", "Systemleistung"));
        gauge(ui, lang, "CPU", &state.cpu);
        gauge(ui, lang, tr(lang, "Memory", "Speicher"), &state.memory);
        gauge(ui, lang, tr(lang, "Disk", "Datentraeger"), &state.disk);

        ui.separator();
        ui.heading(tr(lang, "Attempts per hour", "Versuche pro Stunde"));
        draw_chart(ui, &state.hourly_chart, Color32::from_rgb(0, 200, 130));

        ui.heading(tr(lang, "Top sources", "Haeufigste Quellen"));
        draw_chart(ui, &state.sources_chart, Color32::from_rgb(90, 140, 230));

        ui.heading(tr(lang, "Outcome breakdown", "Ergebnisverteilung"));
        draw_chart(ui, &state.status_chart, Color32::GRAY);
    }

    fn render_events(&mut self, ui: &mut egui::Ui) {
        let lang = self.language;
        let filters = &mut self.console.state.filters;
        ui.horizontal(|ui| {
            egui::ComboBox::from_label(tr(lang, "Time range", "Zeitraum"))
                .selected_text(filters.time_range.as_str())
                .show_ui(ui, |ui| {
                    for range in TimeRange::ALL {
                        ui.selectable_value(&mut filters.time_range, range, range.as_str());
                    }
                });
            egui::ComboBox::from_label("Status")
                .selected_text(filters.status.map_or("all", |s| s.as_str()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filters.status, None, "all");
                    for status in AttackStatus::ALL {
                        ui.selectable_value(&mut filters.status, Some(status), status.as_str());
                    }
                });
        });

        let state = &self.console.state;
        ui.heading(tr(lang, "Recent attempts", "Letzte Versuche"));
        egui::Grid::new("events").striped(true).num_columns(5).show(ui, |ui| {
            for title in ["Time", "User", "IP", "Password", "Status"] {
                ui.label(RichText::new(title).strong());
            }
            ui.end_row();
            for row in state.visible_events(Local::now()) {
                ui.label(&row.time);
                ui.label(&row.user);
                ui.label(&row.ip);
                ui.label(&row.pwd);
                ui.colored_label(tone_color(row.tone), &row.status);
                ui.end_row();
            }
        });

        ui.separator();
        ui.heading(tr(lang, "Mail log", "Mail-Protokoll"));
        egui::Grid::new("mail").striped(true).num_columns(3).show(ui, |ui| {
            for entry in state.mail.rows() {
                ui.label(&entry.time);
                ui.label(&entry.to);
                ui.label(&entry.subject);
                ui.end_row();
            }
        });
    }

    fn render_lists(&mut self, ui: &mut egui::Ui, now: Instant) {
        let lang = self.language;
        let mut commands = Vec::new();
        let mut upload = false;
        let state = &self.console.state;
        let forms = &mut self.forms;

        ui.columns(2, |cols| {
            cols[0].heading(tr(lang, "Blocked accounts", "Gesperrte Konten"));
            for user in &state.access.blocked {
                cols[0].horizontal(|ui| {
                    ui.label(user);
                    if ui.small_button(tr(lang, "Unblock", "Entsperren")).clicked() {
                        commands.push(Command::UnblockUser { user: user.clone() });
                    }
                    if ui.small_button("Whitelist").clicked() {
                        commands.push(Command::WhitelistUser { user: user.clone() });
                    }
                });
            }
            cols[0].horizontal(|ui| {
                ui.text_edit_singleline(&mut forms.user);
                if ui.button(tr(lang, "Block", "Sperren")).clicked() && !forms.user.trim().is_empty() {
                    commands.push(Command::BlockUser {
                        user: forms.user.trim().to_string(),
                    });
                    forms.user.clear();
                }
            });

            cols[1].heading(tr(lang, "Whitelisted addresses", "Freigegebene Adressen"));
            for ip in &state.access.whitelist {
                cols[1].horizontal(|ui| {
                    ui.label(ip);
                    if ui.small_button(tr(lang, "Remove", "Entfernen")).clicked() {
                        commands.push(Command::RemoveWhitelistIp { ip: ip.clone() });
                    }
                });
            }
            cols[1].horizontal(|ui| {
                ui.text_edit_singleline(&mut forms.whitelist_ip);
                if ui.button(tr(lang, "Add", "Hinzufuegen")).clicked()
                    && !forms.whitelist_ip.trim().is_empty()
                {
                    commands.push(Command::AddWhitelistIp {
                        ip: forms.whitelist_ip.trim().to_string(),
                    });
                    forms.whitelist_ip.clear();
                }
            });
        });

        ui.separator();
        ui.columns(2, |cols| {
            cols[0].heading(tr(lang, "Target users", "Zielkonten"));
            for user in &state.users {
                cols[0].label(user);
            }
            cols[0].horizontal(|ui| {
                ui.label(tr(lang, "User", "Konto"));
                ui.text_edit_singleline(&mut forms.new_username);
            });
            cols[0].horizontal(|ui| {
                ui.label(tr(lang, "Password", "Passwort"));
                ui.add(egui::TextEdit::singleline(&mut forms.new_password).password(true));
            });
            if !forms.new_password.is_empty() {
                let meter = strength::score(&forms.new_password);
                let [r, g, b] = meter.rgb();
                cols[0].colored_label(Color32::from_rgb(r, g, b), meter.label());
            }
            if cols[0].button(tr(lang, "Add user", "Konto anlegen")).clicked()
                && !forms.new_username.trim().is_empty()
            {
                commands.push(Command::AddUser {
                    username: forms.new_username.trim().to_string(),
                    password: std::mem::take(&mut forms.new_password),
                });
                forms.new_username.clear();
            }

            cols[1].heading(tr(lang, "Password dictionary", "Passwortliste"));
            for pwd in &state.passwords {
                cols[1].label(pwd);
            }
            cols[1].horizontal(|ui| {
                ui.text_edit_singleline(&mut forms.dictionary_password);
                if ui.button(tr(lang, "Add", "Hinzufuegen")).clicked()
                    && !forms.dictionary_password.is_empty()
                {
                    commands.push(Command::AddPassword {
                        password: std::mem::take(&mut forms.dictionary_password),
                    });
                }
            });
        });

        ui.separator();
        ui.heading(tr(lang, "Upload list", "Liste hochladen"));
        ui.horizontal(|ui| {
            ui.radio_value(&mut forms.upload_kind, ListKind::Email, "E-mail");
            ui.radio_value(&mut forms.upload_kind, ListKind::Password, tr(lang, "Password", "Passwort"));
            ui.text_edit_singleline(&mut forms.upload_path);
            if ui.button(tr(lang, "Upload", "Hochladen")).clicked()
                && !forms.upload_path.trim().is_empty()
            {
                upload = true;
            }
        });

        for command in commands {
            self.console.submit(command);
        }
        if upload {
            self.upload_list(now);
        }
    }

    fn render_lab(&mut self, ui: &mut egui::Ui) {
        let lang = self.language;
        let mut commands = Vec::new();

        ui.heading(tr(lang, "Lab modules", "Labormodule"));
        for module in LAB_MODULES {
            ui.horizontal(|ui| {
                ui.label(RichText::new(module).strong());
                if ui.button("Start").clicked() {
                    commands.push(Command::StartModule(module.to_string()));
                }
                if ui.button("Stop").clicked() {
                    commands.push(Command::StopModule(module.to_string()));
                }
            });
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label(tr(lang, "Attack speed (s)", "Angriffstempo (s)"));
            ui.add(egui::Slider::new(&mut self.forms.attack_speed, 0.1..=10.0));
            if ui.button(tr(lang, "Apply", "Anwenden")).clicked() {
                commands.push(Command::SetAttackSpeed {
                    speed: self.forms.attack_speed,
                });
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button(tr(lang, "Download attack log", "Angriffslog laden")).clicked() {
                commands.push(Command::DownloadLog {
                    kind: LogKind::Attack,
                });
            }
            if ui.button(tr(lang, "Download defense log", "Abwehrlog laden")).clicked() {
                commands.push(Command::DownloadLog {
                    kind: LogKind::Defense,
                });
            }
        });

        ui.separator();
        let reset = RichText::new(tr(lang, "Reset statistics", "Statistik zuruecksetzen"))
            .color(Self::risk_color(RiskLevel::Red));
        if ui.button(reset).clicked() {
            commands.push(Command::ResetStats);
        }

        for command in commands {
            self.console.submit(command);
        }
    }

    fn render_notifications(&mut self, ui: &mut egui::Ui) {
        let lang = self.language;
        let mut dismissed = Vec::new();
        let mut clear = false;

        ui.horizontal(|ui| {
            ui.label(tr(lang, "Search", "Suche"));
            ui.text_edit_singleline(&mut self.forms.search);
            let filters = &mut self.console.state.filters;
            egui::ComboBox::from_label(tr(lang, "Severity", "Schweregrad"))
                .selected_text(filters.severity.map_or("all", |s| i18n::severity_label(lang, s)))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filters.severity, None, "all");
                    for severity in Severity::ALL {
                        ui.selectable_value(
                            &mut filters.severity,
                            Some(severity),
                            i18n::severity_label(lang, severity),
                        );
                    }
                });
            if ui.button(tr(lang, "Clear all", "Alle entfernen")).clicked() {
                clear = true;
            }
        });
        ui.separator();

        let state = &self.console.state;
        let local_now = Local::now();
        for n in state
            .notifications
            .search(&self.forms.search)
            .into_iter()
            .filter(|n| state.filters.admits(*n, local_now))
        {
            ui.horizontal(|ui| {
                ui.colored_label(
                    severity_color(n.severity),
                    i18n::severity_label(lang, n.severity),
                );
                if let Some(title) = &n.title {
                    ui.label(RichText::new(title).strong());
                }
                ui.label(&n.message);
                ui.weak(n.timestamp.format("%H:%M:%S").to_string());
                if ui.small_button("x").clicked() {
                    dismissed.push(n.id);
                }
            });
        }

        let feed = &mut self.console.state.notifications;
        if clear {
            feed.clear();
        }
        for id in dismissed {
            feed.dismiss(id);
        }
    }

    fn confirmation_dialog(&mut self, ctx: &egui::Context) {
        let Some(prompt) = self.console.pending_confirmation().map(Command::describe) else {
            return;
        };
        let lang = self.language;
        let mut decision = None;
        egui::Window::new(tr(lang, "Please confirm", "Bitte bestaetigen"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("{} {prompt}?", tr(lang, "Really", "Wirklich")));
                ui.horizontal(|ui| {
                    if ui.button(tr(lang, "Yes", "Ja")).clicked() {
                        decision = Some(true);
                    }
                    if ui.button(tr(lang, "Cancel", "Abbrechen")).clicked() {
                        decision = Some(false);
                    }
                });
            });
        match decision {
            Some(true) => {
                self.console.confirm();
            }
            Some(false) => self.console.decline(),
            None => {}
        }
    }

    fn export_dialog(&mut self, ctx: &egui::Context, now: Instant) {
        if !self.export_open {
            return;
        }
        let lang = self.language;
        let mut go = false;
        let mut open = true;
        egui::Window::new(tr(lang, "Export data", "Daten exportieren"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                for format in ExportFormat::ALL {
                    ui.radio_value(&mut self.export_format, format, format.label());
                }
                if ui.button(tr(lang, "Export", "Exportieren")).clicked() {
                    go = true;
                }
            });
        self.export_open = open && !go;

        if go {
            if let Err(e) = self.console.export(self.export_format, now) {
                warn!("export failed: {e:#}");
                self.console.state.notify(
                    Severity::Danger,
                    None,
                    format!("Export failed: {e}"),
                    now,
                );
            }
        }
    }
}

fn visuals(dark: bool) -> egui::Visuals {
    if dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    }
}

fn nav_button(ui: &mut egui::Ui, tab: &mut Tab, me: Tab, title: &str) {
    let selected = *tab == me;
    if ui.selectable_label(selected, title).clicked() {
        *tab = me;
    }
}

fn tier_color(tier: ProgressTier) -> Color32 {
    match tier {
        ProgressTier::Success => Color32::from_rgb(50, 180, 90),
        ProgressTier::Warning => Color32::from_rgb(230, 190, 55),
        ProgressTier::Danger => Color32::from_rgb(215, 70, 70),
    }
}

fn tone_color(tone: BadgeTone) -> Color32 {
    match tone {
        BadgeTone::Success => Color32::from_rgb(50, 180, 90),
        BadgeTone::Secondary => Color32::from_rgb(130, 130, 140),
        BadgeTone::Danger => Color32::from_rgb(215, 70, 70),
    }
}

fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => Color32::from_rgb(80, 150, 230),
        Severity::Success => Color32::from_rgb(50, 180, 90),
        Severity::Warning => Color32::from_rgb(230, 190, 55),
        Severity::Danger => Color32::from_rgb(215, 70, 70),
    }
}

fn gauge(ui: &mut egui::Ui, lang: Language, label: &str, bar: &ProgressBar) {
    ui.horizontal(|ui| {
        ui.add_sized([90.0, 18.0], egui::Label::new(label));
        ui.add(
            egui::ProgressBar::new(bar.fill_fraction().clamp(0.0, 1.0) as f32)
                .text(format!("{} ({})", bar.label(), i18n::tier_label(lang, bar.tier())))
                .fill(tier_color(bar.tier())),
        );
    });
}

fn chart_placeholder(ui: &mut egui::Ui, slot: &ChartSlot) {
    ui.weak(slot.placeholder().unwrap_or("Waiting for data..."));
}

/// Breakdown charts colour their segments per status and ignore `color`.
fn draw_chart(ui: &mut egui::Ui, slot: &ChartSlot, color: Color32) {
    match slot.kind() {
        ChartKind::Line => draw_line_chart(ui, slot, color),
        ChartKind::Bars => draw_bar_chart(ui, slot, color),
        ChartKind::Breakdown => draw_breakdown(ui, slot),
    }
}

fn draw_line_chart(ui: &mut egui::Ui, slot: &ChartSlot, color: Color32) {
    let Some(chart) = slot.instance() else {
        chart_placeholder(ui, slot);
        return;
    };
    let series = &chart.series;
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(ui.available_width(), 140.0), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);

    let max = series.max_value().max(1.0);
    let steps = series.values.len().max(2) - 1;
    let points: Vec<egui::Pos2> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            egui::pos2(
                rect.left() + rect.width() * i as f32 / steps as f32,
                rect.bottom() - rect.height() * (*v / max) as f32,
            )
        })
        .collect();
    painter.add(egui::Shape::line(points, Stroke::new(2.0, color)));

    if let Some(pos) = response.hover_pos() {
        let idx = (((pos.x - rect.left()) / rect.width()) * steps as f32).round() as usize;
        if let (Some(label), Some(value)) = (series.labels.get(idx), series.values.get(idx)) {
            response.on_hover_text(format!("{label}: {value:.0}"));
        }
    }
}

fn draw_bar_chart(ui: &mut egui::Ui, slot: &ChartSlot, color: Color32) {
    let Some(chart) = slot.instance() else {
        chart_placeholder(ui, slot);
        return;
    };
    let max = chart.series.max_value().max(1.0);
    for (label, value) in chart.series.labels.iter().zip(&chart.series.values) {
        ui.horizontal(|ui| {
            ui.add_sized([120.0, 16.0], egui::Label::new(label.as_str()));
            let width = (ui.available_width() - 40.0).max(10.0);
            let (rect, _) = ui.allocate_exact_size(egui::vec2(width, 14.0), Sense::hover());
            let filled = egui::Rect::from_min_size(
                rect.min,
                egui::vec2(width * (*value / max) as f32, rect.height()),
            );
            ui.painter().rect_filled(filled, 2.0, color);
            ui.label(format!("{value:.0}"));
        });
    }
}

fn draw_breakdown(ui: &mut egui::Ui, slot: &ChartSlot) {
    let Some(chart) = slot.instance() else {
        chart_placeholder(ui, slot);
        return;
    };
    let series = &chart.series;
    let total: f64 = series.values.iter().sum();
    let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 18.0), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 2.0, ui.visuals().extreme_bg_color);

    let mut x = rect.left();
    for (label, value) in series.labels.iter().zip(&series.values) {
        if total <= 0.0 {
            break;
        }
        let w = rect.width() * (*value / total) as f32;
        let segment = egui::Rect::from_min_size(egui::pos2(x, rect.top()), egui::vec2(w, rect.height()));
        painter.rect_filled(segment, 0.0, tone_color(BadgeTone::for_status(label)));
        x += w;
    }

    ui.horizontal(|ui| {
        for (label, value) in series.labels.iter().zip(&series.values) {
            ui.colored_label(
                tone_color(BadgeTone::for_status(label)),
                format!("{label}: {value:.0}"),
            );
        }
    });
}
