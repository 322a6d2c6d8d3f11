//! # Color Picker UI
//!
//! Thin egui front end that triggers publish sessions. It owns no workflow
//! logic: a swatch click reads the credential fields, maps the swatch to a
//! [`ColorSelection`] and calls [`SessionLauncher::begin`]. Finished sessions
//! come back as [`SessionReport`]s over a channel and are shown in a log.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ ☰  Strudel                   sent 3 / 1  │  top bar
//! ├─────────┬────────────────────────────────┤
//! │ broker  │  user [______] pass [______]   │
//! │ topic   │  ■ ■ ■ ■ ■ ■ ■ ?               │  swatches
//! │ stats   │  outcome log                   │
//! └─────────┴────────────────────────────────┘
//!  side menu (animated)
//! ```

pub mod common;

use chrono::Local;
use eframe::egui::{self, vec2, Button, RichText, ScrollArea, TextEdit};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::UiConfig;
use crate::mqtt::{
    BrokerConfig, ColorSelection, Credentials, SessionLauncher, SessionOutcome, SessionReport,
    SessionStatus,
};
use common::{create_frame, Swatch, UiColors, PALETTE};

const SWATCH_SIZE: f32 = 96.0;

pub struct StrudelUI {
    launcher: SessionLauncher,
    runtime: Handle,
    reports: mpsc::Receiver<SessionReport>,
    /// Session tasks that have not finished yet
    pending: Vec<JoinHandle<SessionReport>>,
    status: SessionStatus,
    broker: BrokerConfig,
    username: String,
    password: String,
    menu_open: bool,
}

impl StrudelUI {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        launcher: SessionLauncher,
        runtime: Handle,
        reports: mpsc::Receiver<SessionReport>,
        broker: BrokerConfig,
        ui_config: &UiConfig,
    ) -> Self {
        debug!("Page ready");
        Self {
            launcher,
            runtime,
            reports,
            pending: Vec::new(),
            status: SessionStatus::with_history(ui_config.history_len),
            broker,
            username: String::new(),
            password: String::new(),
            menu_open: ui_config.menu_open,
        }
    }

    fn drain_reports(&mut self) {
        while let Ok(report) = self.reports.try_recv() {
            self.status.record(report);
        }
        self.pending.retain(|handle| !handle.is_finished());
        self.status.set_in_flight(self.pending.len());
    }

    /// Starts one session for the clicked swatch.
    fn on_swatch(&mut self, swatch: &Swatch) {
        let color = match ColorSelection::from_swatch(swatch.value) {
            Ok(color) => color,
            Err(e) => {
                warn!("Ignoring swatch '{}': {}", swatch.value, e);
                return;
            }
        };
        let credentials = Credentials::new(self.username.clone(), self.password.clone());

        let _guard = self.runtime.enter();
        // The report arrives through the sink channel; the handle only tracks completion
        self.pending.push(self.launcher.begin(color, credentials));
        self.status.started();
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let icon = if self.menu_open { "✖" } else { "☰" };
                if ui.button(icon).clicked() {
                    self.menu_open = !self.menu_open;
                }
                ui.heading("Strudel");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(format!("failed {}", self.status.failures))
                            .color(UiColors::INACTIVE),
                    );
                    ui.label(
                        RichText::new(format!("sent {}", self.status.messages_sent))
                            .color(UiColors::ACTIVE),
                    );
                });
            });
        });
    }

    fn render_menu(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("menu").show_animated(ctx, self.menu_open, |ui| {
            ui.heading("Broker");
            ui.label(self.broker.to_string());
            ui.label(format!("Topic: {}", self.broker.topic));
            ui.separator();
            ui.label(format!("In flight: {}", self.status.in_flight));
            if let Some(color) = &self.status.last_color {
                ui.label(format!("Last color: {}", color));
            }
            if let Some(at) = self.status.last_activity {
                ui.label(format!("Last activity: {}", at.format("%H:%M:%S")));
            }
        });
    }

    fn render_picker(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(UiColors::MAIN_BG).inner_margin(8))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.add(TextEdit::singleline(&mut self.username).hint_text("MQTT user"));
                    ui.add(
                        TextEdit::singleline(&mut self.password)
                            .hint_text("MQTT password")
                            .password(true),
                    );
                });
                ui.add_space(8.0);

                let mut clicked = None;
                ui.horizontal_wrapped(|ui| {
                    for swatch in PALETTE.iter() {
                        let button = Button::new(
                            RichText::new(swatch.caption()).color(swatch.text_color()),
                        )
                        .fill(swatch.fill)
                        .min_size(vec2(SWATCH_SIZE, SWATCH_SIZE));
                        if ui.add(button).clicked() {
                            clicked = Some(*swatch);
                        }
                    }
                });
                if let Some(swatch) = clicked {
                    self.on_swatch(&swatch);
                }

                ui.add_space(8.0);
                create_frame(UiColors::EXTREME_BG, UiColors::BORDER).show(ui, |ui| {
                    ScrollArea::vertical().show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        for report in self.status.history() {
                            let color = match report.outcome {
                                SessionOutcome::Published => UiColors::ACTIVE,
                                SessionOutcome::Failed(_) => UiColors::INACTIVE,
                            };
                            ui.label(RichText::new(report.render()).color(color).monospace());
                        }
                    });
                });
            });
    }
}

impl eframe::App for StrudelUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_reports();

        self.render_top_bar(ctx);
        self.render_menu(ctx);
        self.render_picker(ctx);

        // Reports arrive without user input
        if self.status.needs_repaint(Local::now()) {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
