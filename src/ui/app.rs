use eframe::egui;
use std::sync::mpsc;

use crate::config::api_key_from_env;
use crate::engine::engine::Engine;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::session_state::SessionState;
use crate::ui::center_panel::draw_center_panel;
use crate::ui::left_panel::draw_left_panel;
use crate::ui::right_panel::draw_right_panel;
use crate::ui::settings::Settings;
use crate::ui::settings_io::{load_settings, save_settings};

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub prompt_text: String,
    pub edit_text: String,
    pub api_key: String,

    /// Last snapshot from the engine. Read-only on this side.
    pub session: SessionState,

    pub busy: bool,
    pub status: Option<String>,
    pub last_error: Option<String>,
    pub notice: Option<String>,

    pub settings: Settings,
    pub engine_path_text: String,
    pub show_settings: bool,
}

/* =========================
   App
   ========================= */

pub struct StudioApp {
    pub ui: UiState,
    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl StudioApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let settings = load_settings();
        let engine_settings = settings.clone();
        let ctx = cc.egui_ctx.clone();

        std::thread::spawn(move || {
            let notify = Box::new(move || ctx.request_repaint());
            match Engine::new(cmd_rx, resp_tx.clone(), &engine_settings, notify) {
                Ok(mut engine) => engine.run(),
                Err(e) => {
                    tracing::error!(error = %e, "engine failed to start");
                    let _ = resp_tx.send(EngineResponse::Failed(e.to_string()));
                }
            }
        });

        let engine_path_text = settings
            .render
            .engine_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        Self {
            ui: UiState {
                api_key: api_key_from_env().unwrap_or_default(),
                settings,
                engine_path_text,
                ..Default::default()
            },
            cmd_tx,
            resp_rx,
        }
    }

    pub fn send_command(&mut self, cmd: EngineCommand) {
        if matches!(cmd, EngineCommand::Generate { .. } | EngineCommand::ApplyEdit { .. }) {
            self.ui.busy = true;
        }
        self.ui.last_error = None;
        self.ui.notice = None;

        if self.cmd_tx.send(cmd).is_err() {
            self.ui.busy = false;
            self.ui.last_error = Some("The render engine has stopped. Restart the app.".into());
        }
    }

    fn drain_responses(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            match resp {
                EngineResponse::Progress(text) => self.ui.status = Some(text),
                EngineResponse::SessionUpdated(session) => {
                    self.ui.session = session;
                    self.ui.busy = false;
                    self.ui.status = None;
                }
                EngineResponse::Failed(message) => self.ui.last_error = Some(message),
            }
        }
    }

    fn draw_settings_window(&mut self, ctx: &egui::Context) {
        if !self.ui.show_settings {
            return;
        }

        let mut open = true;
        let s = &mut self.ui.settings;

        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("UI Scale");
                ui.add(egui::Slider::new(&mut s.ui_scale, 0.75..=2.0));

                ui.separator();
                ui.heading("Generation");
                ui.label("Model");
                ui.text_edit_singleline(&mut s.generation.model);
                ui.label("Temperature");
                ui.add(egui::Slider::new(&mut s.generation.temperature, 0.0..=1.0));

                ui.separator();
                ui.heading("Rendering");
                ui.label("Manim executable (empty = search)");
                ui.text_edit_singleline(&mut self.ui.engine_path_text);
                ui.horizontal(|ui| {
                    ui.label("Timeout (s)");
                    ui.add(egui::DragValue::new(&mut s.render.timeout_secs).range(10..=600));
                });
                ui.checkbox(&mut s.render.retry_low_fidelity, "Retry at low resolution on failure");
            });

        if !open {
            self.ui.show_settings = false;
            self.apply_settings();
        }
    }

    fn apply_settings(&mut self) {
        let path = self.ui.engine_path_text.trim();
        self.ui.settings.render.engine_path = (!path.is_empty()).then(|| path.into());

        if let Err(e) = save_settings(&self.ui.settings) {
            tracing::warn!(error = %e, "could not save settings");
        }
        self.send_command(EngineCommand::UpdateSettings(self.ui.settings.clone()));
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.ui.settings.ui_scale);

        self.drain_responses();

        draw_left_panel(ctx, self);
        draw_right_panel(ctx, self);
        draw_center_panel(ctx, self);

        self.draw_settings_window(ctx);
    }
}
