use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::history_entry::HistoryEntry;
use crate::ui::app::StudioApp;
use crate::ui::video::{open_in_player, preview_dir, save_with_dialog, write_preview};

const TROUBLESHOOTING: &[&str] = &[
    "Ensure descriptions are clear and specific",
    "Avoid complex physics simulations",
    "Use simple geometric shapes",
    "Mention color preferences explicitly",
];

pub fn draw_center_panel(ctx: &egui::Context, app: &mut StudioApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading("Results");
        ui.separator();

        egui::ScrollArea::vertical().id_salt("results").show(ui, |ui| {
            let number = app.ui.session.history.len();
            if let Some(latest) = app.ui.session.latest().cloned() {
                draw_result(ui, app, &latest, number);
            } else {
                ui.label("No animations yet. Describe one on the left to get started.");
            }

            ui.add_space(12.0);
            ui.separator();
            ui.label("Troubleshooting Guide:");
            for (i, tip) in TROUBLESHOOTING.iter().enumerate() {
                ui.label(format!("{}. {tip}", i + 1));
            }
        });
    });
}

fn draw_result(ui: &mut egui::Ui, app: &mut StudioApp, entry: &HistoryEntry, number: usize) {
    match (entry.video(), entry.error()) {
        (_, Some(err)) => {
            ui.colored_label(egui::Color32::LIGHT_RED, format!("Execution Error:\n{err}"));
        }
        (Some(video), None) => {
            ui.colored_label(egui::Color32::LIGHT_GREEN, "Animation Generated Successfully!");
            ui.label(format!("{} KB video", video.len() / 1024));

            ui.horizontal(|ui| {
                if ui.button("▶ Play").clicked() {
                    play(app, number, video);
                }
                if ui.button("Download MP4").clicked() {
                    match save_with_dialog(video) {
                        Ok(Some(path)) => app.ui.notice = Some(format!("Saved to {}", path.display())),
                        Ok(None) => {}
                        Err(e) => app.ui.last_error = Some(format!("{e:#}")),
                    }
                }
            });
        }
        (None, None) => {}
    }

    if let Some(notice) = &app.ui.notice {
        ui.label(notice);
    }

    ui.add_space(8.0);
    ui.collapsing("Generated Code", |ui| {
        let mut code: &str = &entry.code;
        ui.add(
            egui::TextEdit::multiline(&mut code)
                .code_editor()
                .desired_width(f32::INFINITY),
        );
    });

    if entry.video().is_some() {
        ui.separator();
        ui.label("What would you like to do next?");

        let mut start_new = false;
        let mut edit = false;
        ui.add_enabled_ui(!app.ui.busy, |ui| {
            ui.columns(2, |cols| {
                start_new = cols[0].button("🎬 Create New Animation").clicked();
                edit = cols[1].button("✏ Edit Current Animation").clicked();
            });
        });

        if start_new {
            app.ui.prompt_text.clear();
            app.send_command(EngineCommand::StartNew);
        } else if edit {
            app.send_command(EngineCommand::BeginEdit { index: number - 1 });
        }
    }
}

pub fn play(app: &mut StudioApp, number: usize, video: &[u8]) {
    let opened = write_preview(&preview_dir(), number, video).and_then(|path| open_in_player(&path));
    if let Err(e) = opened {
        tracing::warn!(error = %e, "could not open preview");
        app.ui.last_error = Some(format!("{e:#}"));
    }
}
