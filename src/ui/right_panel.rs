use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::ui::app::StudioApp;
use crate::ui::center_panel::play;

pub fn draw_right_panel(ctx: &egui::Context, app: &mut StudioApp) {
    egui::SidePanel::right("history")
        .resizable(true)
        .default_width(300.0)
        .min_width(220.0)
        .show(ctx, |ui| {
            ui.heading("History");
            ui.separator();

            if app.ui.session.history.is_empty() {
                ui.label("Nothing yet");
                return;
            }

            let mut edit_index: Option<usize> = None;
            let mut play_index: Option<usize> = None;
            let total = app.ui.session.history.len();

            egui::ScrollArea::vertical().id_salt("history").show(ui, |ui| {
                for (index, entry) in app.ui.session.history.iter().enumerate().rev() {
                    egui::CollapsingHeader::new(format!("Animation #{}", index + 1))
                        .id_salt(("history_entry", index))
                        .default_open(index + 1 == total)
                        .show(ui, |ui| {
                            ui.label(&entry.original_prompt);
                            if entry.is_edit() {
                                ui.small(format!("Last edit: {}", entry.prompt));
                            }

                            if let Some(err) = entry.error() {
                                ui.colored_label(egui::Color32::LIGHT_RED, err);
                            }

                            ui.add_enabled_ui(!app.ui.busy, |ui| {
                                ui.horizontal(|ui| {
                                    if entry.video().is_some() && ui.button("▶ Play").clicked() {
                                        play_index = Some(index);
                                    }
                                    if ui.button("Edit This Animation").clicked() {
                                        edit_index = Some(index);
                                    }
                                });
                            });
                        });
                }
            });

            if let Some(index) = play_index {
                let video = app.ui.session.history[index].video().map(<[u8]>::to_vec);
                if let Some(video) = video {
                    play(app, index + 1, &video);
                }
            }

            if let Some(index) = edit_index {
                app.send_command(EngineCommand::BeginEdit { index });
            }
        });
}
