use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::ui::app::StudioApp;

const EDIT_BANNER: egui::Color32 = egui::Color32::from_rgb(30, 58, 138);

pub fn draw_left_panel(ctx: &egui::Context, app: &mut StudioApp) {
    egui::SidePanel::left("prompt")
        .resizable(true)
        .default_width(360.0)
        .min_width(280.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Prompt Interface");
                if ui.small_button("⚙").on_hover_text("Settings").clicked() {
                    app.ui.show_settings = true;
                }
            });
            ui.separator();

            ui.label("OpenRouter API Key");
            ui.add(
                egui::TextEdit::singleline(&mut app.ui.api_key)
                    .password(true)
                    .hint_text("sk-or-…"),
            )
            .on_hover_text("Get your API key from https://openrouter.ai/keys");

            ui.add_space(8.0);

            let editing = app.ui.session.editing().cloned();
            match editing {
                Some(current) => draw_edit_mode(ui, app, &current.prompt),
                None => draw_create_mode(ui, app),
            }

            if app.ui.busy {
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(app.ui.status.as_deref().unwrap_or("Working…"));
                });
            }

            if let Some(err) = &app.ui.last_error {
                ui.add_space(8.0);
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }
        });
}

fn draw_create_mode(ui: &mut egui::Ui, app: &mut StudioApp) {
    ui.label("Animation Description");
    ui.add_sized(
        [ui.available_width(), 150.0],
        egui::TextEdit::multiline(&mut app.ui.prompt_text)
            .hint_text("Describe your animation (e.g. 'Create a rotating square with velocity vectors')"),
    );

    let generate = ui.add_enabled(
        !app.ui.busy,
        egui::Button::new("Generate Animation").min_size([ui.available_width(), 28.0].into()),
    );

    if generate.clicked() {
        let prompt = app.ui.prompt_text.trim().to_string();
        let api_key = app.ui.api_key.trim().to_string();
        app.send_command(EngineCommand::Generate { prompt, api_key });
    }
}

fn draw_edit_mode(ui: &mut egui::Ui, app: &mut StudioApp, current_prompt: &str) {
    egui::Frame::new()
        .fill(EDIT_BANNER)
        .corner_radius(5.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new("🔧 EDIT MODE: Modifying current animation").color(egui::Color32::WHITE));
        });

    ui.add_space(6.0);
    let summary: String = current_prompt.chars().take(100).collect();
    ui.label(format!("Current Animation: {summary}…"));

    ui.label("Describe the changes you want to make:");
    ui.add_sized(
        [ui.available_width(), 150.0],
        egui::TextEdit::multiline(&mut app.ui.edit_text)
            .hint_text("e.g. 'Change the color to red', 'Make it rotate slower', 'Add a second square'"),
    );

    let mut apply = false;
    let mut cancel = false;
    ui.add_enabled_ui(!app.ui.busy, |ui| {
        ui.columns(2, |cols| {
            apply = cols[0].button("Apply Changes").clicked();
            cancel = cols[1].button("Cancel Edit").clicked();
        });
    });

    if apply {
        let changes = app.ui.edit_text.trim().to_string();
        let api_key = app.ui.api_key.trim().to_string();
        app.send_command(EngineCommand::ApplyEdit { changes, api_key });
    } else if cancel {
        app.ui.edit_text.clear();
        app.send_command(EngineCommand::CancelEdit);
    }
}
