mod config;
mod engine;
mod error;
mod logging;
mod model;
mod ui;

fn main() -> eframe::Result<()> {
    logging::init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting manim studio");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Cursor for 2D Animator")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Manim Studio",
        options,
        Box::new(|cc| Ok(Box::new(ui::app::StudioApp::new(cc)))),
    )
}
