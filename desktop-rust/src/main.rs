mod app;
mod io;
mod model;

use app::{configure_fonts, DesktopApp};

fn main() -> eframe::Result<()> {
    gemini_ocr::logging::init(false);

    let (settings, notice) = io::load_settings_or_default();
    let app = DesktopApp::new(settings, notice);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Gemini OCR",
        options,
        Box::new(|cc| {
            configure_fonts(&cc.egui_ctx);
            Box::new(app)
        }),
    )
}
