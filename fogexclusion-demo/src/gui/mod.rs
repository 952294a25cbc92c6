mod app;

pub use app::FogExclusionDemo;

/// Run the GUI demo
pub fn run() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_title("Fog Exclusion Demo"),
        ..Default::default()
    };

    eframe::run_native(
        "Fog Exclusion Demo",
        options,
        Box::new(|_cc| Ok(Box::new(FogExclusionDemo::new()))),
    )
}
