#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod geo;
mod map;
mod net;
mod ui;
mod util;

const DEFAULT_ATLAS_BASE_URL: &str =
    "https://raw.githubusercontent.com/johan/world.geo.json/master";

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    use net::atlas_retriever::AtlasRetriever;

    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(1280.0, 800.0))
            .with_min_inner_size(egui::vec2(400.0, 300.0))
            .with_title("AlliedMap")
            .with_resizable(true)
            .with_decorations(true),
        ..Default::default()
    };

    let base_url =
        dotenv::var("ATLAS_BASE_URL").unwrap_or_else(|_| DEFAULT_ATLAS_BASE_URL.to_owned());

    eframe::run_native(
        "AlliedMap",
        native_options,
        Box::new(move |cc| {
            let retriever = AtlasRetriever::new(base_url);
            Ok(Box::new(ui::app::MapApp::new(cc, retriever)))
        }),
    )
}
