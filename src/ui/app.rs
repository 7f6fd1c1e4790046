use eframe::egui;
use egui::{Color32, FontId, Rect, Ui};

use crate::geo::microstates;
use crate::geo::projection::AzimuthalProjection;
use crate::geo::roster::AllianceRoster;
use crate::map::config::MapConfig;
use crate::map::panel::MapPanel;
use crate::net::atlas_retriever::AtlasRetriever;

/// A geo-anchored label the app layers on top of the map through the
/// projection the panel publishes.
struct CityMarker {
    name: &'static str,
    lon: f64,
    lat: f64,
}

const CITIES: [CityMarker; 5] = [
    CityMarker { name: "Oslo", lon: 10.75, lat: 59.91 },
    CityMarker { name: "Stockholm", lon: 18.07, lat: 59.33 },
    CityMarker { name: "Copenhagen", lon: 12.57, lat: 55.68 },
    CityMarker { name: "Helsinki", lon: 24.94, lat: 60.17 },
    CityMarker { name: "Reykjavik", lon: -21.94, lat: 64.15 },
];

pub struct MapApp {
    panel: MapPanel,
    // Keeps the fetch task alive; nothing else runs on it.
    _runtime: tokio::runtime::Runtime,
}

impl MapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, retriever: AtlasRetriever) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("atlas-fetcher")
            .enable_all()
            .build()
            .expect("Unable to create runtime");

        let roster = AllianceRoster::from_names([
            "Norway",
            "Sweden",
            "Denmark",
            "Finland",
            "Iceland",
            "Monaco",
        ]);
        log::info!("alliance roster holds {} members", roster.len());

        let mut panel = MapPanel::new(
            retriever,
            &runtime,
            cc.egui_ctx.clone(),
            MapConfig::default(),
            roster,
            microstates::european_micro_states(),
        );
        panel.set_on_ready(Box::new(|projection| {
            log::info!(
                "map ready, projection scale {:.1} px/rad around {:.1}°E",
                projection.scale(),
                projection.reference_longitude()
            );
        }));

        Self {
            panel,
            _runtime: runtime,
        }
    }
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.panel.request_layout();
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(Color32::from_rgb(12, 16, 22)))
            .show(ctx, |ui| {
                let response = self.panel.ui(ui);
                if let (Some(response), Some(projection)) = (response, self.panel.projection()) {
                    draw_city_overlay(ui, response.rect, projection);
                }
            });
    }
}

fn draw_city_overlay(ui: &Ui, map_rect: Rect, projection: &AzimuthalProjection) {
    let painter = ui.painter().with_clip_rect(map_rect);
    for city in &CITIES {
        let pos = map_rect.min + projection.project(city.lon, city.lat).to_vec2();
        painter.circle_filled(pos, 2.0, Color32::WHITE);
        painter.text(
            pos + egui::vec2(4.0, -4.0),
            egui::Align2::LEFT_BOTTOM,
            city.name,
            FontId::proportional(11.0),
            Color32::from_gray(220),
        );
    }
}
