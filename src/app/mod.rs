use eframe::egui;

use crate::model::{BoundaryFeature, LngLat};

mod geometry;
mod gesture;
mod help;
mod loader;
mod mapview;
mod registry;
mod render;
mod search;
mod settings;
mod update;

pub struct TrueSizeApp {
    features: Vec<BoundaryFeature>,
    registry: registry::OverlayRegistry,
    gesture: gesture::GestureController,
    map: mapview::MapView,
    browser: search::BoundaryBrowser,
    touch_points: std::collections::BTreeMap<u64, egui::Pos2>,
    last_pointer_geo: Option<LngLat>,
    status: Option<String>,
    settings_path: String,
    data_path: String,
    edge_pan_margin: f32,
    edge_pan_step: f32,
    show_graticule: bool,
    show_boundaries: bool,
    show_help: bool,
}

impl TrueSizeApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home)
                .join(".config")
                .join("truesize.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("truesize.toml").exists() {
            return Some("truesize.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "truesize.toml".to_string());
        let settings = settings::load_settings(&settings_path).unwrap_or_default();

        let mut app = Self {
            features: Vec::new(),
            registry: registry::OverlayRegistry::new(),
            gesture: gesture::GestureController::new(),
            map: mapview::MapView::default(),
            browser: search::BoundaryBrowser::default(),
            touch_points: std::collections::BTreeMap::new(),
            last_pointer_geo: None,
            status: None,
            settings_path,
            data_path: settings.data_path.clone(),
            edge_pan_margin: settings.edge_pan_margin,
            edge_pan_step: settings.edge_pan_step,
            show_graticule: settings.show_graticule,
            show_boundaries: settings.show_boundaries,
            show_help: false,
        };
        if std::path::Path::new(&settings.data_path).exists() {
            app.load_dataset(&settings.data_path);
        }
        app
    }

    fn persist_settings(&mut self) {
        let settings = settings::AppSettings {
            data_path: self.data_path.clone(),
            edge_pan_margin: self.edge_pan_margin,
            edge_pan_step: self.edge_pan_step,
            show_graticule: self.show_graticule,
            show_boundaries: self.show_boundaries,
        };
        if let Err(e) = settings::save_settings(&self.settings_path, &settings) {
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }
}
