use std::path::Path;

use thiserror::Error;

use crate::model::{BoundaryFeature, FeatureCollection};

use super::TrueSizeApp;

#[derive(Debug, Error)]
pub(super) enum LoadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a GeoJSON FeatureCollection: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reads a GeoJSON FeatureCollection from disk. Features whose geometry has
/// no coordinates are skipped with a warning rather than failing the load.
pub(super) fn load_features(path: &Path) -> Result<Vec<BoundaryFeature>, LoadError> {
    let s = std::fs::read_to_string(path)?;
    let collection: FeatureCollection = serde_json::from_str(&s)?;
    let total = collection.features.len();
    let features: Vec<BoundaryFeature> = collection
        .features
        .into_iter()
        .filter(|f| {
            if f.geometry.is_empty() {
                tracing::warn!(name = %f.properties.name, "skipping feature with empty geometry");
                false
            } else {
                true
            }
        })
        .collect();
    tracing::info!(
        path = %path.display(),
        kept = features.len(),
        total,
        "loaded boundary dataset"
    );
    Ok(features)
}

impl TrueSizeApp {
    pub(super) fn open_dataset_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("GeoJSON", &["geojson", "json"])
            .pick_file()
        {
            self.load_dataset(&path.display().to_string());
        }
    }

    pub(super) fn load_dataset(&mut self, path: &str) {
        match load_features(Path::new(path)) {
            Ok(features) => {
                self.status = Some(format!(
                    "Loaded {} boundaries from {path}",
                    features.len()
                ));
                self.features = features;
                self.data_path = path.to_string();
                self.persist_settings();
            }
            Err(e) => self.status = Some(format!("Load failed: {e}")),
        }
    }
}
