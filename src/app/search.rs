use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::model::BoundaryFeature;

/// Fuzzy-search popup over the loaded boundary dataset. Returns the index of
/// the feature the user picked so the caller can add it as an overlay.
#[derive(Default)]
pub(super) struct BoundaryBrowser {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

impl BoundaryBrowser {
    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn filtered(&self, features: &[BoundaryFeature]) -> Vec<(usize, i64)> {
        let matcher = SkimMatcherV2::default();
        let q = self.query.trim();
        if q.is_empty() {
            return features.iter().enumerate().map(|(i, _)| (i, 0)).collect();
        }
        let mut out = Vec::new();
        for (i, f) in features.iter().enumerate() {
            let haystack = format!(
                "{} {} {}",
                f.properties.name, f.properties.code, f.properties.country
            );
            if let Some(score) = matcher.fuzzy_match(&haystack, q) {
                out.push((i, score));
            }
        }
        out.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| features[a.0].properties.name.cmp(&features[b.0].properties.name))
        });
        out
    }

    pub fn ui(&mut self, ctx: &egui::Context, features: &[BoundaryFeature]) -> Option<usize> {
        if !self.open {
            return None;
        }
        let matches = self.filtered(features);
        if self.selected >= matches.len() {
            self.selected = matches.len().saturating_sub(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close();
            return None;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowDown)) && !matches.is_empty() {
            self.selected = (self.selected + 1).min(matches.len() - 1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowUp)) && !matches.is_empty() {
            self.selected = self.selected.saturating_sub(1);
        }
        let mut pick_selected = ctx.input(|i| i.key_pressed(egui::Key::Enter));

        let screen = ctx.content_rect();
        let width = 560.0;
        let height = 320.0;
        let pos = egui::pos2(screen.center().x - width * 0.5, screen.top() + 48.0);
        egui::Area::new(egui::Id::new("boundary_browser"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255)))
                    .inner_margin(10.0)
                    .corner_radius(egui::CornerRadius::same(8));
                frame.show(ui, |ui| {
                    ui.set_min_size(egui::vec2(width, height));
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .desired_width(f32::INFINITY)
                            .hint_text("Search boundaries"),
                    );
                    if self.request_focus {
                        resp.request_focus();
                        self.request_focus = false;
                    }
                    ui.separator();
                    if features.is_empty() {
                        ui.label("No dataset loaded. File > Open boundaries…");
                        return;
                    }
                    egui::ScrollArea::vertical().max_height(height - 64.0).show(ui, |ui| {
                        for (idx, (fi, _score)) in matches.iter().take(24).enumerate() {
                            let f = &features[*fi];
                            let label = if f.properties.country.is_empty()
                                || f.properties.country == f.properties.name
                            {
                                f.properties.name.clone()
                            } else {
                                format!("{} ({})", f.properties.name, f.properties.country)
                            };
                            let selected = idx == self.selected;
                            let resp = ui.add(egui::Button::new(label).selected(selected));
                            if resp.clicked() {
                                self.selected = idx;
                                pick_selected = true;
                            }
                        }
                    });
                });
            });

        if pick_selected {
            if let Some((fi, _)) = matches.get(self.selected) {
                let fi = *fi;
                self.close();
                return Some(fi);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundaryProperties, Geometry, LngLat};

    fn feature(name: &str, code: &str, country: &str) -> BoundaryFeature {
        BoundaryFeature {
            geometry: Geometry::Polygon(vec![vec![
                LngLat::new(0.0, 0.0),
                LngLat::new(1.0, 0.0),
                LngLat::new(1.0, 1.0),
            ]]),
            properties: BoundaryProperties {
                name: name.to_string(),
                code: code.to_string(),
                country: country.to_string(),
                area_km2: 1.0,
            },
        }
    }

    #[test]
    fn empty_query_lists_everything_in_order() {
        let features = vec![
            feature("Greenland", "GRL", "Denmark"),
            feature("Texas", "US-TX", "United States"),
        ];
        let browser = BoundaryBrowser::default();
        let m = browser.filtered(&features);
        assert_eq!(m.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn query_matches_name_code_and_country() {
        let features = vec![
            feature("Greenland", "GRL", "Denmark"),
            feature("Texas", "US-TX", "United States"),
            feature("Bavaria", "DE-BY", "Germany"),
        ];
        let mut browser = BoundaryBrowser::default();

        browser.query = "texas".into();
        let m = browser.filtered(&features);
        assert_eq!(m[0].0, 1);

        browser.query = "grl".into();
        let m = browser.filtered(&features);
        assert_eq!(m[0].0, 0);

        browser.query = "germ".into();
        let m = browser.filtered(&features);
        assert_eq!(m[0].0, 2);

        browser.query = "zzzz".into();
        assert!(browser.filtered(&features).is_empty());
    }
}
