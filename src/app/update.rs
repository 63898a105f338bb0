use eframe::egui;
use std::time::Instant;

use super::TrueSizeApp;
use super::geometry;
use super::help::draw_help_window;
use super::registry::snapshot;
use super::render::{draw_background, draw_boundaries, draw_graticule, draw_overlay};

impl eframe::App for TrueSizeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.input_mut(|i| {
            if !self.browser.open && i.consume_key(egui::Modifiers::COMMAND, egui::Key::P) {
                self.browser.open();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                self.open_dataset_dialog();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = !self.show_help;
            }
            // The browser handles its own Escape.
            if !self.browser.open
                && !self.gesture.is_idle()
                && i.consume_key(egui::Modifiers::NONE, egui::Key::Escape)
            {
                self.gesture.cancel(&mut self.map);
                self.status = Some("Gesture cancelled".to_string());
            }
        });

        // Live multi-touch contacts, keyed by touch id.
        ctx.input(|i| {
            for event in &i.events {
                if let egui::Event::Touch { id, phase, pos, .. } = event {
                    match phase {
                        egui::TouchPhase::Start | egui::TouchPhase::Move => {
                            self.touch_points.insert(id.0, *pos);
                        }
                        egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                            self.touch_points.remove(&id.0);
                        }
                    }
                }
            }
        });

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open boundaries… (⌘O)").clicked() {
                        self.open_dataset_dialog();
                        ui.close_menu();
                    }
                    if ui.button("Add overlay… (⌘P)").clicked() {
                        self.browser.open();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Clear overlays").clicked() {
                        self.registry.clear_all(&mut self.gesture, &mut self.map);
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.checkbox(&mut self.show_graticule, "Graticule").changed() {
                        self.persist_settings();
                    }
                    if ui
                        .checkbox(&mut self.show_boundaries, "Source boundaries")
                        .changed()
                    {
                        self.persist_settings();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("Help (F1)").clicked() {
                        self.show_help = true;
                        ui.close_menu();
                    }
                });
            });
        });

        self.overlay_panel(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Zoom: {:.1}", self.map.zoom_level()));
                    ui.separator();
                    if let Some(geo) = self.last_pointer_geo {
                        ui.label(format!("{:.2}°, {:.2}°", geo.lng, geo.lat));
                        ui.separator();
                    }
                    ui.label(format!("Overlays: {}", self.registry.len()));
                    ui.separator();
                    ui.label(self.gesture.mode_label());
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

            let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll_delta.abs() > 0.0 {
                if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                    if rect.contains(hover_pos) {
                        let zoom_delta = (1.0 + scroll_delta * 0.001).clamp(0.8, 1.25);
                        self.map.zoom_about_screen_point(rect, hover_pos, zoom_delta);
                    }
                }
            }

            let pointer_pos = ctx.input(|i| i.pointer.interact_pos());
            self.last_pointer_geo =
                pointer_pos.and_then(|p| self.map.screen_to_geo(rect, p).ok());

            // Touch contacts when present, otherwise the mouse pointer.
            let contacts: Vec<egui::Pos2> = if self.touch_points.is_empty() {
                pointer_pos.into_iter().collect()
            } else {
                self.touch_points.values().copied().collect()
            };
            let rotate_modifier = ctx.input(|i| i.modifiers.alt);

            let pressed = response.drag_started() || response.clicked();
            if pressed && !self.browser.open {
                self.gesture
                    .on_press(&self.registry, &mut self.map, rect, &contacts, rotate_modifier);
            }

            if !self.gesture.is_idle() {
                // Fed every frame, not only on pointer deltas: edge panning
                // moves the map under a stationary pointer and the preview
                // must follow.
                self.gesture
                    .on_move(&self.registry, &self.map, rect, &contacts, rotate_modifier);
                if let Some(p) = pointer_pos {
                    self.gesture.tick_edge_pan(
                        &mut self.map,
                        rect,
                        p,
                        self.edge_pan_margin,
                        self.edge_pan_step,
                        Instant::now(),
                    );
                }
                ctx.request_repaint_after(std::time::Duration::from_millis(16));
            }

            let released =
                response.drag_stopped() || ctx.input(|i| i.pointer.any_released());
            if released && self.touch_points.is_empty() {
                self.gesture.on_release(&mut self.registry, &mut self.map);
            }

            if self.gesture.is_idle() && self.map.default_panning_enabled() && response.dragged()
            {
                let d = response.drag_delta();
                self.map.pan_by(-d.x, -d.y);
            }

            if response.double_clicked() {
                if let Some(geo) = pointer_pos.and_then(|p| self.map.screen_to_geo(rect, p).ok())
                {
                    let gesture = &self.gesture;
                    if let Some(hit) = self.registry.hit_test(geo, |id| gesture.preview_for(id)) {
                        if self.gesture.active_overlay() != Some(hit) {
                            self.registry.toggle_edit_enabled(hit);
                            self.registry.select_overlay(hit);
                        }
                    }
                }
            }

            let painter = ui.painter_at(rect);
            draw_background(&painter, rect);
            if self.show_graticule {
                draw_graticule(&painter, rect, &self.map);
            }
            if self.show_boundaries {
                draw_boundaries(&painter, rect, &self.map, &self.features);
            }
            let selected = self.registry.selected_id();
            for overlay in self.registry.overlays() {
                let snap = snapshot(overlay, self.gesture.preview_for(overlay.id));
                draw_overlay(&painter, rect, &self.map, &snap, selected == Some(overlay.id));
            }
        });

        if let Some(index) = self.browser.ui(ctx, &self.features) {
            if let Some(feature) = self.features.get(index).cloned() {
                match self.registry.add_overlay(&feature) {
                    Ok(_) => {
                        self.status = Some(format!("Added {}", feature.properties.name));
                    }
                    Err(e) => {
                        self.status =
                            Some(format!("Cannot add {}: {e}", feature.properties.name));
                    }
                }
            }
        }

        draw_help_window(ctx, &mut self.show_help);
    }
}

impl TrueSizeApp {
    fn overlay_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("overlay_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Overlays");
                ui.separator();
                if self.registry.len() == 0 {
                    ui.label("No overlays yet.");
                    ui.label("⌘P opens the boundary search.");
                    return;
                }

                let mut select = None;
                let mut toggle = None;
                let mut focus = None;
                let mut reset = None;
                let mut remove = None;
                let selected_id = self.registry.selected_id();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    for overlay in self.registry.overlays() {
                        let snap = snapshot(overlay, self.gesture.preview_for(overlay.id));
                        let is_selected = selected_id == Some(overlay.id);
                        let title =
                            egui::RichText::new(&overlay.name).color(overlay.color.to_color32());
                        if ui.selectable_label(is_selected, title).clicked() {
                            select = Some(overlay.id);
                        }
                        let origin = format!("{} {}", overlay.code, overlay.country);
                        let origin = origin.trim();
                        if !origin.is_empty() && origin != overlay.name {
                            ui.small(origin);
                        }
                        let area = geometry::format_area(overlay.area_km2);
                        ui.small(format!("{} km² · {} mi²", area.km2, area.mi2));
                        ui.small(format!(
                            "apparent size {:.0}% · rotation {:.0}°",
                            snap.mercator_scale_factor * 100.0,
                            snap.rotation_radians.to_degrees()
                        ));
                        let mut edit = overlay.edit_enabled;
                        if ui.checkbox(&mut edit, "Editable").changed() {
                            toggle = Some(overlay.id);
                        }
                        ui.horizontal(|ui| {
                            if ui.small_button("Focus").clicked() {
                                focus = Some(overlay.id);
                            }
                            if ui.small_button("Reset").clicked() {
                                reset = Some(overlay.id);
                            }
                            if ui.small_button("Remove").clicked() {
                                remove = Some(overlay.id);
                            }
                        });
                        ui.separator();
                    }
                });

                if let Some(id) = select {
                    self.registry.select_overlay(id);
                }
                if let Some(id) = toggle {
                    self.registry.toggle_edit_enabled(id);
                }
                if let Some(id) = focus {
                    if let Some(overlay) = self.registry.get(id) {
                        let target = geometry::bounds(&overlay.current_geometry)
                            .map(|b| b.center())
                            .unwrap_or(overlay.current_centroid);
                        self.map.center_on(target);
                    }
                }
                if let Some(id) = reset {
                    // Any in-flight gesture on this overlay is stale now.
                    self.gesture.release_if(id, &mut self.map);
                    self.registry.reset_overlay(id);
                }
                if let Some(id) = remove {
                    self.registry
                        .remove_overlay(id, &mut self.gesture, &mut self.map);
                }
            });
    }
}
