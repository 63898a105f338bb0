use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(420.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                ui.label("General");
                help_row(ui, "⌘P / Ctrl+P", "Open boundary search");
                help_row(ui, "⌘O / Ctrl+O", "Open a GeoJSON dataset");
                help_row(ui, "Escape", "Cancel the active drag or rotation");
                help_row(ui, "F1", "Toggle this window");

                ui.add_space(10.0);
                ui.label("Map");
                help_row(ui, "Drag", "Pan the map");
                help_row(ui, "Scroll wheel", "Zoom about the pointer");

                ui.add_space(10.0);
                ui.label("Overlays");
                help_row(ui, "Drag", "Move the selected overlay (when it lands on it)");
                help_row(ui, "Alt + drag", "Rotate the selected overlay about its centroid");
                help_row(ui, "Two fingers", "Rotate with a twist gesture");
                help_row(ui, "Double-click", "Toggle editing for the overlay under the pointer");

                ui.add_space(20.0);
                ui.heading("Reading the Map");
                ui.separator();
                ui.label(
                    "Each overlay is redrawn from its source shape as you move it, so the \
                     Mercator projection inflates or deflates it honestly. The percentage \
                     next to its name is the apparent size relative to where the shape \
                     started: drag Greenland to the equator and watch it shrink.",
                );

                ui.add_space(20.0);
                ui.heading("Files");
                ui.separator();
                ui.label("• Boundary datasets are GeoJSON FeatureCollections (.geojson, .json)");
                ui.label("• Settings are stored in truesize.toml");

                ui.add_space(20.0);
                ui.heading("Tips");
                ui.separator();
                ui.label("• Only the selected, edit-enabled overlay responds to drag and rotate");
                ui.label("• Drag toward a viewport edge to pan the map without releasing");
                ui.label("• Reset in the side panel returns an overlay to its home position");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [120.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}
