mod app;
mod model;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "True Size",
        native_options,
        Box::new(|cc| Ok(Box::new(app::TrueSizeApp::new(cc)))),
    )
}
