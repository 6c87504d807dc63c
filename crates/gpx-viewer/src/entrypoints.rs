//! Native entry point: logging setup, async runtime and the eframe window

use crate::{APP_NAME, GpxViewerApp};
use tracing_subscriber::prelude::*;

/// Initialize the `tracing` subscriber.
///
/// If `RUST_LOG` is not set, a default filter is installed first: verbose in
/// debug builds, `info` in release builds.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            if cfg!(debug_assertions) {
                std::env::set_var(
                    "RUST_LOG",
                    "debug,eframe::native=warn,hyper_util=info,walkers=info,egui::context=warn,reqwest::connect=info",
                );
            } else {
                std::env::set_var("RUST_LOG", "info,eframe::native=warn,egui::context=warn");
            }
        }
    }

    let fmt_layer = fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!(
        "{} {} (log filter: {})",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        std::env::var("RUST_LOG").unwrap_or_default()
    );
}

/// Run the application on desktop platforms. Call this from `main.rs`.
pub fn run_native() {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        native_main().await;
    });
}

async fn native_main() {
    // Must run before anything logs
    setup_logging();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(APP_NAME)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(|cc| Ok(Box::new(GpxViewerApp::new(cc)))),
    ) {
        tracing::error!("Application exited with an error: {}", e);
    }
}
