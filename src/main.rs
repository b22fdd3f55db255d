#![allow(unused_imports)]
#![allow(unused_doc_comments)]
// #![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

pub mod appconfig;
pub mod geometry;
pub mod logging;
pub mod notices;
pub mod operators;
pub mod sample;
pub mod session;
pub mod ui;

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

/// Main App
fn main() -> eframe::Result<()> {
    use ui::ui_types::App;

    let _log_guard = logging::init_logs();
    debug!("Init");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 1100.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "click_segmentation",
        native_options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}
