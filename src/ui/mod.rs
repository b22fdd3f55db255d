pub mod click_canvas;
pub mod operator_ui;
pub mod options;
pub mod session_controls;
pub mod ui_types;

use ui_types::*;

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use egui::{Color32, RichText};

use crate::sample::ActiveSample;

/// New
impl App {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let mut out: Self = if let Some(storage) = cc.storage {
            eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default()
        } else {
            Default::default()
        };

        out.settings = crate::appconfig::read_settings_or_default(crate::appconfig::CONFIG_FILE);
        out.session = out.settings.new_session();

        if let Some(sample) = out.settings.startup_sample() {
            out.sample_id_input = sample.id.clone();
            out.sample_filepath_input = sample.filepath.clone();
            out.set_active_sample(Some(sample));
        }

        out
    }

    /// Switching samples starts a new, empty session.
    pub fn set_active_sample(&mut self, sample: Option<ActiveSample>) {
        if sample == self.active_sample {
            return;
        }
        match &sample {
            Some(s) => info!("Active sample: {} ({})", s.id, s.filepath),
            None => info!("No active sample"),
        }
        self.session.reset_for_sample(sample.as_ref());
        self.active_sample = sample;
        self.image_status = None;
    }
}

/// side panel
impl App {
    fn notice_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Notices");
        ui.horizontal(|ui| {
            if ui.button("Clear All").clicked() {
                self.notices.clear();
            }

            let count = self.notices.len();
            ui.label(format!("({} notice{})", count, if count == 1 { "" } else { "s" }));
        });

        egui::ScrollArea::vertical()
            .max_height(400.0)
            .show(ui, |ui| {
                for notice in self.notices.newest_first() {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(
                            RichText::new(notice.at.format("%H:%M:%S").to_string())
                                .monospace()
                                .color(Color32::GRAY),
                        );
                        ui.label(RichText::new(&notice.message).color(notice.level.color()));
                    });
                    ui.separator();
                }
            });

        ui.separator();

        ui.heading("Operators");
        let Some(status) = self.operator_status.as_ref() else {
            ui.label("Not connected");
            return;
        };
        let status = status.read().clone();

        ui.label(format!("In flight: {}", status.in_flight));
        ui.label(format!("Completed: {}", status.completed));
        ui.label(format!("Failed: {}", status.failed));
        if let Some(at) = status.last_completed {
            ui.label(format!("Last result: {}", at.format("%H:%M:%S")));
        }
        if let Some(e) = &status.last_error {
            ui.label(RichText::new(format!("Last error: {}", e)).color(Color32::from_rgb(255, 100, 100)));
        }
    }
}

impl eframe::App for App {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        /// Init operators
        if !self.operators_started {
            self.start_operators();
        }

        self.handle_operator_messages(ctx);

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.current_tab, Tab::Annotate, "Annotate");
                ui.selectable_value(&mut self.current_tab, Tab::Options, "Options");
            });
        });

        egui::SidePanel::right("right")
            .resizable(false)
            .default_width(320.)
            .show(ctx, |ui| {
                self.notice_panel(ui);
            });

        match self.current_tab {
            Tab::Annotate => {
                egui::TopBottomPanel::bottom("session controls")
                    .resizable(false)
                    .show(ctx, |ui| {
                        ui.add_space(4.);
                        self.session_controls(ui);
                        ui.add_space(4.);
                    });

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Image segmentation via point prompts");
                    ui.label(
                        RichText::new("Click on the image to capture coordinates")
                            .size(12.)
                            .color(Color32::GRAY),
                    );
                    ui.add_space(10.);

                    self.click_canvas(ui);
                });
            }
            Tab::Options => {
                self.options(ctx);
            }
        }
    }
}
