use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use crate::{appconfig::CONFIG_FILE, notices::Notice, sample::ActiveSample};

use super::ui_types::App;

impl App {
    pub fn options(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self._options(ui);
        });
    }

    fn _options(&mut self, ui: &mut egui::Ui) {
        egui::widgets::global_theme_preference_buttons(ui);

        ui.separator();

        ui.heading("Sample");
        egui::Grid::new("sample_options").num_columns(2).show(ui, |ui| {
            ui.label("Sample ID:");
            ui.text_edit_singleline(&mut self.sample_id_input);
            ui.end_row();

            ui.label("File path:");
            ui.text_edit_singleline(&mut self.sample_filepath_input);
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui.button("Open Sample").clicked() {
                let id = self.sample_id_input.trim();
                let filepath = self.sample_filepath_input.trim();
                if id.is_empty() || filepath.is_empty() {
                    self.notices
                        .push(Notice::warning("Enter a sample ID and a file path"));
                } else {
                    let sample = ActiveSample::new(id, filepath);
                    self.set_active_sample(Some(sample));
                }
            }

            if ui
                .add_enabled(self.active_sample.is_some(), egui::Button::new("Close Sample"))
                .clicked()
            {
                self.set_active_sample(None);
            }
        });

        match &self.active_sample {
            Some(sample) => ui.label(format!("Active: {} ({})", sample.id, sample.filepath)),
            None => ui.label("No sample selected"),
        };

        ui.separator();

        ui.heading("Server");
        egui::Grid::new("server_options").num_columns(2).show(ui, |ui| {
            ui.label("Server URL:");
            ui.text_edit_singleline(&mut self.settings.server_url);
            ui.end_row();

            ui.label("Dataset:");
            ui.text_edit_singleline(&mut self.settings.dataset_name);
            ui.end_row();

            ui.label("Plugin URI:");
            ui.text_edit_singleline(&mut self.settings.plugin_uri);
            ui.end_row();

            ui.label("Request timeout (s):");
            ui.add(
                egui::DragValue::new(&mut self.settings.request_timeout_secs)
                    .range(1..=3600)
                    .speed(1.0),
            );
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui.button("Reconnect").clicked() {
                self.restart_operators();
            }

            if ui.button("Save Config").clicked() {
                match self.settings.save_to_file(CONFIG_FILE) {
                    Ok(()) => {
                        info!("Saved settings to {}", CONFIG_FILE);
                        self.notices
                            .push(Notice::success(format!("Saved {}", CONFIG_FILE)));
                    }
                    Err(e) => {
                        error!("Failed to save settings: {:#}", e);
                        self.notices
                            .push(Notice::error(format!("Failed to save settings: {:#}", e)));
                    }
                }
            }
        });
    }
}
