use egui::{Color32, RichText};

use crate::operators::SubmissionKind;

use super::ui_types::App;

const SUBMIT_COLOR: Color32 = Color32::from_rgb(0x21, 0x96, 0xf3);
const CLEAR_COLOR: Color32 = Color32::from_rgb(0xff, 0x55, 0x55);

/// Labelled single-line input. Returns the new text when it was edited.
fn text_input(ui: &mut egui::Ui, label: &str, hint: &str, value: &str) -> Option<String> {
    let mut text = value.to_string();
    let mut changed = false;
    ui.vertical(|ui| {
        ui.label(RichText::new(label).color(Color32::GRAY));
        changed = ui
            .add(
                egui::TextEdit::singleline(&mut text)
                    .hint_text(hint)
                    .font(egui::TextStyle::Monospace)
                    .desired_width(f32::INFINITY),
            )
            .changed();
    });
    changed.then_some(text)
}

fn submit_button(text: String, enabled: bool) -> egui::Button<'static> {
    let button = egui::Button::new(RichText::new(text).size(16.).strong().color(Color32::WHITE));
    if enabled {
        button.fill(SUBMIT_COLOR)
    } else {
        button
    }
}

impl App {
    pub fn session_controls(&mut self, ui: &mut egui::Ui) {
        if let Some(s) = text_input(
            ui,
            "Sample field name for saving clicks (as keypoints)",
            "e.g., user_clicks, keypoints",
            self.session.field_name(),
        ) {
            self.session.set_field_name(s);
        }

        if let Some(s) = text_input(
            ui,
            "Label name for the current set of clicks",
            "e.g., animal, person",
            self.session.label_name(),
        ) {
            self.session.set_label_name(s);
        }

        ui.add_space(4.);

        let n = self.session.len();

        ui.horizontal(|ui| {
            let can_save = self.session.can_save();
            if ui
                .add_enabled(can_save, submit_button(format!("Save as Keypoints ({})", n), can_save))
                .clicked()
            {
                self.save_as_keypoints();
            }

            if ui
                .add(
                    egui::Button::new(
                        RichText::new(format!("Clear Clicks ({})", n))
                            .size(16.)
                            .color(Color32::WHITE),
                    )
                    .fill(CLEAR_COLOR),
                )
                .clicked()
            {
                self.session.clear();
            }

            if self.session.is_pending(SubmissionKind::SaveKeypoints) {
                ui.spinner();
            }
        });

        ui.separator();

        if let Some(s) = text_input(
            ui,
            "Promptable segmentation model from FiftyOne model zoo",
            "e.g., segment-anything-2-hiera-small-image-torch",
            self.session.model_name(),
        ) {
            self.session.set_model_name(s);
        }

        ui.add_space(4.);

        ui.horizontal(|ui| {
            let can_segment = self.session.can_segment();
            if ui
                .add_enabled(
                    can_segment,
                    submit_button("Segment with keypoints".to_string(), can_segment),
                )
                .clicked()
            {
                self.segment_with_keypoints();
            }

            if self.session.is_pending(SubmissionKind::SegmentWithKeypoints) {
                ui.spinner();
                ui.label("Segmenting...");
            }
        });
    }
}
