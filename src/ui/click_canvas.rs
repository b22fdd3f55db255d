use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use egui::{Color32, Rect, Sense, Stroke, Vec2};

use crate::geometry;

use super::ui_types::App;

pub const CONTAINER_HEIGHT: f32 = 800.;

const BACKGROUND: Color32 = Color32::from_rgb(0x1e, 0x1e, 0x1e);
const MARKER_FILL: Color32 = Color32::from_rgb(0xff, 0x44, 0x44);
const MARKER_RADIUS: f32 = 4.;
const MARKER_BORDER: f32 = 2.;

impl App {
    /// Image viewer with click markers.
    pub fn click_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(sample) = self.active_sample.clone() else {
            ui.label("No sample selected");
            return;
        };

        let url = match sample.media_url(&self.settings.server_url) {
            Ok(url) => url.to_string(),
            Err(e) => {
                ui.colored_label(Color32::from_rgb(255, 100, 100), format!("{:#}", e));
                return;
            }
        };

        let height = CONTAINER_HEIGHT.min(ui.available_height().max(100.));
        let size = Vec2::new(ui.available_width(), height);
        let (container, resp) = ui.allocate_exact_size(size, Sense::click());

        let painter = ui.painter_at(container);
        painter.rect_filled(container, 4., BACKGROUND);

        let image = egui::Image::new(url.clone());

        /// rendered box of the image inside the container, once its size is known
        let image_rect = match image.load_for_size(ui.ctx(), container.size()) {
            Ok(poll) => {
                let rect = geometry::contain_rect(container, poll.size());
                if rect.is_some() {
                    self.log_image_status(&url, true);
                }
                rect
            }
            Err(e) => {
                if self.log_image_status(&url, false) {
                    error!("Image failed to load: {}", e);
                }
                painter.text(
                    container.center(),
                    egui::Align2::CENTER_CENTER,
                    "Image failed to load",
                    egui::FontId::proportional(16.),
                    Color32::GRAY,
                );
                None
            }
        };

        if let Some(rect) = image_rect {
            image.paint_at(ui, rect);
        }

        if resp.clicked() {
            if let Some(pos) = resp.interact_pointer_pos() {
                if let Some(point) = geometry::map_event(pos, image_rect, Some(container)) {
                    debug!("Click captured: {:?}", point);
                    self.session.add_point(point);
                }
            }
        }

        for point in self.session.points() {
            let center = geometry::overlay_anchor(container, point.display_position);
            painter.circle_filled(
                center,
                MARKER_RADIUS + MARKER_BORDER + 2.,
                Color32::from_black_alpha(64),
            );
            painter.circle(
                center,
                MARKER_RADIUS + MARKER_BORDER / 2.,
                MARKER_FILL,
                Stroke::new(MARKER_BORDER, Color32::WHITE),
            );
        }

        resp.on_hover_cursor(egui::CursorIcon::Crosshair);
    }

    /// Returns true when the status for `url` changed.
    fn log_image_status(&mut self, url: &str, loaded: bool) -> bool {
        if let Some((prev_url, prev_loaded)) = &self.image_status {
            if prev_url == url && *prev_loaded == loaded {
                return false;
            }
        }
        if loaded {
            info!("Image loaded successfully: {}", url);
        }
        self.image_status = Some((url.to_string(), loaded));
        true
    }
}
