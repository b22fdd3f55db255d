//! Mapping pointer events over the rendered image into normalized image space.
//!
//! Two reference frames are involved. Normalized coordinates are relative to
//! the image's own rendered box, which may be letterboxed inside its
//! container. Display coordinates are relative to the container, since that is
//! the space the overlay is painted in.

use tracing::{debug, error, info, trace, warn};

use egui::{Pos2, Rect, Vec2};

/// Decimal places kept on normalized coordinates.
pub const NORMALIZED_DECIMALS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedPos {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// One captured click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPoint {
    /// Pixels from the container's top-left, for overlay placement only
    pub display_position: Pos2,
    pub normalized_position: NormalizedPos,
}

impl ClickPoint {
    /// `[x, y]` pair as sent to the save operator.
    pub fn keypoint(&self) -> [f64; 2] {
        [self.normalized_position.x, self.normalized_position.y]
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn is_measured(rect: &Rect) -> bool {
    rect.width() > 0.0 && rect.height() > 0.0
}

/// Maps a pointer position (screen space) to a [`ClickPoint`].
///
/// Returns `None` when either box has not been measured yet. Positions
/// outside the image box are not clamped.
pub fn map_event(pointer: Pos2, image: Option<Rect>, container: Option<Rect>) -> Option<ClickPoint> {
    let (Some(image), Some(container)) = (image, container) else {
        trace!("Dropping click at {:?}, layout not measured", pointer);
        return None;
    };

    if !is_measured(&image) {
        trace!("Dropping click at {:?}, image box is empty", pointer);
        return None;
    }

    let display_position = (pointer - container.min).to_pos2();

    let img_x = pointer.x as f64 - image.min.x as f64;
    let img_y = pointer.y as f64 - image.min.y as f64;

    let normalized_x = img_x / image.width() as f64;
    let normalized_y = img_y / image.height() as f64;

    Some(ClickPoint {
        display_position,
        normalized_position: NormalizedPos::new(
            round_to(normalized_x, NORMALIZED_DECIMALS),
            round_to(normalized_y, NORMALIZED_DECIMALS),
        ),
    })
}

/// Rendered box of an image of `image_size` scaled to fit inside `container`
/// with its aspect ratio kept, centered on both axes.
pub fn contain_rect(container: Rect, image_size: Option<Vec2>) -> Option<Rect> {
    let size = image_size?;
    if size.x <= 0.0 || size.y <= 0.0 || !is_measured(&container) {
        return None;
    }

    let scale = (container.width() / size.x).min(container.height() / size.y);

    Some(Rect::from_center_size(container.center(), size * scale))
}

/// Screen position of a stored display position.
pub fn overlay_anchor(container: Rect, display_position: Pos2) -> Pos2 {
    container.min + display_position.to_vec2()
}
