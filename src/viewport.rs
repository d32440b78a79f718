//! Face bounding box and viewport transform
//!
//! Stateless per-frame derivation of the padded face bounding region and the
//! zoom/translate transform that keeps the subject centered. Both are
//! recomputed on every frame the landmarks change; nothing here carries state
//! across frames.

use crate::types::{BoundingBox, LandmarkPoint, ZoomTransform};

/// Compute the padded, clamped bounding box over all landmarks.
///
/// The raw min/max box is expanded by `padding_fraction` of its own width and
/// height on each side, then clamped to the unit frame:
///
/// ```text
/// padded_min    = max(0, min - extent * padding)
/// padded_extent = min(1 - padded_min, extent * (1 + 2 * padding))
/// ```
///
/// Returns `None` for an empty landmark list.
pub fn bounding_box(landmarks: &[LandmarkPoint], padding_fraction: f64) -> Option<BoundingBox> {
    if landmarks.is_empty() {
        return None;
    }

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    for point in landmarks {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    let width = max_x - min_x;
    let height = max_y - min_y;

    let padded_x = (min_x - width * padding_fraction).max(0.0);
    let padded_y = (min_y - height * padding_fraction).max(0.0);
    let padded_width = (width * (1.0 + 2.0 * padding_fraction)).min(1.0 - padded_x);
    let padded_height = (height * (1.0 + 2.0 * padding_fraction)).min(1.0 - padded_y);

    Some(BoundingBox {
        x: padded_x,
        y: padded_y,
        width: padded_width,
        height: padded_height,
    })
}

/// Derive the zoom/translate transform that fills the frame with the box.
///
/// `scale = min(1/width, 1/height, max_zoom)`; the translation re-centers the
/// box's center on the frame's center, as a percentage offset per axis.
pub fn zoom_transform(bbox: &BoundingBox, max_zoom: f64) -> ZoomTransform {
    let zoom_x = if bbox.width > 0.0 {
        1.0 / bbox.width
    } else {
        max_zoom
    };
    let zoom_y = if bbox.height > 0.0 {
        1.0 / bbox.height
    } else {
        max_zoom
    };
    let scale = zoom_x.min(zoom_y).min(max_zoom);

    let (center_x, center_y) = bbox.center();

    ZoomTransform {
        scale,
        translate_x_pct: (0.5 - center_x) * 100.0,
        translate_y_pct: (0.5 - center_y) * 100.0,
    }
}
