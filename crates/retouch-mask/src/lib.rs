// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stroke-based mask compositor.
//!
//! Accumulates freehand pointer strokes as circular paint points in
//! source-image pixel space, then rasterizes them into a binary
//! (opaque/transparent) PNG mask matching the source image's dimensions.
//! The provider treats transparent pixels as "edit here".

use std::io::Cursor;

use image::{ImageFormat, ImageReader, Rgba, RgbaImage};
use retouch_core::RetouchError;
use tracing::debug;

/// One circular paint point, in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskPoint {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Scale factor from on-screen (displayed) coordinates to source-image pixels.
///
/// The displayed canvas may be scaled down to fit the viewport; pointer events
/// arrive in display space and must be mapped back to the backing resolution.
#[derive(Debug, Clone, Copy)]
pub struct DisplayScale {
    /// Backing width divided by displayed width.
    pub x: f32,
    /// Backing height divided by displayed height.
    pub y: f32,
}

impl DisplayScale {
    /// Derive the scale from the backing resolution and the displayed size.
    pub fn new(image_width: u32, image_height: u32, display_width: f32, display_height: f32) -> Self {
        Self {
            x: image_width as f32 / display_width,
            y: image_height as f32 / display_height,
        }
    }

    /// Identity scale: display space equals image space.
    pub fn identity() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Accumulates an ordered sequence of [`MaskPoint`]s while the user drags a
/// pointer, and rasterizes them on save.
///
/// Points are ephemeral: they live only while the editor is open, and
/// [`MaskEditor::clear`] discards them all.
#[derive(Debug)]
pub struct MaskEditor {
    width: u32,
    height: u32,
    points: Vec<MaskPoint>,
    last: Option<MaskPoint>,
}

impl MaskEditor {
    /// Create an editor for a source image of the given pixel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            points: Vec::new(),
            last: None,
        }
    }

    /// Source image dimensions this editor targets.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Recorded points, in stroke order.
    pub fn points(&self) -> &[MaskPoint] {
        &self.points
    }

    /// Convert an on-screen pointer position to source-image pixel space.
    pub fn screen_to_image(&self, screen_x: f32, screen_y: f32, scale: DisplayScale) -> (f32, f32) {
        (screen_x * scale.x, screen_y * scale.y)
    }

    /// Begin a stroke at a point already in image space.
    pub fn begin_stroke(&mut self, x: f32, y: f32, radius: f32) {
        let point = MaskPoint { x, y, radius };
        self.points.push(point);
        self.last = Some(point);
    }

    /// Extend the current stroke to a new image-space position.
    ///
    /// Interpolates intermediate points along the drag segment at a step of
    /// `max(1, radius / 4)` pixels so fast drags produce a continuous stroke
    /// rather than discrete dots. The endpoint is always recorded.
    pub fn stroke_to(&mut self, x: f32, y: f32, radius: f32) {
        let Some(prev) = self.last else {
            self.begin_stroke(x, y, radius);
            return;
        };

        let dx = x - prev.x;
        let dy = y - prev.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let step = (radius / 4.0).max(1.0);

        let mut travelled = step;
        while travelled < dist {
            let t = travelled / dist;
            self.points.push(MaskPoint {
                x: prev.x + dx * t,
                y: prev.y + dy * t,
                radius,
            });
            travelled += step;
        }

        let endpoint = MaskPoint { x, y, radius };
        self.points.push(endpoint);
        self.last = Some(endpoint);
    }

    /// End the current stroke. The next `stroke_to` starts a new one.
    pub fn end_stroke(&mut self) {
        self.last = None;
    }

    /// Discard all recorded points.
    pub fn clear(&mut self) {
        self.points.clear();
        self.last = None;
    }

    /// Whether any paint has been recorded.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rasterize the recorded points into PNG mask bytes.
    ///
    /// Starts from a fully opaque image-sized canvas, then punches out a
    /// filled circle (alpha set to zero) at every recorded point. Overlapping
    /// strokes subtract; they never re-add opacity.
    pub fn rasterize(&self) -> Result<Vec<u8>, RetouchError> {
        let mut canvas =
            RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 255]));

        for point in &self.points {
            punch_circle(&mut canvas, point);
        }

        debug!(
            points = self.points.len(),
            width = self.width,
            height = self.height,
            "rasterized mask"
        );

        let mut bytes = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RetouchError::Internal(format!("mask encoding failed: {e}")))?;
        Ok(bytes)
    }
}

/// Set alpha to zero inside a filled circle, clamped to the canvas bounds.
fn punch_circle(canvas: &mut RgbaImage, point: &MaskPoint) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let r = point.radius;
    let r_sq = r * r;

    let min_x = (point.x - r).floor().max(0.0) as u32;
    let max_x = ((point.x + r).ceil() as i64).min(width as i64 - 1).max(0) as u32;
    let min_y = (point.y - r).floor().max(0.0) as u32;
    let max_y = ((point.y + r).ceil() as i64).min(height as i64 - 1).max(0) as u32;

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let dx = px as f32 + 0.5 - point.x;
            let dy = py as f32 + 0.5 - point.y;
            if dx * dx + dy * dy <= r_sq {
                canvas.get_pixel_mut(px, py).0[3] = 0;
            }
        }
    }
}

/// Validate a user-uploaded mask against the source image's dimensions.
///
/// Only PNG masks are accepted, and the pixel dimensions must exactly match
/// the source image. The error message names both dimension pairs.
pub fn validate_mask(bytes: &[u8], source_dims: (u32, u32)) -> Result<(), RetouchError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RetouchError::Validation(format!("mask is not a readable image: {e}")))?;

    if reader.format() != Some(ImageFormat::Png) {
        return Err(RetouchError::Validation(
            "mask must be a PNG image".to_string(),
        ));
    }

    let (mask_w, mask_h) = reader
        .into_dimensions()
        .map_err(|e| RetouchError::Validation(format!("mask is not a valid PNG: {e}")))?;

    let (src_w, src_h) = source_dims;
    if (mask_w, mask_h) != (src_w, src_h) {
        return Err(RetouchError::Validation(format!(
            "mask dimensions {mask_w}x{mask_h} do not match image dimensions {src_w}x{src_h}"
        )));
    }

    Ok(())
}
