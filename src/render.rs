//! Diagnostic rasterizer.
//!
//! Draws one run's analysis state into a single image covering the layout bounds. Layers,
//! bottom to top: white background, occupied zones filled green, modified pixels inside
//! each object in black, object outlines in red, zone outlines with their numeric id in
//! blue. Absolute coordinates are translated by the bounds origin.

use image::{Rgb, RgbImage};

use crate::geometry::{Bounds, Outline};
use crate::model::ZoneId;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const OCCUPIED_FILL: Rgb<u8> = Rgb([0, 200, 0]);
pub const MODIFIED_PIXEL: Rgb<u8> = Rgb([0, 0, 0]);
pub const OBJECT_OUTLINE: Rgb<u8> = Rgb([255, 0, 0]);
pub const ZONE_OUTLINE: Rgb<u8> = Rgb([0, 0, 255]);

const LABEL_SCALE: i32 = 2;
const LABEL_MARGIN: i32 = 3;

/// 3x5 digit glyphs, one row per byte, bit 2 is the leftmost column.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Image returned when there is nothing to render.
pub fn placeholder_frame() -> RgbImage {
    RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]))
}

/// Rasterize zones, occupancy and objects.
///
/// `zones` pairs each zone id with its absolute outline. `is_modified` answers whether
/// the absolute pixel differs from its reference; it is only asked about pixels inside
/// `objects`.
pub fn render_diagnostic(
    bounds: Outline,
    zones: &[(ZoneId, Outline)],
    occupied: &[ZoneId],
    objects: &[Outline],
    mut is_modified: impl FnMut(i32, i32) -> bool,
) -> RgbImage {
    let mut canvas = Canvas::new(bounds);

    for (id, outline) in zones {
        if occupied.contains(id) {
            canvas.fill(outline, OCCUPIED_FILL);
        }
    }

    for object in objects {
        for y in object.y()..=object.end_y() {
            for x in object.x()..=object.end_x() {
                if bounds.contains(x, y) && is_modified(x, y) {
                    canvas.put(x, y, MODIFIED_PIXEL);
                }
            }
        }
    }

    for object in objects {
        canvas.stroke(object, OBJECT_OUTLINE);
    }

    for (id, outline) in zones {
        canvas.stroke(outline, ZONE_OUTLINE);
        canvas.label(
            outline.x() + LABEL_MARGIN,
            outline.y() + LABEL_MARGIN,
            *id,
            ZONE_OUTLINE,
        );
    }

    canvas.image
}

struct Canvas {
    origin: (i32, i32),
    image: RgbImage,
}

impl Canvas {
    fn new(bounds: Outline) -> Self {
        Self {
            origin: (bounds.x(), bounds.y()),
            image: RgbImage::from_pixel(bounds.width() as u32, bounds.height() as u32, BACKGROUND),
        }
    }

    /// Plot at absolute coordinates; anything off the canvas is dropped.
    fn put(&mut self, x: i32, y: i32, color: Rgb<u8>) {
        let (cx, cy) = (x - self.origin.0, y - self.origin.1);
        if cx < 0 || cy < 0 || cx as u32 >= self.image.width() || cy as u32 >= self.image.height() {
            return;
        }
        self.image.put_pixel(cx as u32, cy as u32, color);
    }

    fn fill(&mut self, outline: &Outline, color: Rgb<u8>) {
        for y in outline.y()..=outline.end_y() {
            for x in outline.x()..=outline.end_x() {
                self.put(x, y, color);
            }
        }
    }

    fn stroke(&mut self, outline: &Outline, color: Rgb<u8>) {
        for x in outline.x()..=outline.end_x() {
            self.put(x, outline.y(), color);
            self.put(x, outline.end_y(), color);
        }
        for y in outline.y()..=outline.end_y() {
            self.put(outline.x(), y, color);
            self.put(outline.end_x(), y, color);
        }
    }

    fn label(&mut self, x: i32, y: i32, value: ZoneId, color: Rgb<u8>) {
        let text = value.to_string();
        let advance = 4 * LABEL_SCALE;
        for (index, digit) in text.bytes().enumerate() {
            let glyph = &DIGITS[(digit - b'0') as usize];
            let left = x + index as i32 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) == 0 {
                        continue;
                    }
                    let px = left + col * LABEL_SCALE;
                    let py = y + row as i32 * LABEL_SCALE;
                    for dy in 0..LABEL_SCALE {
                        for dx in 0..LABEL_SCALE {
                            self.put(px + dx, py + dy, color);
                        }
                    }
                }
            }
        }
    }
}
