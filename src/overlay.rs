//! Debug overlay: the sheet with every bubble outlined (green when filled,
//! red otherwise) and its fill ratio printed above it.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;

use crate::models::ClassifiedBubble;

const FILLED: Rgb<u8> = Rgb([0, 200, 0]);
const EMPTY: Rgb<u8> = Rgb([220, 0, 0]);
const LABEL: Rgb<u8> = Rgb([0, 0, 255]);

/// Glyph cell scale in pixels
const FONT_SCALE: u32 = 2;
const GLYPH_W: i32 = 3;
const GLYPH_H: i32 = 5;

/// Render the annotated sheet
pub fn render_overlay(gray: &GrayImage, bubbles: &[ClassifiedBubble]) -> RgbImage {
    let mut canvas = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });

    for bubble in bubbles {
        let color = if bubble.is_filled { FILLED } else { EMPTY };
        let center = (bubble.x.round() as i32, bubble.y.round() as i32);
        let radius = bubble.radius.round().max(1.0) as i32;
        draw_hollow_circle_mut(&mut canvas, center, radius, color);
        draw_hollow_circle_mut(&mut canvas, center, radius + 1, color);

        let label = format!("{:.2}", bubble.fill_ratio);
        let text_w = label.len() as i32 * (GLYPH_W + 1) * FONT_SCALE as i32;
        let text_h = GLYPH_H * FONT_SCALE as i32;
        draw_text(
            &mut canvas,
            center.0 - text_w / 2,
            center.1 - radius - text_h - 3,
            &label,
        );
    }

    canvas
}

fn draw_text(canvas: &mut RgbImage, x: i32, y: i32, text: &str) {
    let step = (GLYPH_W + 1) * FONT_SCALE as i32;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let gx = x + i as i32 * step;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let px = gx + col * FONT_SCALE as i32;
                let py = y + row as i32 * FONT_SCALE as i32;
                draw_filled_rect_mut(
                    canvas,
                    Rect::at(px, py).of_size(FONT_SCALE, FONT_SCALE),
                    LABEL,
                );
            }
        }
    }
}

/// 3x5 bitmap, one byte per row, most significant of the low 3 bits is the left column
fn glyph(ch: char) -> Option<[u8; 5]> {
    let rows = match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BubbleCandidate;

    #[test]
    fn test_outline_colors() {
        let gray = GrayImage::from_pixel(120, 80, image::Luma([255u8]));
        let bubbles = [
            ClassifiedBubble::new(BubbleCandidate::new(30.0, 50.0, 10.0), 0.9, 0.35),
            ClassifiedBubble::new(BubbleCandidate::new(90.0, 50.0, 10.0), 0.1, 0.35),
        ];
        let overlay = render_overlay(&gray, &bubbles);

        assert_eq!(overlay.dimensions(), (120, 80));
        assert_eq!(*overlay.get_pixel(40, 50), FILLED);
        assert_eq!(*overlay.get_pixel(100, 50), EMPTY);
        assert_eq!(*overlay.get_pixel(5, 5), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_label_is_drawn_above_bubble() {
        let gray = GrayImage::from_pixel(100, 100, image::Luma([255u8]));
        let bubbles = [ClassifiedBubble::new(BubbleCandidate::new(50.0, 60.0, 10.0), 0.5, 0.35)];
        let overlay = render_overlay(&gray, &bubbles);

        let label_pixels = overlay
            .enumerate_pixels()
            .filter(|(_, y, p)| *y < 50 && **p == LABEL)
            .count();
        assert!(label_pixels > 0);
    }

    #[test]
    fn test_labels_clip_at_edges() {
        let gray = GrayImage::from_pixel(20, 20, image::Luma([128u8]));
        let bubbles = [ClassifiedBubble::new(BubbleCandidate::new(2.0, 2.0, 8.0), 1.0, 0.35)];
        let overlay = render_overlay(&gray, &bubbles);
        assert_eq!(overlay.dimensions(), (20, 20));
    }
}
