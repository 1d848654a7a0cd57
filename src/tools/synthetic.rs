//! Synthetic answer sheets: a grid of outlined bubbles on white paper with
//! chosen bubbles marked. Used for tests, benches and `omrtool render-sample`.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;

/// Vertices used to approximate the half-mark arc
const ARC_STEPS: usize = 32;

/// How a bubble is marked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Outline only
    Empty,
    /// Fully inked
    Filled,
    /// Lower half inked
    Half,
}

/// Geometry and shading of a synthetic sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    /// Question rows
    pub rows: usize,
    /// Bubbles per row
    pub options: usize,
    /// Outer bubble radius (px)
    pub radius: f32,
    /// Outline thickness (px)
    pub outline: f32,
    /// Horizontal center spacing (px)
    pub spacing_x: f32,
    /// Vertical center spacing (px)
    pub spacing_y: f32,
    /// Distance from the sheet edge to the first bubble center (px)
    pub margin: f32,
    /// Paper luminance
    pub paper: u8,
    /// Outline luminance
    pub ink: u8,
    /// Luminance of marked areas (pen is dark, pencil is mid-gray)
    pub fill: u8,
    /// Paper darkening from left to right edge, simulating uneven light
    pub shading: u8,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            rows: 5,
            options: 4,
            radius: 20.0,
            outline: 2.0,
            spacing_x: 60.0,
            spacing_y: 70.0,
            margin: 40.0,
            paper: 250,
            ink: 20,
            fill: 20,
            shading: 0,
        }
    }
}

impl SheetLayout {
    /// Layout with `rows` x `options` bubbles and default spacing
    pub fn grid(rows: usize, options: usize) -> Self {
        Self {
            rows,
            options,
            ..Self::default()
        }
    }

    /// Sheet width in pixels
    pub fn width(&self) -> u32 {
        (2.0 * self.margin + self.spacing_x * self.options.saturating_sub(1) as f32).ceil() as u32
    }

    /// Sheet height in pixels
    pub fn height(&self) -> u32 {
        (2.0 * self.margin + self.spacing_y * self.rows.saturating_sub(1) as f32).ceil() as u32
    }

    /// Center of the bubble at (`row`, `option`)
    pub fn center(&self, row: usize, option: usize) -> (f32, f32) {
        (
            self.margin + option as f32 * self.spacing_x,
            self.margin + row as f32 * self.spacing_y,
        )
    }
}

/// Render a sheet where `marks[row][option]` gives each bubble's mark.
/// Missing entries are drawn empty.
pub fn render_sheet(layout: &SheetLayout, marks: &[Vec<Mark>]) -> RgbImage {
    let (width, height) = (layout.width(), layout.height());
    let mut sheet = RgbImage::from_pixel(width, height, gray(layout.paper));

    for row in 0..layout.rows {
        for option in 0..layout.options {
            let mark = marks
                .get(row)
                .and_then(|r| r.get(option))
                .copied()
                .unwrap_or(Mark::Empty);
            draw_bubble(&mut sheet, layout, layout.center(row, option), mark);
        }
    }

    apply_shading(&mut sheet, layout);
    sheet
}

/// Render a sheet with at most one filled bubble per row
pub fn render_answers(layout: &SheetLayout, answers: &[Option<usize>]) -> RgbImage {
    let marks: Vec<Vec<Mark>> = (0..layout.rows)
        .map(|row| {
            let answer = answers.get(row).copied().flatten();
            (0..layout.options)
                .map(|option| {
                    if answer == Some(option) {
                        Mark::Filled
                    } else {
                        Mark::Empty
                    }
                })
                .collect()
        })
        .collect();
    render_sheet(layout, &marks)
}

fn gray(v: u8) -> Rgb<u8> {
    Rgb([v, v, v])
}

fn draw_bubble(sheet: &mut RgbImage, layout: &SheetLayout, center: (f32, f32), mark: Mark) {
    let c = (center.0.round() as i32, center.1.round() as i32);
    let r = layout.radius.round() as i32;
    let inner = (layout.radius - layout.outline).max(0.0).round() as i32;

    draw_filled_circle_mut(sheet, c, r, gray(layout.ink));
    draw_filled_circle_mut(sheet, c, inner, gray(layout.paper));
    match mark {
        Mark::Empty => {}
        Mark::Filled => draw_filled_circle_mut(sheet, c, inner, gray(layout.fill)),
        Mark::Half => {
            // Lower semicircle, closed along the horizontal diameter
            let arc: Vec<Point<i32>> = (0..=ARC_STEPS)
                .map(|i| {
                    let a = std::f32::consts::PI * i as f32 / ARC_STEPS as f32;
                    Point::new(
                        c.0 + (inner as f32 * a.cos()).round() as i32,
                        c.1 + (inner as f32 * a.sin()).round() as i32,
                    )
                })
                .collect();
            draw_polygon_mut(sheet, &arc, gray(layout.fill));
        }
    }
}

/// Darken the sheet from left to right, scaling ink and paper alike
fn apply_shading(sheet: &mut RgbImage, layout: &SheetLayout) {
    if layout.shading == 0 || layout.paper == 0 {
        return;
    }
    let width = sheet.width().max(1) as f32;
    let paper = layout.paper as f32;
    for (x, _, pixel) in sheet.enumerate_pixels_mut() {
        let lit = (paper - layout.shading as f32 * x as f32 / width).max(0.0) / paper;
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * lit).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let layout = SheetLayout::grid(5, 4);
        assert_eq!(layout.width(), 80 + 180);
        assert_eq!(layout.height(), 80 + 280);
        assert_eq!(layout.center(1, 2), (160.0, 110.0));
    }

    #[test]
    fn test_marks_are_drawn() {
        let layout = SheetLayout::grid(1, 3);
        let sheet = render_sheet(&layout, &[vec![Mark::Filled, Mark::Empty, Mark::Half]]);
        let (fx, fy) = layout.center(0, 0);
        let (ex, ey) = layout.center(0, 1);
        let (hx, hy) = layout.center(0, 2);

        assert_eq!(sheet.get_pixel(fx as u32, fy as u32)[0], 20);
        assert_eq!(sheet.get_pixel(ex as u32, ey as u32)[0], 250);
        // Outline of the empty bubble
        assert_eq!(sheet.get_pixel(ex as u32 + 19, ey as u32)[0], 20);
        assert_eq!(sheet.get_pixel(hx as u32, hy as u32 + 5)[0], 20);
        assert_eq!(sheet.get_pixel(hx as u32, hy as u32 - 5)[0], 250);
    }

    #[test]
    fn test_render_answers_one_per_row() {
        let layout = SheetLayout::grid(2, 2);
        let sheet = render_answers(&layout, &[Some(1), None]);
        let (x, y) = layout.center(0, 1);
        assert_eq!(sheet.get_pixel(x as u32, y as u32)[0], 20);
        let (x, y) = layout.center(1, 0);
        assert_eq!(sheet.get_pixel(x as u32, y as u32)[0], 250);
    }

    #[test]
    fn test_shading_darkens_right_edge() {
        let layout = SheetLayout {
            shading: 60,
            ..SheetLayout::grid(1, 2)
        };
        let sheet = render_sheet(&layout, &[]);
        let w = sheet.width();
        assert!(sheet.get_pixel(0, 0)[0] > sheet.get_pixel(w - 1, 0)[0] + 50);
    }

    #[test]
    fn test_shading_scales_ink_with_paper() {
        let layout = SheetLayout {
            shading: 125,
            ..SheetLayout::grid(1, 2)
        };
        let sheet = render_answers(&layout, &[Some(1)]);
        let (x, y) = layout.center(0, 1);
        let lit = 1.0 - 125.0 * x / (250.0 * sheet.width() as f32);
        let expected = (20.0 * lit).round() as u8;
        assert_eq!(sheet.get_pixel(x as u32, y as u32)[0], expected);
        assert!(sheet.get_pixel(x as u32, y as u32)[0] < 20);
    }

    #[test]
    fn test_pencil_fill_level() {
        let layout = SheetLayout {
            fill: 130,
            ..SheetLayout::grid(1, 2)
        };
        let sheet = render_answers(&layout, &[Some(0)]);
        let (x, y) = layout.center(0, 0);
        assert_eq!(sheet.get_pixel(x as u32, y as u32)[0], 130);
        // Outline keeps the ink level
        assert_eq!(sheet.get_pixel(x as u32 + 19, y as u32)[0], 20);
    }
}
