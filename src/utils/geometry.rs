/// Contour geometry: enclosed area, circularity, hull points and the
/// minimal enclosing circle. Contours arrive as integer pixel positions
/// from `imageproc`.
use imageproc::geometry::convex_hull;
use imageproc::point::Point as PixelPoint;

use crate::models::Point;

/// Area enclosed by a closed pixel contour (shoelace formula, absolute value)
pub fn polygon_area(points: &[PixelPoint<i32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f32 * 0.5
}

/// `4π·area / perimeter²`; 1.0 for a perfect circle, 0 for degenerate input
pub fn circularity(area: f32, perimeter: f32) -> f32 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f32::consts::PI * area / (perimeter * perimeter)
}

/// Convex hull vertices of a pixel contour, as float points.
///
/// Tracing can visit a pixel twice; repeats are removed first since the
/// hull's angular sort needs distinct points.
pub fn hull_points(points: &[PixelPoint<i32>]) -> Vec<Point> {
    let mut unique = points.to_vec();
    unique.sort_unstable_by_key(|p| (p.x, p.y));
    unique.dedup();
    convex_hull(&unique)
        .into_iter()
        .map(|p| Point::new(p.x as f32, p.y as f32))
        .collect()
}

/// Smallest circle containing every point, as `(center, radius)`. Pass hull
/// vertices when available; interior points never change the result.
pub fn min_enclosing_circle(hull: &[Point]) -> Option<(Point, f32)> {
    let first = *hull.first()?;

    let mut circle = Circle::at(first);
    for i in 1..hull.len() {
        if circle.contains(&hull[i]) {
            continue;
        }
        circle = Circle::at(hull[i]);
        for j in 0..i {
            if circle.contains(&hull[j]) {
                continue;
            }
            circle = Circle::diameter(&hull[i], &hull[j]);
            for k in 0..j {
                if !circle.contains(&hull[k]) {
                    circle = Circle::through(&hull[i], &hull[j], &hull[k]);
                }
            }
        }
    }

    Some((
        Point::new(circle.cx as f32, circle.cy as f32),
        circle.r as f32,
    ))
}

#[derive(Debug, Clone, Copy)]
struct Circle {
    cx: f64,
    cy: f64,
    r: f64,
}

impl Circle {
    const EPS: f64 = 1e-7;

    fn at(p: Point) -> Self {
        Self {
            cx: p.x as f64,
            cy: p.y as f64,
            r: 0.0,
        }
    }

    fn diameter(a: &Point, b: &Point) -> Self {
        let cx = (a.x as f64 + b.x as f64) * 0.5;
        let cy = (a.y as f64 + b.y as f64) * 0.5;
        let r = ((a.x as f64 - cx).powi(2) + (a.y as f64 - cy).powi(2)).sqrt();
        Self { cx, cy, r }
    }

    /// Circumcircle, or the widest diameter circle for collinear points
    fn through(a: &Point, b: &Point, c: &Point) -> Self {
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (bx, by) = (b.x as f64, b.y as f64);
        let (cx, cy) = (c.x as f64, c.y as f64);

        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
        if d.abs() < Self::EPS {
            let candidates = [Self::diameter(a, b), Self::diameter(a, c), Self::diameter(b, c)];
            return candidates
                .into_iter()
                .fold(Self::diameter(a, b), |best, cand| if cand.r > best.r { cand } else { best });
        }

        let a2 = ax * ax + ay * ay;
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
        let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
        let r = ((ax - ux).powi(2) + (ay - uy).powi(2)).sqrt();
        Self { cx: ux, cy: uy, r }
    }

    fn contains(&self, p: &Point) -> bool {
        let dx = p.x as f64 - self.cx;
        let dy = p.y as f64 - self.cy;
        (dx * dx + dy * dy).sqrt() <= self.r + 1e-5 * self.r.max(1.0)
    }
}
