use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_line_segment_mut;

/// A traced border of a connected foreground component, outer or hole.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub points: Vec<(f32, f32)>,
    /// Enclosed polygon area (shoelace), in square pixels.
    pub area: f32,
}

impl Region {
    pub fn new(points: Vec<(f32, f32)>) -> Self {
        let area = polygon_area(&points);
        Self { points, area }
    }

    /// Inside or on the border of the polygon.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        contains_point(&self.points, x, y)
    }

    /// Fills the interior and the border pixels.
    pub fn fill(&self, mask: &mut GrayImage) {
        fill_polygon(mask, &self.points);
        self.outline(mask);
    }

    /// Draws the closed border, one pixel thick.
    pub fn outline(&self, mask: &mut GrayImage) {
        let (width, height) = mask.dimensions();
        if let [(x, y)] = self.points[..] {
            if x >= 0.0 && y >= 0.0 && (x as u32) < width && (y as u32) < height {
                mask.put_pixel(x as u32, y as u32, Luma([255]));
            }
            return;
        }
        for (i, &start) in self.points.iter().enumerate() {
            let end = self.points[(i + 1) % self.points.len()];
            draw_line_segment_mut(mask, start, end, Luma([255]));
        }
    }
}

/// Every border of every foreground component, holes included.
pub fn find_regions(mask: &GrayImage) -> Vec<Region> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| !contour.points.is_empty())
        .map(|contour| {
            Region::new(
                contour
                    .points
                    .iter()
                    .map(|p| (p.x as f32, p.y as f32))
                    .collect(),
            )
        })
        .collect()
}

pub fn polygon_area(points: &[(f32, f32)]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(&(x0, y0), &(x1, y1))| x0 * y1 - x1 * y0)
        .sum();
    twice.abs() * 0.5
}

pub fn contains_point(points: &[(f32, f32)], x: f32, y: f32) -> bool {
    match points.len() {
        0 => return false,
        1 => return points[0] == (x, y),
        _ => {}
    }

    let mut inside = false;
    for (i, &(x0, y0)) in points.iter().enumerate() {
        let (x1, y1) = points[(i + 1) % points.len()];
        if on_segment((x0, y0), (x1, y1), (x, y)) {
            return true;
        }
        if (y0 > y) != (y1 > y) {
            let cross_x = x0 + (y - y0) * (x1 - x0) / (y1 - y0);
            if x < cross_x {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    if cross.abs() > 1e-3 {
        return false;
    }
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

/// Scanline fill through pixel centres.
fn fill_polygon(mask: &mut GrayImage, points: &[(f32, f32)]) {
    let (width, height) = mask.dimensions();
    if points.len() < 3 || width == 0 || height == 0 {
        return;
    }

    let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min).max(0.0) as u32;
    let max_y = points
        .iter()
        .map(|p| p.1)
        .fold(f32::NEG_INFINITY, f32::max)
        .min((height - 1) as f32) as u32;

    let mut crossings = Vec::new();
    for y in min_y..=max_y {
        let scan = y as f32 + 0.5;
        crossings.clear();
        for (i, &(x0, y0)) in points.iter().enumerate() {
            let (x1, y1) = points[(i + 1) % points.len()];
            if (y0 <= scan && y1 > scan) || (y1 <= scan && y0 > scan) {
                crossings.push(x0 + (scan - y0) * (x1 - x0) / (y1 - y0));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let start = pair[0].floor().max(0.0) as u32;
            let end = pair[1].ceil().min((width - 1) as f32);
            if end < 0.0 {
                continue;
            }
            for x in start..=end as u32 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
}
