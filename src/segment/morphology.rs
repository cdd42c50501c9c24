//! Binary morphology with rectangular structuring elements.
//!
//! Images are `GrayImage`s where any non-zero pixel is foreground; results are
//! strictly 0/255. Rectangles are separable, so each operation runs as a
//! horizontal pass followed by a vertical pass of a 1-D window, counted with
//! prefix sums. Erosion looks at `[i - k/2, i - k/2 + k)`; dilation uses the
//! reflected window so that openings and closings stay exact for even `k`.
//! Erosion treats pixels outside the image as foreground, dilation treats them
//! as background.

use image::{GrayImage, Luma};
use imageproc::integral_image::{integral_image, sum_image_pixels};

const ON: Luma<u8> = Luma([255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Erode,
    Dilate,
}

/// Adaptive local threshold with ink as foreground.
///
/// A pixel is ink when it is darker than the floored mean of its
/// `(2 * block_radius + 1)` square window by more than `offset`, so faint
/// paper grain stays background.
pub fn binarize_inverted(gray: &GrayImage, block_radius: u32, offset: u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }
    let integral = integral_image::<_, u32>(gray);
    GrayImage::from_fn(width, height, |x, y| {
        let (x0, x1) = (x.saturating_sub(block_radius), (x + block_radius).min(width - 1));
        let (y0, y1) = (y.saturating_sub(block_radius), (y + block_radius).min(height - 1));
        let count = (x1 - x0 + 1) * (y1 - y0 + 1);
        let mean = sum_image_pixels(&integral, x0, y0, x1, y1)[0] / count;
        if u32::from(gray.get_pixel(x, y).0[0]) + u32::from(offset) < mean {
            ON
        } else {
            Luma([0])
        }
    })
}

pub fn erode(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let pass = filter_1d(src, width, Axis::Horizontal, Op::Erode);
    filter_1d(&pass, height, Axis::Vertical, Op::Erode)
}

pub fn dilate(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let pass = filter_1d(src, width, Axis::Horizontal, Op::Dilate);
    filter_1d(&pass, height, Axis::Vertical, Op::Dilate)
}

pub fn dilate_n(src: &GrayImage, width: u32, height: u32, iterations: u32) -> GrayImage {
    let mut out = binary_copy(src);
    for _ in 0..iterations {
        out = dilate(&out, width, height);
    }
    out
}

pub fn erode_n(src: &GrayImage, width: u32, height: u32, iterations: u32) -> GrayImage {
    let mut out = binary_copy(src);
    for _ in 0..iterations {
        out = erode(&out, width, height);
    }
    out
}

/// `iterations` erosions followed by as many dilations.
pub fn open(src: &GrayImage, width: u32, height: u32, iterations: u32) -> GrayImage {
    dilate_n(&erode_n(src, width, height, iterations), width, height, iterations)
}

/// `iterations` dilations followed by as many erosions.
pub fn close(src: &GrayImage, width: u32, height: u32, iterations: u32) -> GrayImage {
    erode_n(&dilate_n(src, width, height, iterations), width, height, iterations)
}

/// Ruling lines: the union of a vertical and a horizontal opening with a `length`-long kernel.
pub fn line_mask(binary: &GrayImage, length: u32, iterations: u32) -> GrayImage {
    let vertical = open(binary, 1, length, iterations);
    let horizontal = open(binary, length, 1, iterations);
    union(&vertical, &horizontal)
}

pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    zip_with(a, b, |x, y| x > 0 || y > 0)
}

/// Foreground of `a` that is not foreground in `b`.
pub fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    zip_with(a, b, |x, y| x > 0 && y == 0)
}

pub fn invert(src: &GrayImage) -> GrayImage {
    let mut out = src.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = 255 - pixel.0[0];
    }
    out
}

pub fn is_empty(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p.0[0] == 0)
}

pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] > 0).count()
}

/// Smallest `(x, y, width, height)` rectangle holding every foreground pixel.
pub fn foreground_bounds(mask: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

fn binary_copy(src: &GrayImage) -> GrayImage {
    let mut out = src.clone();
    for pixel in out.pixels_mut() {
        if pixel.0[0] > 0 {
            pixel.0[0] = 255;
        }
    }
    out
}

fn zip_with(a: &GrayImage, b: &GrayImage, keep: impl Fn(u8, u8) -> bool) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let (width, height) = a.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if keep(a.get_pixel(x, y).0[0], b.get_pixel(x, y).0[0]) {
            ON
        } else {
            Luma([0])
        }
    })
}

fn filter_1d(src: &GrayImage, len: u32, axis: Axis, op: Op) -> GrayImage {
    if len <= 1 {
        return binary_copy(src);
    }

    let (width, height) = src.dimensions();
    let (lines, span) = match axis {
        Axis::Horizontal => (height, width),
        Axis::Vertical => (width, height),
    };
    let at = |line: u32, i: u32| match axis {
        Axis::Horizontal => (i, line),
        Axis::Vertical => (line, i),
    };

    let anchor = i64::from(len / 2);
    let span_len = span as usize;
    let mut out = GrayImage::new(width, height);
    let mut prefix = vec![0u32; span_len + 1];

    for line in 0..lines {
        for i in 0..span {
            let (x, y) = at(line, i);
            let on = u32::from(src.get_pixel(x, y).0[0] > 0);
            prefix[i as usize + 1] = prefix[i as usize] + on;
        }
        for i in 0..span {
            let first = match op {
                Op::Erode => i64::from(i) - anchor,
                Op::Dilate => i64::from(i) + anchor + 1 - i64::from(len),
            };
            let start = first.max(0) as usize;
            let end = (first + i64::from(len)).min(span as i64) as usize;
            let count = prefix[end] - prefix[start];
            let on = match op {
                Op::Erode => count as usize == end - start,
                Op::Dilate => count > 0,
            };
            if on {
                let (x, y) = at(line, i);
                out.put_pixel(x, y, ON);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas(width: u32, height: u32) -> GrayImage {
        GrayImage::new(width, height)
    }

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, ON);
            }
        }
    }

    #[test]
    fn dilate_grows_by_kernel() {
        let mut img = canvas(20, 20);
        img.put_pixel(10, 10, ON);
        let out = dilate(&img, 3, 3);
        assert_eq!(foreground_bounds(&out), Some((9, 9, 3, 3)));
        assert_eq!(count_foreground(&out), 9);
    }

    #[test]
    fn opening_keeps_long_lines_only() {
        let mut img = canvas(60, 40);
        fill(&mut img, 5, 10, 55, 11); // 50px horizontal rule
        fill(&mut img, 20, 20, 24, 22); // short blob
        let lines = line_mask(&img, 10, 1);
        assert_eq!(foreground_bounds(&lines), Some((5, 10, 50, 1)));
    }

    #[test]
    fn closing_bridges_small_gaps() {
        let mut img = canvas(40, 10);
        fill(&mut img, 5, 4, 15, 6);
        fill(&mut img, 18, 4, 30, 6);
        let closed = close(&img, 5, 5, 1);
        assert_eq!(closed.get_pixel(16, 5).0[0], 255);
        assert_eq!(closed.get_pixel(2, 5).0[0], 0);
    }

    #[test]
    fn erosion_does_not_eat_image_edges() {
        let mut img = canvas(10, 10);
        fill(&mut img, 0, 0, 10, 10);
        assert_eq!(count_foreground(&erode(&img, 3, 3)), 100);
    }

    #[test]
    fn set_operations() {
        let mut a = canvas(4, 1);
        let mut b = canvas(4, 1);
        fill(&mut a, 0, 0, 2, 1);
        fill(&mut b, 1, 0, 3, 1);
        assert_eq!(count_foreground(&union(&a, &b)), 3);
        assert_eq!(foreground_bounds(&subtract(&a, &b)), Some((0, 0, 1, 1)));
        assert_eq!(count_foreground(&invert(&a)), 2);
        assert!(is_empty(&canvas(3, 3)));
        assert_eq!(foreground_bounds(&canvas(3, 3)), None);
    }

    #[test]
    fn binarize_marks_thin_ink() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([255]));
        for x in 5..35 {
            gray.put_pixel(x, 20, Luma([0]));
        }
        let binary = binarize_inverted(&gray, 5, 2);
        assert_eq!(binary.get_pixel(20, 20).0[0], 255);
        assert_eq!(binary.get_pixel(20, 5).0[0], 0);
    }

    #[test]
    fn binarize_ignores_faint_grain() {
        let mut gray = GrayImage::from_pixel(60, 60, Luma([255]));
        for (i, (x, y)) in [(3, 4), (17, 30), (40, 9), (52, 51), (29, 45)].into_iter().enumerate() {
            gray.put_pixel(x, y, Luma([252 + (i % 3) as u8]));
        }
        gray.put_pixel(30, 30, Luma([0]));

        let binary = binarize_inverted(&gray, 5, 2);
        assert_eq!(count_foreground(&binary), 1);
        assert_eq!(binary.get_pixel(30, 30).0[0], 255);

        // Without an offset the grain turns into ink.
        assert!(count_foreground(&binarize_inverted(&gray, 5, 0)) > 1);
    }
}
