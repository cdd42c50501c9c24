//! Separation of title-block tables from the drawing itself.
//!
//! Ruling lines are isolated with long thin openings, traced into regions, and
//! closed into solid cell blocks. Blocks holding at least one anchor token form
//! the table mask; the drawing image is what remains once the mask is whitened.

pub mod contour;
pub mod morphology;

use image::imageops;
use image::{GrayImage, Luma};
use tracing::debug;

use crate::core::config::ExtractionConfig;
use crate::core::model::Token;
use contour::{find_regions, Region};

/// Result of splitting one page.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// 255 where the page is table or title block, 0 where it is drawing.
    pub table_mask: GrayImage,
    /// Cropped drawing with the tables whitened and a white margin.
    pub drawing: GrayImage,
}

#[derive(Debug, Clone)]
pub struct RegionSegmenter<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> RegionSegmenter<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// Inverted adaptive threshold: ink is 255.
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        morphology::binarize_inverted(
            gray,
            self.config.adaptive_block_radius,
            self.config.adaptive_offset,
        )
    }

    /// `anchors` are filtered tokens of the full-image OCR pass; only regions
    /// holding one of their top-left corners become table.
    pub fn segment(&self, gray: &GrayImage, binary: &GrayImage, anchors: &[Token]) -> Segmentation {
        let (width, height) = gray.dimensions();
        let page_limit = width as f32 * height as f32 * self.config.page_border_area_ratio;
        let kernel = kernel_length(width, self.config.line_kernel_divisor);

        let lines = morphology::line_mask(binary, kernel, self.config.line_open_iterations);
        let lines = morphology::dilate_n(&lines, 2, 2, self.config.line_dilate_iterations);

        let line_regions = find_regions(&lines);
        let mut raw = GrayImage::new(width, height);
        let mut border_outline = GrayImage::new(width, height);
        for region in &line_regions {
            if region.area < page_limit {
                region.fill(&mut raw);
            } else if region.area > page_limit {
                region.outline(&mut border_outline);
            }
        }

        let closed = morphology::close(&raw, kernel, kernel, self.config.close_iterations);
        let table_mask = self.anchored_mask(&closed, anchors, page_limit);
        let borders = morphology::dilate_n(&border_outline, 3, 3, self.config.border_dilate_iterations);
        let drawing = self.extract_drawing(gray, binary, &table_mask, &borders);

        debug!(
            kernel,
            line_regions = line_regions.len(),
            masked_pixels = morphology::count_foreground(&table_mask),
            "segmented page"
        );

        Segmentation { table_mask, drawing }
    }

    /// Grayscale table content, black outside the mask, for the second OCR pass.
    pub fn table_image(&self, gray: &GrayImage, table_mask: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            if table_mask.get_pixel(x, y).0[0] > 0 {
                *gray.get_pixel(x, y)
            } else {
                Luma([0])
            }
        })
    }

    /// Black-on-white table text with the ruling lines subtracted.
    pub fn strip_table_lines(&self, table: &GrayImage) -> GrayImage {
        let kernel = kernel_length(table.width(), self.config.table_line_kernel_divisor);
        let binary = self.binarize(table);
        let lines = morphology::line_mask(&binary, kernel, self.config.line_open_iterations);
        morphology::invert(&morphology::subtract(&binary, &lines))
    }

    fn anchored_mask(&self, closed: &GrayImage, anchors: &[Token], page_limit: f32) -> GrayImage {
        let (width, height) = closed.dimensions();
        let mut mask = GrayImage::new(width, height);
        find_regions(closed)
            .iter()
            .filter(|region| region.area < page_limit)
            .filter(|region| holds_anchor(region, anchors))
            .for_each(|region| region.fill(&mut mask));
        mask
    }

    fn extract_drawing(
        &self,
        gray: &GrayImage,
        binary: &GrayImage,
        table_mask: &GrayImage,
        borders: &GrayImage,
    ) -> GrayImage {
        let margin = self.config.mask_margin.max(1);
        let whitening = morphology::dilate(table_mask, margin, margin);

        let (width, height) = gray.dimensions();
        let ink = GrayImage::from_fn(width, height, |x, y| {
            let drawing_ink = binary.get_pixel(x, y).0[0] > 0
                && table_mask.get_pixel(x, y).0[0] == 0
                && borders.get_pixel(x, y).0[0] == 0;
            Luma([if drawing_ink { 255 } else { 0 }])
        });
        let (x, y, w, h) = morphology::foreground_bounds(&ink).unwrap_or((0, 0, width, height));

        let mut cropped = GrayImage::new(w, h);
        for (cx, cy, pixel) in cropped.enumerate_pixels_mut() {
            let (sx, sy) = (x + cx, y + cy);
            *pixel = if whitening.get_pixel(sx, sy).0[0] > 0 {
                Luma([255])
            } else {
                *gray.get_pixel(sx, sy)
            };
        }

        pad(&cropped, self.config.border_padding)
    }
}

fn holds_anchor(region: &Region, anchors: &[Token]) -> bool {
    anchors
        .iter()
        .any(|token| region.contains(token.bbox.left(), token.bbox.top()))
}

fn kernel_length(width: u32, divisor: u32) -> u32 {
    (width / divisor.max(1)).max(1)
}

/// Surrounds `image` with a white frame `padding` pixels wide.
pub fn pad(image: &GrayImage, padding: u32) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(
        image.width() + 2 * padding,
        image.height() + 2 * padding,
        Luma([255]),
    );
    imageops::replace(&mut canvas, image, i64::from(padding), i64::from(padding));
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use pretty_assertions::assert_eq;

    fn white(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    fn hline(img: &mut GrayImage, x0: u32, x1: u32, y: u32) {
        for x in x0..=x1 {
            img.put_pixel(x, y, Luma([0]));
            img.put_pixel(x, y + 1, Luma([0]));
        }
    }

    fn vline(img: &mut GrayImage, x: u32, y0: u32, y1: u32) {
        for y in y0..=y1 {
            img.put_pixel(x, y, Luma([0]));
            img.put_pixel(x + 1, y, Luma([0]));
        }
    }

    fn diagonal(img: &mut GrayImage, x0: u32, y0: u32, len: u32) {
        for i in 0..len {
            img.put_pixel(x0 + i, y0 + i, Luma([0]));
        }
    }

    /// A 400x300 page with diagonal strokes and a two-row table at the bottom right.
    fn page_with_table() -> GrayImage {
        let mut img = white(400, 300);
        diagonal(&mut img, 30, 30, 120);
        diagonal(&mut img, 60, 20, 100);
        hline(&mut img, 220, 380, 200);
        hline(&mut img, 220, 380, 240);
        hline(&mut img, 220, 380, 280);
        vline(&mut img, 220, 200, 281);
        vline(&mut img, 300, 200, 281);
        vline(&mut img, 379, 200, 281);
        img
    }

    fn anchor(left: f32, top: f32) -> Token {
        Token::new("TITLE:", 95.0, BBox::from_ltwh(left, top, 40.0, 10.0))
    }

    #[test]
    fn strokes_only_give_empty_mask_and_full_drawing() {
        let config = ExtractionConfig::default();
        let segmenter = RegionSegmenter::new(&config);
        let mut img = white(400, 300);
        diagonal(&mut img, 50, 40, 150);
        diagonal(&mut img, 120, 60, 100);

        let binary = segmenter.binarize(&img);
        let result = segmenter.segment(&img, &binary, &[anchor(60.0, 60.0)]);

        assert!(morphology::is_empty(&result.table_mask));
        let (x, y, w, h) = morphology::foreground_bounds(&binary).unwrap();
        assert_eq!(result.drawing.dimensions(), (w + 60, h + 60));
        assert_eq!(result.drawing.get_pixel(30, 30).0[0], img.get_pixel(x, y).0[0]);
        assert_eq!(result.drawing.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn table_with_text_anchor_is_masked() {
        let config = ExtractionConfig::default();
        let segmenter = RegionSegmenter::new(&config);
        let img = page_with_table();
        let binary = segmenter.binarize(&img);
        let result = segmenter.segment(&img, &binary, &[anchor(240.0, 215.0)]);

        let mask = &result.table_mask;
        assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(mask.get_pixel(250, 220).0[0], 255);
        assert_eq!(mask.get_pixel(340, 260).0[0], 255);
        assert_eq!(mask.get_pixel(80, 80).0[0], 0);

        // The crop no longer reaches the table in the lower right.
        let (w, h) = result.drawing.dimensions();
        assert!(w < 400 && h < 300);
    }

    #[test]
    fn table_without_anchor_stays_in_drawing() {
        let config = ExtractionConfig::default();
        let segmenter = RegionSegmenter::new(&config);
        let img = page_with_table();
        let binary = segmenter.binarize(&img);
        let result = segmenter.segment(&img, &binary, &[]);
        assert!(morphology::is_empty(&result.table_mask));
    }

    #[test]
    fn page_border_is_not_table() {
        let config = ExtractionConfig::default();
        let segmenter = RegionSegmenter::new(&config);
        let mut img = white(400, 300);
        hline(&mut img, 5, 394, 5);
        hline(&mut img, 5, 394, 293);
        vline(&mut img, 5, 5, 294);
        vline(&mut img, 393, 5, 294);
        diagonal(&mut img, 100, 100, 80);

        let binary = segmenter.binarize(&img);
        let result = segmenter.segment(&img, &binary, &[anchor(150.0, 150.0)]);

        assert!(morphology::is_empty(&result.table_mask));
        // Cropped to the stroke, not to the page border.
        assert_eq!(result.drawing.dimensions(), (80 + 60, 80 + 60));
    }

    #[test]
    fn paper_grain_does_not_widen_the_crop() {
        let config = ExtractionConfig::default();
        let segmenter = RegionSegmenter::new(&config);
        let mut img = white(400, 300);
        for (x, y, p) in img.enumerate_pixels_mut() {
            if (x * 7 + y * 13) % 29 == 0 {
                *p = Luma([252 + ((x + y) % 3) as u8]);
            }
        }
        diagonal(&mut img, 100, 100, 80);

        let binary = segmenter.binarize(&img);
        let result = segmenter.segment(&img, &binary, &[]);

        assert_eq!(morphology::foreground_bounds(&binary), Some((100, 100, 80, 80)));
        assert_eq!(result.drawing.dimensions(), (80 + 60, 80 + 60));
    }

    #[test]
    fn stripping_lines_keeps_text_blobs() {
        let config = ExtractionConfig::default();
        let segmenter = RegionSegmenter::new(&config);
        let mut table = white(1600, 100);
        hline(&mut table, 10, 1590, 10);
        hline(&mut table, 10, 1590, 80);
        // A small glyph-like blob.
        for y in 40..46 {
            table.put_pixel(50, y, Luma([0]));
        }
        let stripped = segmenter.strip_table_lines(&table);
        assert_eq!(stripped.get_pixel(150, 10).0[0], 255);
        assert_eq!(stripped.get_pixel(50, 42).0[0], 0);
    }

    #[test]
    fn pads_with_white() {
        let img = GrayImage::from_pixel(2, 3, Luma([0]));
        let padded = pad(&img, 30);
        assert_eq!(padded.dimensions(), (62, 63));
        assert_eq!(padded.get_pixel(0, 0).0[0], 255);
        assert_eq!(padded.get_pixel(30, 30).0[0], 0);
    }
}
