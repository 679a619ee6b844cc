// THEORY:
// `ImageFrame` is an in-memory colour frame backed by the `image` crate. It
// lets the detect-and-draw step run without a camera or OpenCV, on synthetic
// frames.
//
// Pixels are stored as `image::Rgb`, so BGR colours are swizzled on the way
// in. Rectangle outlines follow OpenCV's convention: the corner passed as
// `bottom_right` is inclusive, the two corners may come in either order, and a
// thick line is centred on the edge with the extra pixel going outwards for
// even thicknesses. Drawing inside a region behaves like drawing on an OpenCV
// ROI view: coordinates start at the region origin and the region edges clip.

use crate::core_modules::detection::ColorFrame;
use crate::core_modules::geometry::{BgrColor, BoundingBox};
use crate::error::Result;
use image::{GrayImage, Rgb, RgbImage, imageops};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    buffer: RgbImage,
}

impl ImageFrame {
    /// A frame of one solid colour.
    pub fn filled(width: u32, height: u32, color: BgrColor) -> Self {
        Self {
            buffer: RgbImage::from_pixel(width, height, to_rgb(color)),
        }
    }

    /// Colour at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<BgrColor> {
        self.buffer
            .get_pixel_checked(x, y)
            .map(|Rgb([red, green, blue])| BgrColor::new(*blue, *green, *red))
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    fn bounds(&self) -> BoundingBox {
        let (width, height) = self.buffer.dimensions();
        BoundingBox::new(0, 0, width as i32, height as i32)
    }

    /// Outline `rect` (frame coordinates), touching only pixels inside `clip`.
    fn outline(&mut self, rect: BoundingBox, clip: BoundingBox, color: BgrColor, thickness: i32) {
        let thickness = thickness.max(1);
        let outward = thickness / 2;
        let inward = thickness - outward - 1;

        let ((ax, ay), (bx, by)) = (rect.top_left(), rect.bottom_right());
        let (x0, x1) = (ax.min(bx), ax.max(bx));
        let (y0, y1) = (ay.min(by), ay.max(by));
        let on_edge = |at: i32, edge: i32| at >= edge - outward && at <= edge + inward;
        let on_far_edge = |at: i32, edge: i32| at >= edge - inward && at <= edge + outward;

        let frame = self.bounds();
        let left = clip.x.max(frame.x);
        let top = clip.y.max(frame.y);
        let right = (clip.x + clip.width).min(frame.width) - 1;
        let bottom = (clip.y + clip.height).min(frame.height) - 1;
        let pixel = to_rgb(color);

        for y in (y0 - outward).max(top)..=(y1 + outward).min(bottom) {
            for x in (x0 - outward).max(left)..=(x1 + outward).min(right) {
                let on_column = on_edge(x, x0) || on_far_edge(x, x1);
                let on_row = on_edge(y, y0) || on_far_edge(y, y1);
                if on_column || on_row {
                    self.buffer.put_pixel(x as u32, y as u32, pixel);
                }
            }
        }
    }
}

impl ColorFrame for ImageFrame {
    type Gray = GrayImage;

    fn to_gray(&self) -> Result<GrayImage> {
        Ok(imageops::grayscale(&self.buffer))
    }

    fn draw_rectangle(&mut self, rect: BoundingBox, color: BgrColor, thickness: i32) -> Result<()> {
        let clip = self.bounds();
        self.outline(rect, clip, color, thickness);
        Ok(())
    }

    fn draw_rectangle_in(
        &mut self,
        region: BoundingBox,
        rect: BoundingBox,
        color: BgrColor,
        thickness: i32,
    ) -> Result<()> {
        self.outline(rect.offset(region.x, region.y), region, color, thickness);
        Ok(())
    }
}

fn to_rgb(color: BgrColor) -> Rgb<u8> {
    Rgb([color.red, color.green, color.blue])
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: BgrColor = BgrColor::new(0, 0, 0);

    #[test]
    fn colours_round_trip_through_rgb_storage() {
        let orange = BgrColor::new(0, 128, 255);
        let frame = ImageFrame::filled(4, 4, orange);
        assert_eq!(frame.pixel(3, 3), Some(orange));
        assert_eq!(frame.as_image().get_pixel(0, 0), &Rgb([255, 128, 0]));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn grayscale_keeps_dimensions() {
        let frame = ImageFrame::filled(32, 24, BgrColor::new(255, 255, 255));
        let gray = frame.to_gray().unwrap();
        assert_eq!(gray.dimensions(), (32, 24));
        assert_eq!(gray.get_pixel(5, 5).0[0], 255);
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut frame = ImageFrame::filled(100, 100, BLACK);
        frame
            .draw_rectangle(BoundingBox::new(20, 30, 40, 20), BgrColor::BLUE, 2)
            .unwrap();

        // Edges (thickness 2 spreads one pixel outwards).
        assert_eq!(frame.pixel(20, 40), Some(BgrColor::BLUE));
        assert_eq!(frame.pixel(19, 40), Some(BgrColor::BLUE));
        assert_eq!(frame.pixel(60, 40), Some(BgrColor::BLUE));
        assert_eq!(frame.pixel(61, 40), Some(BgrColor::BLUE));
        assert_eq!(frame.pixel(40, 30), Some(BgrColor::BLUE));
        assert_eq!(frame.pixel(40, 50), Some(BgrColor::BLUE));
        // Interior and outside.
        assert_eq!(frame.pixel(21, 40), Some(BLACK));
        assert_eq!(frame.pixel(40, 40), Some(BLACK));
        assert_eq!(frame.pixel(18, 40), Some(BLACK));
        assert_eq!(frame.pixel(62, 40), Some(BLACK));
    }

    #[test]
    fn outline_is_clipped_to_the_frame() {
        let mut frame = ImageFrame::filled(10, 10, BLACK);
        frame
            .draw_rectangle(BoundingBox::new(-5, -5, 30, 30), BgrColor::GREEN, 2)
            .unwrap();
        // Every edge falls outside the frame.
        assert!(frame.as_image().pixels().all(|p| p.0 == [0, 0, 0]));

        frame
            .draw_rectangle(BoundingBox::new(5, 5, 30, 30), BgrColor::GREEN, 2)
            .unwrap();
        assert_eq!(frame.pixel(5, 9), Some(BgrColor::GREEN));
        assert_eq!(frame.pixel(9, 5), Some(BgrColor::GREEN));
        assert_eq!(frame.pixel(9, 9), Some(BLACK));
    }

    #[test]
    fn single_pixel_thickness() {
        let mut frame = ImageFrame::filled(20, 20, BLACK);
        frame
            .draw_rectangle(BoundingBox::new(5, 5, 5, 5), BgrColor::BLUE, 1)
            .unwrap();
        assert_eq!(frame.pixel(5, 7), Some(BgrColor::BLUE));
        assert_eq!(frame.pixel(10, 7), Some(BgrColor::BLUE));
        assert_eq!(frame.pixel(4, 7), Some(BLACK));
        assert_eq!(frame.pixel(6, 7), Some(BLACK));
        assert_eq!(frame.pixel(11, 7), Some(BLACK));
    }

    #[test]
    fn negative_size_draws_the_same_outline() {
        let mut forward = ImageFrame::filled(40, 40, BLACK);
        let mut backward = ImageFrame::filled(40, 40, BLACK);
        forward
            .draw_rectangle(BoundingBox::new(10, 12, 15, 8), BgrColor::BLUE, 2)
            .unwrap();
        backward
            .draw_rectangle(BoundingBox::new(25, 20, -15, -8), BgrColor::BLUE, 2)
            .unwrap();

        assert_eq!(backward.pixel(10, 15), Some(BgrColor::BLUE));
        assert_eq!(backward.pixel(17, 20), Some(BgrColor::BLUE));
        assert_eq!(backward, forward);
    }

    #[test]
    fn region_outline_is_offset_and_clipped_to_the_region() {
        let mut frame = ImageFrame::filled(60, 60, BLACK);
        let region = BoundingBox::new(10, 10, 20, 20);
        // Lands at (25, 15)-(35, 20) in the frame; the region ends at x = 29.
        frame
            .draw_rectangle_in(region, BoundingBox::new(15, 5, 10, 5), BgrColor::GREEN, 2)
            .unwrap();

        assert_eq!(frame.pixel(25, 17), Some(BgrColor::GREEN));
        assert_eq!(frame.pixel(24, 17), Some(BgrColor::GREEN));
        assert_eq!(frame.pixel(29, 15), Some(BgrColor::GREEN));
        assert_eq!(frame.pixel(28, 20), Some(BgrColor::GREEN));
        // Beyond the region's right edge nothing is drawn.
        assert_eq!(frame.pixel(30, 15), Some(BLACK));
        assert_eq!(frame.pixel(35, 17), Some(BLACK));
        assert_eq!(frame.pixel(36, 17), Some(BLACK));
        // Not drawn at the raw, region-relative position.
        assert_eq!(frame.pixel(15, 7), Some(BLACK));
    }
}
