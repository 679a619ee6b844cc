// THEORY:
// The `geometry` module holds the two "dumb" records every other stage speaks:
// an axis-aligned `BoundingBox` as returned by a cascade detector, and a
// `BgrColor` used when outlining detections on a BGR frame.
//
// Boxes carry no identity and no ordering. A detector returns them in whatever
// order it likes and the loop draws them in that same order. Eye boxes come
// back relative to the face region they were searched in, so `offset` is the
// single place where region coordinates are lifted into frame coordinates.

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The same box translated by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub const fn top_left(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// The opposite corner, `(x + width, y + height)`, as passed to a rectangle draw.
    pub const fn bottom_right(&self) -> (i32, i32) {
        (self.x + self.width, self.y + self.height)
    }
}

/// A colour in OpenCV's blue-green-red channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgrColor {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

impl BgrColor {
    pub const BLUE: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);

    pub const fn new(blue: u8, green: u8, red: u8) -> Self {
        Self { blue, green, red }
    }
}
