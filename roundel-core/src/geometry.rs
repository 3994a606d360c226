//! Round panel geometry
//!
//! The panel is a 240x240 square buffer of which only the inscribed disc is
//! visible. Content meant to be readable stays inside the safe radius.

/// Panel width in pixels
pub const WIDTH: u16 = 240;
/// Panel height in pixels
pub const HEIGHT: u16 = 240;
/// Horizontal centre
pub const CENTER_X: i16 = (WIDTH / 2) as i16;
/// Vertical centre
pub const CENTER_Y: i16 = (HEIGHT / 2) as i16;
/// Radius of the visible disc
pub const RADIUS: i16 = (WIDTH / 2) as i16;
/// Margin kept clear of the bezel edge
pub const SAFE_MARGIN: i16 = 10;
/// Largest radius considered fully visible
pub const SAFE_RADIUS: i16 = RADIUS - SAFE_MARGIN;

/// A point in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in display coordinates
///
/// Used for dirty-region flushes; `width` and `height` are in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole panel
    pub const fn full() -> Self {
        Self::new(0, 0, WIDTH, HEIGHT)
    }

    /// Number of pixels covered
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `width` x `height` surface anchored at the origin
    pub fn clip_to(&self, width: u16, height: u16) -> Rect {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let right = self.x.saturating_add(self.width).min(width);
        let bottom = self.y.saturating_add(self.height).min(height);
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Euclidean distance between two points
pub fn distance(a: Point, b: Point) -> f32 {
    let dx = (b.x as i32 - a.x as i32) as f32;
    let dy = (b.y as i32 - a.y as i32) as f32;
    libm::sqrtf(dx * dx + dy * dy)
}

/// True if the point lies inside (or on) a circle around the panel centre
pub fn is_point_in_circle(p: Point, radius: i16) -> bool {
    distance(Point::new(CENTER_X, CENTER_Y), p) <= radius as f32
}

/// True if the point lies inside the safe radius
pub fn is_point_safe(p: Point) -> bool {
    is_point_in_circle(p, SAFE_RADIUS)
}
