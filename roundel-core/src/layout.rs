//! Circular layout helpers
//!
//! Places launcher icons evenly on a ring inside the visible disc.

use heapless::Vec;

use crate::geometry::{Point, CENTER_X, CENTER_Y, SAFE_RADIUS};

/// Most icons a single ring can hold
pub const MAX_RING_ITEMS: usize = 16;

/// Side length of a launcher icon
pub const ICON_SIZE: i16 = 50;

/// Radius of the launcher ring, leaving room for half an icon inside the
/// safe area
pub const LAUNCHER_RING_RADIUS: i16 = SAFE_RADIUS - 40;

/// Evenly spaced points on a circle around the panel centre
///
/// `start_angle_deg` is measured clockwise from 12 o'clock. At most
/// [`MAX_RING_ITEMS`] points are produced.
pub fn circular_positions(count: usize, radius: i16, start_angle_deg: f32) -> Vec<Point, MAX_RING_ITEMS> {
    let mut out = Vec::new();
    let count = count.min(MAX_RING_ITEMS);
    if count == 0 {
        return out;
    }

    let step = 360.0 / count as f32;
    for i in 0..count {
        let deg = start_angle_deg + step * i as f32 - 90.0;
        let rad = deg * core::f32::consts::PI / 180.0;
        let x = CENTER_X as f32 + radius as f32 * libm::cosf(rad);
        let y = CENTER_Y as f32 + radius as f32 * libm::sinf(rad);
        // Capacity is bounded by `count` above
        let _ = out.push(Point::new(libm::roundf(x) as i16, libm::roundf(y) as i16));
    }
    out
}

/// Index of the icon whose `size`-square, centred on its position, contains
/// the point
pub fn hit_test(positions: &[Point], p: Point, size: i16) -> Option<usize> {
    let half = size / 2;
    positions.iter().position(|c| {
        p.x >= c.x - half && p.x <= c.x + half && p.y >= c.y - half && p.y <= c.y + half
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_positions_at_compass_points() {
        let pos = circular_positions(4, 70, 0.0);
        assert_eq!(pos.len(), 4);
        assert_eq!(pos[0], Point::new(120, 50)); // top
        assert_eq!(pos[1], Point::new(190, 120)); // right
        assert_eq!(pos[2], Point::new(120, 190)); // bottom
        assert_eq!(pos[3], Point::new(50, 120)); // left
    }

    #[test]
    fn test_empty_and_capped() {
        assert!(circular_positions(0, 70, 0.0).is_empty());
        assert_eq!(circular_positions(40, 70, 0.0).len(), MAX_RING_ITEMS);
    }

    #[test]
    fn test_hit_test() {
        let pos = circular_positions(4, LAUNCHER_RING_RADIUS, 0.0);
        assert_eq!(hit_test(&pos, Point::new(120, 55), ICON_SIZE), Some(0));
        assert_eq!(hit_test(&pos, Point::new(200, 120), ICON_SIZE), Some(1));
        assert_eq!(hit_test(&pos, Point::new(120, 120), ICON_SIZE), None);
    }
}
