// ── Geometry primitives ───────────────────────────────────────────────────────
//
// Plain integer rectangle/point value types plus the capture-rectangle
// computation that drives every refresh tick.  Pure data and pure functions;
// no platform types leak in here (the Win32 backend converts to and from
// `RECT`/`POINT` at its own boundary).

/// A screen-coordinate point in device pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// An axis-aligned rectangle in device pixels, half-open like Win32's `RECT`:
/// `left..right` by `top..bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// A rectangle of the given size anchored at the origin.
    pub fn of_size(width: i32, height: i32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

// ── Capture rectangle ─────────────────────────────────────────────────────────

/// Compute the desktop region the magnification surface should capture.
///
/// The region is `client / magnification` in size (truncated to whole pixels,
/// not rounded), centered on `cursor`, then clamped so it does not scroll
/// outside the `screen_width` × `screen_height` desktop.  Clamping pins the
/// low edge first, then the high edge, matching the surface's stretch-to-fill
/// behavior at the screen borders.
pub fn source_rect(
    cursor: Point,
    client_width: i32,
    client_height: i32,
    magnification: f32,
    screen_width: i32,
    screen_height: i32,
) -> Rect {
    let width = (client_width as f32 / magnification) as i32;
    let height = (client_height as f32 / magnification) as i32;

    let mut left = cursor.x - width / 2;
    let mut top = cursor.y - height / 2;

    if left < 0 {
        left = 0;
    }
    if left > screen_width - width {
        left = screen_width - width;
    }

    if top < 0 {
        top = 0;
    }
    if top > screen_height - height {
        top = screen_height - height;
    }

    Rect {
        left,
        top,
        right: left + width,
        bottom: top + height,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN_W: i32 = 1920;
    const SCREEN_H: i32 = 1080;

    fn capture(x: i32, y: i32) -> Rect {
        source_rect(Point { x, y }, 800, 600, 2.0, SCREEN_W, SCREEN_H)
    }

    #[test]
    fn centered_when_far_from_edges() {
        // 800×600 client at 2.0× captures 400×300 centered on the cursor.
        let r = capture(400, 300);
        assert_eq!(
            r,
            Rect {
                left: 200,
                top: 150,
                right: 600,
                bottom: 450
            }
        );
    }

    #[test]
    fn clamped_at_top_left_corner() {
        let r = capture(10, 10);
        assert_eq!(r.left, 0);
        assert_eq!(r.right, 400);
        assert_eq!(r.top, 0);
        assert_eq!(r.bottom, 300);
    }

    #[test]
    fn clamped_at_bottom_right_corner() {
        let r = capture(1915, 1075);
        assert_eq!(r.left, SCREEN_W - 400);
        assert_eq!(r.right, SCREEN_W);
        assert_eq!(r.top, SCREEN_H - 300);
        assert_eq!(r.bottom, SCREEN_H);
    }

    #[test]
    fn size_is_truncated_division() {
        // 800 / 3.0 = 266.66…; the capture width must floor, never round up.
        let r = source_rect(Point { x: 500, y: 500 }, 800, 600, 3.0, SCREEN_W, SCREEN_H);
        assert_eq!(r.width(), 266);
        assert_eq!(r.height(), 200);
    }

    #[test]
    fn always_inside_screen_for_any_cursor() {
        // Sweep cursor positions (including far outside the desktop) and a
        // few magnifications; the clamped rectangle must stay on screen and
        // keep its computed size.
        for &m in &[1.0_f32, 1.5, 2.0, 4.0, 10.0] {
            let w = (800.0 / m) as i32;
            let h = (600.0 / m) as i32;
            for x in (-200..=2200).step_by(97) {
                for y in (-200..=1400).step_by(83) {
                    let r = source_rect(Point { x, y }, 800, 600, m, SCREEN_W, SCREEN_H);
                    assert!(r.left >= 0, "left {} at ({x},{y}) m={m}", r.left);
                    assert!(r.top >= 0, "top {} at ({x},{y}) m={m}", r.top);
                    assert!(r.right <= SCREEN_W, "right {} at ({x},{y}) m={m}", r.right);
                    assert!(r.bottom <= SCREEN_H, "bottom {} at ({x},{y}) m={m}", r.bottom);
                    assert_eq!(r.width(), w);
                    assert_eq!(r.height(), h);
                }
            }
        }
    }

    #[test]
    fn exactly_centered_when_no_clamping_needed() {
        // Wherever the ideal rectangle fits on screen, the result is centered
        // on the cursor up to integer truncation of the half-extents.
        for x in (300..=1600).step_by(111) {
            for y in (200..=900).step_by(73) {
                let r = capture(x, y);
                if r.left > 0 && r.right < SCREEN_W && r.top > 0 && r.bottom < SCREEN_H {
                    assert_eq!(r.left, x - 200);
                    assert_eq!(r.top, y - 150);
                }
            }
        }
    }

    #[test]
    fn odd_sizes_center_with_truncated_half() {
        // 801 / 2.0 truncates to 400; half of that truncates to 200.
        let r = source_rect(Point { x: 600, y: 400 }, 801, 601, 2.0, SCREEN_W, SCREEN_H);
        assert_eq!(r.left, 600 - 200);
        assert_eq!(r.width(), 400);
    }

    #[test]
    fn rect_accessors() {
        let r = Rect::of_size(640, 480);
        assert_eq!(r.left, 0);
        assert_eq!(r.top, 0);
        assert_eq!(r.width(), 640);
        assert_eq!(r.height(), 480);
    }
}
