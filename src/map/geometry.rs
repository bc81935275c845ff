use glam::DVec2;

use crate::braille::BrailleCanvas;

/// Longest segment rasterized; beyond this the endpoints are far off-canvas
const MAX_SEGMENT_DOTS: f64 = 1_000_000.0;

/// Draw a line between two dot positions using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, a: DVec2, b: DVec2) {
    if !(a.is_finite() && b.is_finite()) || a.distance(b) > MAX_SEGMENT_DOTS {
        return;
    }
    let (x0, y0) = (a.x.floor() as i64, a.y.floor() as i64);
    let (x1, y1) = (b.x.floor() as i64, b.y.floor() as i64);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_dot(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Dotted line, one dot every `gap` dots. Used for tile boundaries.
pub fn draw_dotted_line(canvas: &mut BrailleCanvas, a: DVec2, b: DVec2, gap: f64) {
    let len = a.distance(b);
    if !len.is_finite() || gap <= 0.0 || len > MAX_SEGMENT_DOTS {
        return;
    }
    if len == 0.0 {
        canvas.plot(a);
        return;
    }
    let dir = (b - a) / len;
    let steps = (len / gap).floor() as usize;
    for i in 0..=steps {
        canvas.plot(a + dir * (i as f64 * gap));
    }
}

/// Connect consecutive points, closing the ring when `closed`
pub fn draw_path(canvas: &mut BrailleCanvas, points: &[DVec2], closed: bool) {
    for pair in points.windows(2) {
        draw_line(canvas, pair[0], pair[1]);
    }
    if closed && points.len() > 2 {
        draw_line(canvas, points[points.len() - 1], points[0]);
    }
    if let [only] = points {
        canvas.plot(*only);
    }
}

/// Small cross
pub fn draw_marker(canvas: &mut BrailleCanvas, p: DVec2, size: i64) {
    let (x, y) = (p.x.floor() as i64, p.y.floor() as i64);
    for i in -size..=size {
        canvas.set_dot(x + i, y);
        canvas.set_dot(x, y + i);
    }
}

/// Filled circle, used for point shapes
pub fn draw_circle(canvas: &mut BrailleCanvas, c: DVec2, radius: i64) {
    let (cx, cy) = (c.x.floor() as i64, c.y.floor() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_dot(cx + dx, cy + dy);
            }
        }
    }
}

/// Hollow square around a vertex in edit mode
pub fn draw_vertex_handle(canvas: &mut BrailleCanvas, p: DVec2) {
    let (x, y) = (p.x.floor() as i64, p.y.floor() as i64);
    for i in -1..=1 {
        canvas.set_dot(x + i, y - 1);
        canvas.set_dot(x + i, y + 1);
        canvas.set_dot(x - 1, y + i);
        canvas.set_dot(x + 1, y + i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(canvas: &BrailleCanvas) -> String {
        canvas.rows().collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(2, 1);
        draw_line(&mut canvas, DVec2::ZERO, DVec2::new(3.0, 0.0));
        assert_eq!(render(&canvas), "⠉⠉");
    }

    #[test]
    fn test_vertical_line_reversed() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, DVec2::new(0.0, 7.0), DVec2::ZERO);
        assert_eq!(render(&canvas), "⡇\n⡇");
    }

    #[test]
    fn test_line_far_offscreen_skipped() {
        let mut canvas = BrailleCanvas::new(1, 1);
        draw_line(&mut canvas, DVec2::ZERO, DVec2::new(1e12, 0.0));
        assert_eq!(render(&canvas), "⠀");
    }

    #[test]
    fn test_closed_path() {
        let mut canvas = BrailleCanvas::new(1, 1);
        let square = [DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(1.0, 3.0), DVec2::new(0.0, 3.0)];
        draw_path(&mut canvas, &square, true);
        assert_eq!(render(&canvas), "⣿");
    }

    #[test]
    fn test_dotted_line_spacing() {
        let mut canvas = BrailleCanvas::new(4, 1);
        draw_dotted_line(&mut canvas, DVec2::ZERO, DVec2::new(7.0, 0.0), 2.0);
        // Dots at x = 0, 2, 4, 6
        assert_eq!(render(&canvas), "⠁⠁⠁⠁");
    }
}
