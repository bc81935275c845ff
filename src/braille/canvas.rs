use glam::DVec2;

/// Dot bits of one braille cell, indexed by `[y][x]`
const DOT_BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell holds a 2x4 dot grid (U+2800 to U+28FF).
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// Create a canvas of `width` x `height` characters, giving
    /// `width*2` x `height*4` dots.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Set one dot; anything outside the canvas is dropped
    pub fn set_dot(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[y % 4][x % 2];
    }

    /// Set the dot containing a fractional position
    pub fn plot(&mut self, p: DVec2) {
        if p.is_finite() {
            self.set_dot(p.x.floor() as i64, p.y.floor() as i64);
        }
    }

    /// One character row as a string
    pub fn row(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(0x2800 + u32::from(b)).unwrap_or(' '))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(canvas: &BrailleCanvas) -> String {
        canvas.rows().collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_single_dot() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_dot(0, 0);
        assert_eq!(render(&canvas), "⠁");
    }

    #[test]
    fn test_full_cell() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_dot(x, y);
            }
        }
        assert_eq!(render(&canvas), "⣿");
    }

    #[test]
    fn test_plot_floors_and_clips() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.plot(DVec2::new(0.9, 1.5));
        canvas.plot(DVec2::new(3.2, 3.99));
        canvas.plot(DVec2::new(-0.5, 0.0));
        canvas.plot(DVec2::new(4.0, 0.0));
        canvas.plot(DVec2::new(f64::NAN, 0.0));
        // (0,1) -> 0x02, (3,3) -> second cell 0x80
        assert_eq!(render(&canvas), "⠂⢀");
    }

    #[test]
    fn test_row_out_of_range_is_empty() {
        let mut canvas = BrailleCanvas::new(2, 2);
        canvas.set_dot(3, 7);
        assert_eq!(render(&canvas), "⠀⠀\n⠀⢀");
        assert!(canvas.row(2).is_empty());
    }
}
