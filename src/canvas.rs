// drawing and target-image contracts
//
// the simulation core never talks to a windowing backend. it draws through
// the narrow `Painter` trait and samples the target through `TargetImage`,
// both in packed 32-bit color codes. `Raster` is the CPU-side buffer that
// implements both: it serves as the off-screen comparison render for the
// fitness pass and as the test double for scoring.

/// world bounds the circles live in (in pixels)
#[derive(Clone, Copy, Debug)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// read contract for the image the population tries to mimic
pub trait TargetImage {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// packed color code at (x, y). callers bounds-check first.
    fn pixel(&self, x: u32, y: u32) -> u32;
    /// row-major buffer of length width*height
    fn raw_buffer(&self) -> &[u32];
}

/// draw contract consumed by circles and the driver. all colors are packed
/// 32-bit codes.
pub trait Painter {
    fn clear(&mut self, color: u32);
    fn fill_circle(&mut self, x: i32, y: i32, r: i32, color: u32);
    fn stroke_circle(&mut self, x: i32, y: i32, r: i32, color: u32);
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32);
    fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: u32);
    fn draw_image(&mut self, image: &dyn TargetImage, x: i32, y: i32);
}

/// an owned width*height pixel buffer
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: u32, height: u32, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    /// wrap an already decoded buffer (row-major, packed codes)
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height) as usize,
            "pixel buffer does not match raster dimensions"
        );
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = color;
    }

    #[inline]
    fn hline(&mut self, sx: i32, ex: i32, y: i32, color: u32) {
        for x in sx..=ex {
            self.set_pixel(x, y, color);
        }
    }
}

impl TargetImage for Raster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }

    fn raw_buffer(&self) -> &[u32] {
        &self.pixels
    }
}

impl Painter for Raster {
    fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    fn fill_circle(&mut self, x: i32, y: i32, r: i32, color: u32) {
        profiling::scope!("fill_circle");
        if r < 0 {
            return;
        }
        // same integer midpoint walk the scoring pass uses, so the rendered
        // silhouette and the scored silhouette agree
        let mut x0 = 0;
        let mut y0 = r;
        let mut d = 3 - 2 * r;
        while y0 >= x0 {
            self.hline(x - x0, x + x0, y - y0, color);
            self.hline(x - y0, x + y0, y - x0, color);
            self.hline(x - x0, x + x0, y + y0, color);
            self.hline(x - y0, x + y0, y + x0, color);
            if d < 0 {
                d += 4 * x0 + 6;
            } else {
                d += 4 * (x0 - y0) + 10;
                y0 -= 1;
            }
            x0 += 1;
        }
    }

    fn stroke_circle(&mut self, x: i32, y: i32, r: i32, color: u32) {
        if r < 0 {
            return;
        }
        let mut x0 = 0;
        let mut y0 = r;
        let mut d = 3 - 2 * r;
        while y0 >= x0 {
            for (px, py) in [
                (x + x0, y - y0),
                (x - x0, y - y0),
                (x + x0, y + y0),
                (x - x0, y + y0),
                (x + y0, y - x0),
                (x - y0, y - x0),
                (x + y0, y + x0),
                (x - y0, y + x0),
            ] {
                self.set_pixel(px, py, color);
            }
            if d < 0 {
                d += 4 * x0 + 6;
            } else {
                d += 4 * (x0 - y0) + 10;
                y0 -= 1;
            }
            x0 += 1;
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        for row in y..y + h {
            self.hline(x, x + w - 1, row, color);
        }
    }

    fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.hline(x, x + w - 1, y, color);
        self.hline(x, x + w - 1, y + h - 1, color);
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn draw_text(&mut self, _text: &str, _x: i32, _y: i32, _color: u32) {
        // the comparison buffer holds the population silhouette only; glyph
        // rendering lives in the host backend
    }

    fn draw_image(&mut self, image: &dyn TargetImage, x: i32, y: i32) {
        profiling::scope!("draw_image");
        for sy in 0..image.height() {
            for sx in 0..image.width() {
                self.set_pixel(x + sx as i32, y + sy as i32, image.pixel(sx, sy));
            }
        }
    }
}
