// the individual of the simulation
//
// a circle carries the heritable genes (position, radius, color, offspring
// count) plus the per-tick similarity score. a circle scores higher when the
// target pixels under its disk are close to its own color, the same way
// mimicking species blend into their environment.

use crate::canvas::{Painter, TargetImage};
use crate::color::{palette, Color};

/// smallest radius the factory will ever produce
pub const MIN_CIRCLE_SIZE: f32 = 1.0;

#[derive(Clone, Debug)]
pub struct Circle {
    /// dense over the alive set, reassigned by the population after every
    /// structural change
    pub id: usize,
    pub x: f32,
    pub y: f32,
    /// radius in pixels, kept within [MIN_CIRCLE_SIZE, max_circle_size]
    pub size: f32,
    pub color: Color,
    /// similarity score against the target, recomputed every tick
    pub score: f64,
    /// offspring produced per reproduction event
    pub num_babies: u32,
    /// cleared when the circle is culled; a dead circle only fades
    pub alive: bool,
}

impl Circle {
    pub fn new(id: usize, x: f32, y: f32, size: f32, color: Color, num_babies: u32) -> Self {
        Self {
            id,
            x,
            y,
            size,
            color,
            score: 0.0,
            num_babies,
            alive: true,
        }
    }

    /// similarity sum of one horizontal span of the disk against the target.
    /// a span whose endpoints leave the image contributes nothing: spans are
    /// dropped whole, never clipped per pixel. returns (sum, sampled pixels).
    fn span_similarity(&self, sx: i32, ex: i32, ny: i32, image: &dyn TargetImage) -> (f64, u32) {
        if sx < 0 || ex >= image.width() as i32 || ny < 0 || ny >= image.height() as i32 {
            return (0.0, 0);
        }
        let mut sum = 0.0;
        let mut count = 0u32;
        for i in sx..ex {
            sum += self
                .color
                .similarity(&Color::from_code(image.pixel(i as u32, ny as u32)));
            count += 1;
        }
        (sum, count)
    }

    /// similarity of this circle's disk against the target image.
    ///
    /// walks the disk with the integer midpoint circle algorithm, sampling
    /// four symmetric horizontal spans per radius step, and returns the mean
    /// per-pixel similarity over everything sampled. a zero radius (or a
    /// disk whose every span falls outside the image) scores 0.0.
    pub fn score_against(&self, image: &dyn TargetImage) -> f64 {
        profiling::scope!("score_against");
        let mut x0: i32 = 0;
        let mut y0: i32 = self.size as i32;
        let mut d: i32 = 3 - 2 * y0;
        let mut sum = 0.0;
        let mut sampled = 0u32;

        while y0 >= x0 {
            let spans = [
                (self.x - x0 as f32, self.x + x0 as f32, self.y - y0 as f32),
                (self.x - y0 as f32, self.x + y0 as f32, self.y - x0 as f32),
                (self.x - x0 as f32, self.x + x0 as f32, self.y + y0 as f32),
                (self.x - y0 as f32, self.x + y0 as f32, self.y + x0 as f32),
            ];
            for (sx, ex, ny) in spans {
                let (s, n) = self.span_similarity(sx as i32, ex as i32, ny as i32, image);
                sum += s;
                sampled += n;
            }
            if d < 0 {
                d += 4 * x0 + 6;
            } else {
                d += 4 * (x0 - y0) + 10;
                y0 -= 1;
            }
            x0 += 1;
        }

        if sampled == 0 {
            return 0.0;
        }
        sum / sampled as f64
    }

    /// draw the circle through the painter contract. optional white outline
    /// and optional score overlay, both delegated.
    pub fn draw(&self, painter: &mut dyn Painter, draw_border: bool, draw_score: bool) {
        painter.fill_circle(self.x as i32, self.y as i32, self.size as i32, self.color.code());

        if draw_border {
            painter.stroke_circle(self.x as i32, self.y as i32, self.size as i32, palette::WHITE);
        }

        if draw_score {
            painter.draw_text(
                &format!("{:.2}%", self.score * 100.0),
                self.x as i32,
                self.y as i32,
                palette::WHITE,
            );
        }
    }
}
