// circle factory
//
// builds the random seed population and the mutated offspring. the factory
// owns the mutation-range configuration and the random generator, so the
// same bounded-variation logic serves every call site without per-circle
// config duplication. a single uniform-integer policy ([min, max)) is used
// for every draw, which keeps runs reproducible under a seeded generator.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::canvas::Bounds;
use crate::circle::{Circle, MIN_CIRCLE_SIZE};
use crate::color::Color;

/// smallest offspring count a circle can carry
const MIN_NUM_BABIES: i32 = 0;
/// channel limits for color draws and clamping
const COLOR_MIN: i32 = 0;
const COLOR_MAX: i32 = 255;

/// half-open integer variation range: draws land in [min, max)
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VariationRange {
    pub min: i32,
    pub max: i32,
}

/// everything the factory needs to build circles
#[derive(Clone, Copy, Debug)]
pub struct FactoryConfig {
    pub max_circle_size: i32,
    pub max_num_babies: i32,
    pub variation_size: VariationRange,
    pub variation_position: VariationRange,
    pub variation_color: VariationRange,
}

pub struct CircleFactory {
    rng: Pcg32,
    cfg: FactoryConfig,
}

impl CircleFactory {
    pub fn new(cfg: FactoryConfig) -> Self {
        Self {
            rng: Pcg32::from_rng(&mut rand::rng()),
            cfg,
        }
    }

    /// deterministic factory for reproducible runs and tests
    pub fn with_seed(cfg: FactoryConfig, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            cfg,
        }
    }

    /// uniform integer in [min, max); an empty range collapses to min
    fn random_between(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..max)
    }

    fn draw_variation(&mut self, range: VariationRange) -> i32 {
        self.random_between(range.min, range.max)
    }

    /// a fully random circle: uniform position within bounds, radius in
    /// [MIN_CIRCLE_SIZE, max_circle_size), random opaque color, random
    /// offspring gene. id is a placeholder until the population assigns one.
    pub fn build_random(&mut self, bounds: Bounds) -> Circle {
        let x = self.random_between(0, bounds.width as i32) as f32;
        let y = self.random_between(0, bounds.height as i32) as f32;
        let size = self.random_between(MIN_CIRCLE_SIZE as i32, self.cfg.max_circle_size) as f32;
        let color = Color::opaque(
            self.random_between(COLOR_MIN, COLOR_MAX) as u8,
            self.random_between(COLOR_MIN, COLOR_MAX) as u8,
            self.random_between(COLOR_MIN, COLOR_MAX) as u8,
        );
        let num_babies = self.random_between(MIN_NUM_BABIES, self.cfg.max_num_babies) as u32;
        Circle::new(0, x, y, size, color, num_babies)
    }

    /// `count` independent random circles with dense ids [0, count)
    pub fn build_random_population(&mut self, bounds: Bounds, count: usize) -> Vec<Circle> {
        (0..count)
            .map(|i| {
                let mut circle = self.build_random(bounds);
                circle.id = i;
                circle
            })
            .collect()
    }

    /// a child color: each channel offset by an independent draw from the
    /// color variation range, clamped back into [0, 255]. offspring are born
    /// fully opaque.
    fn offspring_color(&mut self, parent: &Color) -> Color {
        let r = (parent.r as i32 + self.draw_variation(self.cfg.variation_color))
            .clamp(COLOR_MIN, COLOR_MAX);
        let g = (parent.g as i32 + self.draw_variation(self.cfg.variation_color))
            .clamp(COLOR_MIN, COLOR_MAX);
        let b = (parent.b as i32 + self.draw_variation(self.cfg.variation_color))
            .clamp(COLOR_MIN, COLOR_MAX);
        Color::opaque(r as u8, g as u8, b as u8)
    }

    /// one mutated copy of the parent. position, radius and color each get
    /// an independent bounded offset; the radius is clamped back into its
    /// limits and the offspring gene is redrawn.
    pub fn build_offspring(&mut self, parent: &Circle) -> Circle {
        let size = (parent.size + self.draw_variation(self.cfg.variation_size) as f32)
            .clamp(MIN_CIRCLE_SIZE, self.cfg.max_circle_size.max(1) as f32);
        let x = parent.x + self.draw_variation(self.cfg.variation_position) as f32;
        let y = parent.y + self.draw_variation(self.cfg.variation_position) as f32;
        let color = self.offspring_color(&parent.color);
        let num_babies = self.random_between(MIN_NUM_BABIES, self.cfg.max_num_babies) as u32;
        Circle::new(0, x, y, size, color, num_babies)
    }

    /// all the children of one parent, as many as its offspring gene says
    pub fn build_offspring_batch(&mut self, parent: &Circle) -> Vec<Circle> {
        (0..parent.num_babies)
            .map(|_| self.build_offspring(parent))
            .collect()
    }
}
