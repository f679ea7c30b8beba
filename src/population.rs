// the population of circles
//
// owns the alive and dying collections and runs the per-tick pipeline:
// edge clamp, pairwise overlap resolution, similarity scoring with the
// proximity penalty, culling past the cap, fade-out of the culled, and
// timed reproduction. circles are stored in plain vectors; the index is the
// stable handle and ids are rewritten to the index after every structural
// change, so ids stay dense over [0, alive_count).

use crate::canvas::{Bounds, Painter, TargetImage};
use crate::circle::Circle;
use crate::factory::CircleFactory;

/// alpha lost per tick by a dying circle; once alpha drops below this the
/// circle is removed for good
const ALPHA_DECREASE: u8 = 5;

#[derive(Clone, Copy, Debug)]
pub struct PopulationConfig {
    /// cap on the alive population; the worst scorers past it are culled
    pub max_circles: usize,
    /// size of a fresh seed population
    pub min_circles: usize,
    /// score deduction shared by a pair of clustering circles
    pub penalty_proximity: f64,
    /// seconds between reproduction batches
    pub babies_interval: f32,
}

pub struct Population {
    alive: Vec<Circle>,
    dying: Vec<Circle>,
    factory: CircleFactory,
    cfg: PopulationConfig,
    /// elapsed-time accumulator for reproduction
    breed_timer: f32,
}

impl Population {
    pub fn new(cfg: PopulationConfig, factory: CircleFactory) -> Self {
        Self {
            alive: Vec::new(),
            dying: Vec::new(),
            factory,
            cfg,
            breed_timer: 0.0,
        }
    }

    pub fn alive(&self) -> &[Circle] {
        &self.alive
    }

    pub fn dying(&self) -> &[Circle] {
        &self.dying
    }

    pub fn live_count(&self) -> usize {
        self.alive.len()
    }

    pub fn died_count(&self) -> usize {
        self.dying.len()
    }

    pub fn max_circles(&self) -> usize {
        self.cfg.max_circles
    }

    /// adjust the population cap at runtime (host controls)
    pub fn set_max_circles(&mut self, max: usize) {
        self.cfg.max_circles = max;
    }

    /// replace the live collection with a fresh random population of the
    /// configured minimum size and drop any fading circles
    pub fn seed(&mut self, bounds: Bounds) {
        self.alive = self
            .factory
            .build_random_population(bounds, self.cfg.min_circles);
        self.dying.clear();
    }

    fn assign_ids(&mut self) {
        for (i, circle) in self.alive.iter_mut().enumerate() {
            circle.id = i;
        }
    }

    /// clamp every alive circle so its disk stays fully inside the bounds
    pub fn resolve_edge_collisions(&mut self, bounds: Bounds) {
        let width = bounds.width as f32;
        let height = bounds.height as f32;
        for c in &mut self.alive {
            if c.x - c.size < 0.0 {
                c.x = c.size;
            }
            if c.x + c.size >= width {
                c.x = width - c.size;
            }
            if c.y - c.size < 0.0 {
                c.y = c.size;
            }
            if c.y + c.size >= height {
                c.y = height - c.size;
            }
        }
    }

    /// push two overlapping circles apart along the center axis by the
    /// overlap depth. coincident centers get a unit divisor instead of a
    /// division by zero (and a zero direction, so they stay put).
    fn push_apart(c: &mut Circle, t: &mut Circle) {
        let dx = c.x - t.x;
        let dy = c.y - t.y;
        let dist2 = dx * dx + dy * dy;
        let radii = c.size + t.size;
        if dist2 > radii * radii {
            return;
        }

        let mut dist = dist2.sqrt();
        if dist <= 0.0 {
            dist = 1.0;
        }

        let overlap = dist - radii; // negative while overlapping
        c.x -= overlap * dx / dist;
        c.y -= overlap * dy / dist;
        t.x += overlap * dx / dist;
        t.y += overlap * dy / dist;
    }

    /// resolve overlaps between every ordered pair of alive circles. both
    /// orientations of a pair are visited, so each overlapping pair is
    /// pushed twice per tick; non-overlapping layouts are left untouched.
    pub fn resolve_overlaps(&mut self) {
        profiling::scope!("resolve_overlaps");
        let n = self.alive.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (c, t) = if i < j {
                    let (lo, hi) = self.alive.split_at_mut(j);
                    (&mut lo[i], &mut hi[0])
                } else {
                    let (lo, hi) = self.alive.split_at_mut(i);
                    (&mut hi[0], &mut lo[j])
                };
                Self::push_apart(c, t);
            }
        }
    }

    /// recompute every alive circle's similarity score, then charge the
    /// proximity penalty: every unordered pair of circles closer than five
    /// times their combined radii loses penalty/2 on both sides.
    pub fn score_all(&mut self, target: &dyn TargetImage) {
        profiling::scope!("score_all");
        for c in &mut self.alive {
            c.score = c.score_against(target);
        }

        let half_penalty = self.cfg.penalty_proximity / 2.0;
        let n = self.alive.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = self.alive[i].x - self.alive[j].x;
                let dy = self.alive[i].y - self.alive[j].y;
                let dist2 = dx * dx + dy * dy;
                let sizes = 5.0 * (self.alive[i].size + self.alive[j].size);
                if dist2 <= sizes * sizes {
                    self.alive[i].score -= half_penalty;
                    self.alive[j].score -= half_penalty;
                }
            }
        }
    }

    /// sort the alive circles by ascending score (stable, so ties keep
    /// their original order) and move everything past the cap into the
    /// dying set, lowest scorers first
    pub fn cull_worst(&mut self) {
        profiling::scope!("cull_worst");
        self.alive.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if self.alive.len() > self.cfg.max_circles {
            let excess = self.alive.len() - self.cfg.max_circles;
            for mut circle in self.alive.drain(..excess) {
                circle.alive = false;
                self.dying.push(circle);
            }
        }
        self.assign_ids();
    }

    /// fade the dying circles one alpha step and drop the ones that are
    /// effectively gone
    pub fn fade_dying(&mut self) {
        for c in &mut self.dying {
            c.color.a = c.color.a.saturating_sub(ALPHA_DECREASE);
        }
        self.dying.retain(|c| c.color.a >= ALPHA_DECREASE);
    }

    /// accumulate elapsed time; once the interval is reached every alive
    /// circle contributes its offspring and the interval is subtracted from
    /// the accumulator. a single call fires at most one batch, so a long
    /// stall never floods the population in one tick.
    pub fn maybe_reproduce(&mut self, elapsed: f32) {
        self.breed_timer += elapsed;
        if self.breed_timer < self.cfg.babies_interval {
            return;
        }
        profiling::scope!("reproduce");

        let mut babies = Vec::new();
        for parent in &self.alive {
            babies.extend(self.factory.build_offspring_batch(parent));
        }
        self.alive.append(&mut babies);
        self.assign_ids();

        self.breed_timer -= self.cfg.babies_interval;
    }

    /// one simulation tick, in fixed order
    pub fn update(&mut self, bounds: Bounds, elapsed: f32, target: &dyn TargetImage) {
        profiling::scope!("population_update");
        self.resolve_edge_collisions(bounds);
        self.resolve_overlaps();
        self.score_all(target);
        self.cull_worst();
        self.fade_dying();
        self.maybe_reproduce(elapsed);
    }

    /// draw the alive circles with the requested overlays, then the dying
    /// ones with no overlays
    pub fn render(&self, painter: &mut dyn Painter, draw_border: bool, draw_score: bool) {
        for c in &self.alive {
            c.draw(painter, draw_border, draw_score);
        }
        for c in &self.dying {
            c.draw(painter, false, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Raster;
    use crate::color::{palette, Color};
    use crate::factory::{FactoryConfig, VariationRange};

    fn test_factory(seed: u64) -> CircleFactory {
        CircleFactory::with_seed(
            FactoryConfig {
                max_circle_size: 4,
                max_num_babies: 3,
                variation_size: VariationRange { min: -1, max: 2 },
                variation_position: VariationRange { min: -3, max: 4 },
                variation_color: VariationRange { min: -15, max: 16 },
            },
            seed,
        )
    }

    fn test_population(max: usize, min: usize) -> Population {
        Population::new(
            PopulationConfig {
                max_circles: max,
                min_circles: min,
                penalty_proximity: 0.001,
                babies_interval: 0.15,
            },
            test_factory(1),
        )
    }

    fn circle_at(id: usize, x: f32, y: f32, size: f32) -> Circle {
        Circle::new(id, x, y, size, Color::opaque(255, 255, 255), 0)
    }

    fn push_alive(population: &mut Population, circle: Circle) {
        population.alive.push(circle);
    }

    #[test]
    fn test_seed_builds_min_circles_and_clears_dying() {
        let bounds = Bounds::new(100, 100);
        let mut population = test_population(15, 20);
        population.dying.push(circle_at(0, 5.0, 5.0, 2.0));
        population.seed(bounds);
        assert_eq!(population.live_count(), 20);
        assert_eq!(population.died_count(), 0);
        for (i, c) in population.alive().iter().enumerate() {
            assert_eq!(c.id, i);
        }
    }

    #[test]
    fn test_edge_collision_clamps_into_bounds() {
        let bounds = Bounds::new(100, 80);
        let mut population = test_population(10, 5);
        push_alive(&mut population, circle_at(0, -5.0, 40.0, 3.0));
        push_alive(&mut population, circle_at(1, 99.0, 40.0, 3.0));
        push_alive(&mut population, circle_at(2, 50.0, -2.0, 3.0));
        push_alive(&mut population, circle_at(3, 50.0, 85.0, 3.0));
        population.resolve_edge_collisions(bounds);
        let alive = population.alive();
        assert_eq!(alive[0].x, 3.0);
        assert_eq!(alive[1].x, 97.0);
        assert_eq!(alive[2].y, 3.0);
        assert_eq!(alive[3].y, 77.0);
    }

    #[test]
    fn test_resolve_overlaps_is_idempotent_without_overlap() {
        let mut population = test_population(10, 5);
        push_alive(&mut population, circle_at(0, 10.0, 10.0, 3.0));
        push_alive(&mut population, circle_at(1, 30.0, 10.0, 3.0));
        push_alive(&mut population, circle_at(2, 10.0, 30.0, 3.0));
        let before: Vec<(f32, f32)> = population.alive().iter().map(|c| (c.x, c.y)).collect();
        population.resolve_overlaps();
        let after: Vec<(f32, f32)> = population.alive().iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_resolve_overlaps_separates_overlapping_pair() {
        let mut population = test_population(10, 5);
        push_alive(&mut population, circle_at(0, 10.0, 10.0, 4.0));
        push_alive(&mut population, circle_at(1, 13.0, 10.0, 4.0));
        population.resolve_overlaps();
        let alive = population.alive();
        let gap = (alive[1].x - alive[0].x).abs();
        assert!(gap >= 8.0, "centers only {gap} apart after resolution");
        // pushed apart along the x axis only
        assert_eq!(alive[0].y, 10.0);
        assert_eq!(alive[1].y, 10.0);
    }

    #[test]
    fn test_coincident_centers_do_not_divide_by_zero() {
        let mut population = test_population(10, 5);
        push_alive(&mut population, circle_at(0, 10.0, 10.0, 4.0));
        push_alive(&mut population, circle_at(1, 10.0, 10.0, 4.0));
        population.resolve_overlaps();
        for c in population.alive() {
            assert!(c.x.is_finite() && c.y.is_finite());
        }
    }

    #[test]
    fn test_proximity_penalty_charged_once_per_pair() {
        // two identical white circles on a white target: base score is 1.0,
        // distance 0 is within 5*(10+10), so each side loses penalty/2
        let target = Raster::filled(64, 64, palette::WHITE);
        let mut population = test_population(10, 5);
        push_alive(&mut population, circle_at(0, 32.0, 32.0, 10.0));
        push_alive(&mut population, circle_at(1, 32.0, 32.0, 10.0));
        population.score_all(&target);
        let expected = 1.0 - 0.001 / 2.0;
        for c in population.alive() {
            assert!((c.score - expected).abs() < 1e-12, "score was {}", c.score);
        }
    }

    #[test]
    fn test_distant_circles_pay_no_penalty() {
        let target = Raster::filled(400, 64, palette::WHITE);
        let mut population = test_population(10, 5);
        // 5*(2+2) = 20; centers 300 apart
        push_alive(&mut population, circle_at(0, 30.0, 32.0, 2.0));
        push_alive(&mut population, circle_at(1, 330.0, 32.0, 2.0));
        population.score_all(&target);
        for c in population.alive() {
            assert_eq!(c.score, 1.0);
        }
    }

    #[test]
    fn test_cull_worst_moves_lowest_scorers_to_dying() {
        let mut population = test_population(15, 20);
        population.seed(Bounds::new(100, 100));
        for (i, c) in population.alive.iter_mut().enumerate() {
            c.score = i as f64; // circle 0 is the worst
        }
        population.cull_worst();
        assert_eq!(population.live_count(), 15);
        assert_eq!(population.died_count(), 5);
        for c in population.dying() {
            assert!(!c.alive);
            assert!(c.score < 5.0, "a high scorer was culled");
        }
        for (i, c) in population.alive().iter().enumerate() {
            assert_eq!(c.id, i);
        }
    }

    #[test]
    fn test_cull_worst_breaks_ties_by_original_order() {
        let mut population = test_population(2, 3);
        let mut a = circle_at(0, 10.0, 10.0, 2.0);
        let mut b = circle_at(1, 20.0, 10.0, 2.0);
        let mut c = circle_at(2, 30.0, 10.0, 2.0);
        a.score = 0.5;
        b.score = 0.5;
        c.score = 0.5;
        push_alive(&mut population, a);
        push_alive(&mut population, b);
        push_alive(&mut population, c);
        population.cull_worst();
        // stable sort: the first inserted equal scorer is culled
        assert_eq!(population.died_count(), 1);
        assert_eq!(population.dying()[0].x, 10.0);
    }

    #[test]
    fn test_cull_under_cap_is_a_no_op() {
        let mut population = test_population(10, 3);
        push_alive(&mut population, circle_at(0, 10.0, 10.0, 2.0));
        population.cull_worst();
        assert_eq!(population.live_count(), 1);
        assert_eq!(population.died_count(), 0);
    }

    #[test]
    fn test_fade_dying_decrements_until_removed() {
        let mut population = test_population(10, 5);
        let mut doomed = circle_at(0, 10.0, 10.0, 2.0);
        doomed.alive = false;
        doomed.color = Color::new(1, 2, 3, 12);
        population.dying.push(doomed);

        population.fade_dying();
        assert_eq!(population.died_count(), 1);
        assert_eq!(population.dying()[0].color.a, 7);

        population.fade_dying();
        // 7 - 5 = 2, below the decrement: gone
        assert_eq!(population.died_count(), 0);
    }

    #[test]
    fn test_fade_full_lifetime_from_opaque() {
        let mut population = test_population(10, 5);
        let mut doomed = circle_at(0, 10.0, 10.0, 2.0);
        doomed.alive = false;
        population.dying.push(doomed);

        let mut previous = 255u8;
        let mut ticks = 0;
        while population.died_count() > 0 {
            population.fade_dying();
            if let Some(c) = population.dying().first() {
                assert!(c.color.a < previous, "alpha must strictly decrease");
                previous = c.color.a;
            }
            ticks += 1;
            assert!(ticks < 100, "dying circle never removed");
        }
        assert_eq!(ticks, 51); // 50 visible steps down to alpha 5, then gone
    }

    #[test]
    fn test_reproduce_waits_for_the_interval() {
        let target_babies = 2;
        let mut population = test_population(100, 5);
        let mut parent = circle_at(0, 50.0, 50.0, 2.0);
        parent.num_babies = target_babies;
        push_alive(&mut population, parent);

        population.maybe_reproduce(0.05);
        assert_eq!(population.live_count(), 1, "interval not reached yet");

        population.maybe_reproduce(0.10);
        assert_eq!(population.live_count(), 1 + target_babies as usize);
        for (i, c) in population.alive().iter().enumerate() {
            assert_eq!(c.id, i, "ids reassigned densely after a spawn");
        }
    }

    #[test]
    fn test_reproduce_fires_once_per_call_and_keeps_remainder() {
        let mut population = test_population(100, 5);
        let mut parent = circle_at(0, 50.0, 50.0, 2.0);
        parent.num_babies = 1;
        push_alive(&mut population, parent);

        // a huge stall: still a single batch in this call
        population.maybe_reproduce(10.0 * 0.15);
        assert_eq!(population.live_count(), 2);

        // the remainder is already past the cap, so the next call fires
        // immediately even with no elapsed time
        population.maybe_reproduce(0.0);
        assert!(population.live_count() > 2);
    }

    #[test]
    fn test_update_keeps_ids_dense_and_cap_respected() {
        let target = Raster::filled(100, 100, palette::GREY);
        let bounds = Bounds::new(100, 100);
        let mut population = test_population(15, 20);
        population.seed(bounds);

        for _ in 0..5 {
            population.update(bounds, 0.05, &target);
            assert!(population.live_count() > 0);
            let mut seen = std::collections::HashSet::new();
            for (i, c) in population.alive().iter().enumerate() {
                assert_eq!(c.id, i);
                assert!(seen.insert(c.id));
            }
        }
    }

    #[test]
    fn test_render_draws_alive_then_dying() {
        let mut canvas = Raster::filled(64, 64, palette::BLACK);
        let mut population = test_population(10, 5);
        push_alive(&mut population, {
            let mut c = circle_at(0, 16.0, 16.0, 4.0);
            c.color = Color::opaque(10, 200, 10);
            c
        });
        let mut dead = circle_at(1, 48.0, 48.0, 4.0);
        dead.alive = false;
        dead.color = Color::new(200, 10, 10, 100);
        population.dying.push(dead);

        population.render(&mut canvas, false, false);
        assert_eq!(canvas.pixel(16, 16), Color::opaque(10, 200, 10).code());
        assert_eq!(canvas.pixel(48, 48), Color::new(200, 10, 10, 100).code());
    }
}
