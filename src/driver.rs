// host driver
//
// the windowing/input/game-loop host lives outside this crate. it feeds
// elapsed time and discrete input events into `Game::update` and hands a
// painter to `Game::render`; nothing here inherits from an engine class.
// `MimicryGame` wires the population, the target images, the overlay
// cosmetics and the fitness readout together.

use tracing::{debug, info};

use crate::canvas::{Bounds, Painter, Raster, TargetImage};
use crate::color::{palette, Color};
use crate::config::SimulationConfig;
use crate::factory::CircleFactory;
use crate::fitness::buffer_fitness;
use crate::population::Population;

/// discrete controls delivered by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    RebuildPopulation,
    ToggleBackground,
    ToggleScoreOverlay,
    IncreasePopulationCap,
    DecreasePopulationCap,
    SelectBackground(usize),
    TakeScreenshot,
}

/// the contract the host loop drives
pub trait Game {
    fn initialize(&mut self);
    fn update(&mut self, elapsed: f32, events: &[InputEvent]);
    fn render(&self, painter: &mut dyn Painter);
}

pub struct MimicryGame {
    cfg: SimulationConfig,
    population: Population,
    backgrounds: Vec<Raster>,
    background_index: usize,
    show_background: bool,
    show_score: bool,
    /// seconds of overlay fade remaining; 0 means hidden
    text_timer: f32,
    /// previous tick's population-only render, consumed by the fitness pass
    comparison: Raster,
    fitness: f64,
    screenshot_pending: bool,
}

impl MimicryGame {
    /// build the game with its own entropy-seeded factory
    pub fn new(cfg: SimulationConfig, backgrounds: Vec<Raster>) -> Self {
        let factory = CircleFactory::new(cfg.factory_config());
        Self::with_factory(cfg, backgrounds, factory)
    }

    /// build the game around a caller-provided factory (seeded runs, tests)
    pub fn with_factory(
        cfg: SimulationConfig,
        backgrounds: Vec<Raster>,
        factory: CircleFactory,
    ) -> Self {
        assert!(
            !backgrounds.is_empty(),
            "at least one target image is required"
        );
        let width = backgrounds[0].width();
        let height = backgrounds[0].height();
        let population = Population::new(cfg.population_config(), factory);
        Self {
            cfg,
            population,
            backgrounds,
            background_index: 0,
            show_background: false,
            show_score: false,
            text_timer: 0.0,
            comparison: Raster::filled(width, height, palette::WHITE),
            fitness: 0.0,
            screenshot_pending: false,
        }
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// similarity of the previous tick's population render to the current
    /// target (the one-frame lag is deliberate; see update)
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// the population-only off-screen render from the last tick
    pub fn comparison(&self) -> &Raster {
        &self.comparison
    }

    pub fn screenshot_path(&self) -> &str {
        &self.cfg.screen_shoot_path
    }

    /// true once per TakeScreenshot event; the host consumes the flag and
    /// does the actual file write
    pub fn take_screenshot_request(&mut self) -> bool {
        std::mem::take(&mut self.screenshot_pending)
    }

    fn bounds(&self) -> Bounds {
        let target = &self.backgrounds[self.background_index];
        Bounds::new(target.width(), target.height())
    }

    fn show_overlay_text(&mut self) {
        if self.cfg.show_texts_on_screen {
            self.text_timer = self.cfg.time_fade_off_text;
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::RebuildPopulation => {
                let bounds = self.bounds();
                self.population.seed(bounds);
                info!(circles = self.population.live_count(), "population rebuilt");
            }
            InputEvent::ToggleBackground => self.show_background = !self.show_background,
            InputEvent::ToggleScoreOverlay => self.show_score = !self.show_score,
            InputEvent::IncreasePopulationCap => {
                let cap = self.population.max_circles() + self.cfg.num_circles_increment;
                self.population.set_max_circles(cap);
                self.show_overlay_text();
            }
            InputEvent::DecreasePopulationCap => {
                let cap = self
                    .population
                    .max_circles()
                    .saturating_sub(self.cfg.num_circles_increment);
                self.population.set_max_circles(cap);
                self.show_overlay_text();
            }
            InputEvent::SelectBackground(index) => {
                if index < self.backgrounds.len() {
                    self.background_index = index;
                } else {
                    debug!(index, "no background loaded in that slot");
                }
            }
            InputEvent::TakeScreenshot => self.screenshot_pending = true,
        }
    }

    fn overlay_alpha(&self) -> u8 {
        if self.cfg.time_fade_off_text <= 0.0 {
            return 0;
        }
        let fraction = (self.text_timer / self.cfg.time_fade_off_text).clamp(0.0, 1.0);
        (255.0 * fraction) as u8
    }
}

impl Game for MimicryGame {
    fn initialize(&mut self) {
        let bounds = self.bounds();
        self.population.seed(bounds);
        // settle the seed layout before the first tick
        let target = &self.backgrounds[self.background_index];
        self.population.score_all(target);
        self.population.resolve_overlaps();
    }

    fn update(&mut self, elapsed: f32, events: &[InputEvent]) {
        profiling::scope!("game_update");
        for &event in events {
            self.handle_event(event);
        }

        let bounds = self.bounds();
        let target = &self.backgrounds[self.background_index];
        self.population.update(bounds, elapsed, target);

        // fitness compares the *previous* tick's buffer against the current
        // target; the comparison raster is only re-rendered afterwards. the
        // readout trails the simulation by one frame.
        self.fitness = buffer_fitness(target.raw_buffer(), self.comparison.raw_buffer());

        self.comparison.clear(palette::WHITE);
        self.population.render(&mut self.comparison, false, false);

        if self.text_timer > 0.0 {
            self.text_timer = (self.text_timer - elapsed).max(0.0);
        }
    }

    fn render(&self, painter: &mut dyn Painter) {
        profiling::scope!("game_render");
        let target = &self.backgrounds[self.background_index];
        if self.show_background {
            painter.draw_image(target, 0, 0);
        } else {
            painter.clear(palette::WHITE);
        }

        // the circle outline is only drawn while the target is visible,
        // matching the original renderer
        self.population
            .render(painter, self.show_background, self.show_score);

        let alpha = self.overlay_alpha();
        if alpha > 0 {
            let text = Color::from_code(self.cfg.text_color).with_alpha(alpha).code();
            let boxed = Color::from_code(self.cfg.text_box_color)
                .with_alpha(alpha)
                .code();
            let stroke = Color::from_code(self.cfg.text_box_stroke_color)
                .with_alpha(alpha)
                .code();
            painter.fill_rect(5, 5, 250, 55, boxed);
            painter.stroke_rect(5, 5, 250, 55, stroke);
            painter.draw_text(
                &format!("live circles: {}", self.population.live_count()),
                10,
                10,
                text,
            );
            painter.draw_text(
                &format!("dying circles: {}", self.population.died_count()),
                10,
                26,
                text,
            );
            painter.draw_text(
                &format!(
                    "cap: {}  fitness: {:.2}%",
                    self.population.max_circles(),
                    self.fitness * 100.0
                ),
                10,
                42,
                text,
            );
        }
    }
}
