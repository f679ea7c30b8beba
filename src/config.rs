// simulation configuration
//
// the whole surface is parsed up front into one immutable value that gets
// passed by reference into the component constructors; nothing mutates live
// simulation state while a file is being read. two on-disk forms are
// accepted: the legacy line-oriented "key value" format (keys are
// case-insensitive, unknown or malformed lines are ignored with a warning
// and never fail the load) and a JSON form for round-tripping with serde.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::palette;
use crate::factory::{FactoryConfig, VariationRange};
use crate::population::PopulationConfig;

/// number of background image slots (image-0 .. image-9)
pub const BACKGROUND_SLOTS: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    // screen
    pub screen_width: u32,
    pub screen_height: u32,
    pub screen_scale: u32,

    // population bounds and growth
    /// cap on the alive population ("max-initial-circles")
    pub max_circles: usize,
    pub min_circles: usize,
    /// cap adjustment applied per host increment/decrement event
    pub num_circles_increment: usize,
    pub num_babies_by_circle: u32,
    /// seconds between reproduction batches ("make-babies-cap")
    pub make_babies_cap: f32,
    pub penalty_proximity: f64,

    // circle genes
    pub max_circle_size: i32,
    pub variation_size: VariationRange,
    pub variation_position: VariationRange,
    pub variation_color: VariationRange,

    // overlay cosmetics
    pub text_color: u32,
    pub text_box_color: u32,
    pub text_box_stroke_color: u32,
    pub show_texts_on_screen: bool,
    /// seconds the text overlay takes to fade out
    pub time_fade_off_text: f32,

    // host-side paths
    pub screen_shoot_path: String,
    pub background_paths: Vec<Option<String>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            screen_width: 540,
            screen_height: 360,
            screen_scale: 2,

            max_circles: 500,
            min_circles: 20,
            num_circles_increment: 10,
            num_babies_by_circle: 3,
            make_babies_cap: 0.15,
            penalty_proximity: 0.001,

            max_circle_size: 4,
            variation_size: VariationRange { min: -1, max: 2 },
            variation_position: VariationRange { min: -3, max: 4 },
            variation_color: VariationRange { min: -15, max: 16 },

            text_color: palette::WHITE,
            text_box_color: palette::BLACK,
            text_box_stroke_color: palette::WHITE,
            show_texts_on_screen: true,
            time_fade_off_text: 2.0,

            screen_shoot_path: "screenshot.png".to_string(),
            background_paths: vec![None; BACKGROUND_SLOTS],
        }
    }
}

impl SimulationConfig {
    /// load from a file. an unreadable file yields the defaults, a JSON file
    /// (sniffed by its leading brace) goes through serde, anything else goes
    /// through the line parser. never fails the run.
    pub fn load(path: &Path) -> Self {
        let mut cfg = Self::default();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                if text.trim_start().starts_with('{') {
                    match serde_json::from_str(&text) {
                        Ok(parsed) => cfg = parsed,
                        Err(e) => {
                            warn!(path = %path.display(), "failed to parse JSON config: {e}. using defaults.");
                        }
                    }
                } else {
                    cfg.apply_lines(&text);
                }
            }
            Err(e) => {
                warn!(path = %path.display(), "config not readable: {e}. using defaults.");
            }
        }
        cfg
    }

    /// save as pretty JSON
    pub fn save_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// apply the legacy line-oriented format on top of the current values.
    /// one "key value" pair per line, keys case-insensitive; a field keeps
    /// its prior value when its line fails to parse.
    pub fn apply_lines(&mut self, text: &str) {
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(char::is_whitespace) else {
                warn!(line = index + 1, "config line has no value, ignored");
                continue;
            };
            self.apply_entry(&key.to_ascii_lowercase(), value.trim(), index + 1);
        }
    }

    fn apply_entry(&mut self, key: &str, value: &str, line: usize) {
        match key {
            "screen-width" => set_parsed(&mut self.screen_width, key, value, line),
            "screen-height" => set_parsed(&mut self.screen_height, key, value, line),
            "screen-scale" => set_parsed(&mut self.screen_scale, key, value, line),
            "max-initial-circles" => set_parsed(&mut self.max_circles, key, value, line),
            "min-circles" => set_parsed(&mut self.min_circles, key, value, line),
            "num-circles-increment" => {
                set_parsed(&mut self.num_circles_increment, key, value, line)
            }
            "num-babies-by-circle" => set_parsed(&mut self.num_babies_by_circle, key, value, line),
            "make-babies-cap" => set_parsed(&mut self.make_babies_cap, key, value, line),
            "penalty-proximity" => set_parsed(&mut self.penalty_proximity, key, value, line),
            "max-circle-size" => set_parsed(&mut self.max_circle_size, key, value, line),
            "max-variation-size" => set_parsed(&mut self.variation_size.max, key, value, line),
            "min-variation-size" => set_parsed(&mut self.variation_size.min, key, value, line),
            "max-variation-position" => {
                set_parsed(&mut self.variation_position.max, key, value, line)
            }
            "min-variation-position" => {
                set_parsed(&mut self.variation_position.min, key, value, line)
            }
            "max-variation-color" => set_parsed(&mut self.variation_color.max, key, value, line),
            "min-variation-color" => set_parsed(&mut self.variation_color.min, key, value, line),
            "text-color" => set_palette_color(&mut self.text_color, key, value, line),
            "text-box-color" => set_palette_color(&mut self.text_box_color, key, value, line),
            "text-box-stroke-color" => {
                set_palette_color(&mut self.text_box_stroke_color, key, value, line)
            }
            "show-texts-on-screen" => set_parsed(&mut self.show_texts_on_screen, key, value, line),
            "time-fade-off-text" => set_parsed(&mut self.time_fade_off_text, key, value, line),
            "screen-shoot-path" => self.screen_shoot_path = value.to_string(),
            _ => {
                if let Some(slot) = key.strip_prefix("image-") {
                    match slot.parse::<usize>() {
                        Ok(i) if i < BACKGROUND_SLOTS => {
                            self.background_paths[i] = Some(value.to_string());
                        }
                        _ => warn!(line, key, "background slot out of range, ignored"),
                    }
                } else {
                    warn!(line, key, "unknown config key, ignored");
                }
            }
        }
    }

    /// the factory's slice of the configuration. the size cap is floored at
    /// the minimum radius so a hostile config cannot invert the clamp.
    pub fn factory_config(&self) -> FactoryConfig {
        FactoryConfig {
            max_circle_size: self.max_circle_size.max(1),
            max_num_babies: self.num_babies_by_circle as i32,
            variation_size: self.variation_size,
            variation_position: self.variation_position,
            variation_color: self.variation_color,
        }
    }

    /// the population's slice of the configuration
    pub fn population_config(&self) -> PopulationConfig {
        PopulationConfig {
            max_circles: self.max_circles,
            min_circles: self.min_circles,
            penalty_proximity: self.penalty_proximity,
            babies_interval: self.make_babies_cap,
        }
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str, line: usize) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(line, key, value, "malformed config value, keeping prior"),
    }
}

fn set_palette_color(slot: &mut u32, key: &str, value: &str, line: usize) {
    match palette::named(value) {
        Some(code) => *slot = code,
        None => warn!(line, key, value, "unknown palette color, keeping prior"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_classic_run() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.screen_width, 540);
        assert_eq!(cfg.max_circles, 500);
        assert_eq!(cfg.min_circles, 20);
        assert_eq!(cfg.num_babies_by_circle, 3);
        assert!((cfg.make_babies_cap - 0.15).abs() < f32::EPSILON);
        assert_eq!(cfg.penalty_proximity, 0.001);
    }

    #[test]
    fn test_line_format_parses_known_keys() {
        let mut cfg = SimulationConfig::default();
        cfg.apply_lines(
            "screen-width 800\n\
             MAX-INITIAL-CIRCLES 120\n\
             penalty-proximity 0.25\n\
             max-variation-color 30\n\
             min-variation-color -30\n\
             text-color LEMON\n\
             show-texts-on-screen false\n\
             image-3 targets/beetle.png\n",
        );
        assert_eq!(cfg.screen_width, 800);
        assert_eq!(cfg.max_circles, 120);
        assert_eq!(cfg.penalty_proximity, 0.25);
        assert_eq!(cfg.variation_color.max, 30);
        assert_eq!(cfg.variation_color.min, -30);
        assert_eq!(cfg.text_color, palette::LEMON);
        assert!(!cfg.show_texts_on_screen);
        assert_eq!(
            cfg.background_paths[3].as_deref(),
            Some("targets/beetle.png")
        );
    }

    #[test]
    fn test_malformed_lines_keep_prior_values() {
        let mut cfg = SimulationConfig::default();
        cfg.apply_lines(
            "screen-width not-a-number\n\
             min-circles\n\
             text-color chartreuse\n\
             no-such-key 42\n\
             image-99 too/far.png\n",
        );
        let defaults = SimulationConfig::default();
        assert_eq!(cfg.screen_width, defaults.screen_width);
        assert_eq!(cfg.min_circles, defaults.min_circles);
        assert_eq!(cfg.text_color, defaults.text_color);
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        let mut cfg = SimulationConfig::default();
        cfg.apply_lines("\n   \n# a comment\nscreen-scale 3\n");
        assert_eq!(cfg.screen_scale, 3);
    }

    #[test]
    fn test_json_round_trip() {
        let mut cfg = SimulationConfig::default();
        cfg.max_circles = 77;
        cfg.background_paths[0] = Some("a.png".to_string());
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_circles, 77);
        assert_eq!(back.background_paths[0].as_deref(), Some("a.png"));
    }

    #[test]
    fn test_component_config_slices() {
        let mut cfg = SimulationConfig::default();
        cfg.max_circle_size = -2; // hostile value
        let factory = cfg.factory_config();
        assert_eq!(factory.max_circle_size, 1);

        let population = cfg.population_config();
        assert_eq!(population.max_circles, cfg.max_circles);
        assert!((population.babies_interval - cfg.make_babies_cap).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let cfg = SimulationConfig::load(Path::new("/definitely/not/here.conf"));
        assert_eq!(cfg.max_circles, SimulationConfig::default().max_circles);
    }
}
