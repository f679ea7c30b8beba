mod canvas;
mod circle;
mod color;
mod config;
mod driver;
mod factory;
mod fitness;
mod population;

use std::path::Path;

use tracing::{info, warn};

use crate::canvas::{Raster, TargetImage};
use crate::config::SimulationConfig;
use crate::driver::{Game, MimicryGame};

/// headless host: fixed-timestep tick loop, no window. the simulation core
/// only sees elapsed time, input events and the painter contract, so a GUI
/// host can drive the same `MimicryGame` unchanged.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "circles.conf".to_string());
    let cfg = SimulationConfig::load(Path::new(&config_path));
    let backgrounds = load_backgrounds(&cfg);

    let mut game = MimicryGame::new(cfg, backgrounds);
    game.initialize();
    info!(
        circles = game.population().live_count(),
        "population seeded"
    );

    let ticks = 600u32;
    let dt = 1.0 / 60.0;
    for tick in 0..ticks {
        game.update(dt, &[]);
        if (tick + 1) % 60 == 0 {
            info!(
                tick = tick + 1,
                live = game.population().live_count(),
                dying = game.population().died_count(),
                fitness = game.fitness(),
                "simulation progress"
            );
        }
    }

    save_screenshot(game.screenshot_path(), game.comparison())?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// decode the configured background images; every failure is non-fatal.
/// with nothing configured (or nothing decodable) a synthesized gradient
/// stands in so the binary runs without assets.
fn load_backgrounds(cfg: &SimulationConfig) -> Vec<Raster> {
    let mut backgrounds = Vec::new();
    for path in cfg.background_paths.iter().flatten() {
        match image::open(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                let pixels = rgba
                    .pixels()
                    .map(|p| {
                        (p[3] as u32) << 24 | (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32
                    })
                    .collect();
                info!(path = %path, width, height, "background image loaded");
                backgrounds.push(Raster::from_pixels(width, height, pixels));
            }
            Err(e) => warn!(path = %path, "could not decode background image: {e}"),
        }
    }

    if backgrounds.is_empty() {
        info!("no background images available, using a synthesized gradient target");
        backgrounds.push(gradient_target(cfg.screen_width, cfg.screen_height));
    }
    backgrounds
}

fn gradient_target(width: u32, height: u32) -> Raster {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u32;
            let g = (y * 255 / height.max(1)) as u32;
            let b = 128u32;
            pixels.push(0xFF00_0000 | r << 16 | g << 8 | b);
        }
    }
    Raster::from_pixels(width, height, pixels)
}

fn save_screenshot(path: &str, raster: &Raster) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = image::RgbaImage::new(raster.width(), raster.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let code = raster.pixel(x, y);
        *pixel = image::Rgba([
            (code >> 16) as u8,
            (code >> 8) as u8,
            code as u8,
            (code >> 24) as u8,
        ]);
    }
    out.save(path)?;
    info!(path, "screenshot written");
    Ok(())
}
