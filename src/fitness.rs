// whole-buffer fitness
//
// compares the off-screen render of the population against the target
// image, pixel by pixel over all four channels, and reduces to a single
// similarity in [0, 1]. the per-pixel metric is the same channel-squared
// similarity the circles use, extended with the alpha channel because the
// rendered composite's transparency matters here.

use rayon::prelude::*;

use crate::color::Color;

/// mean 4-channel similarity of two equal-length packed-u32 pixel buffers.
/// identical buffers score exactly 1.0; buffers differing by 255 in every
/// channel score exactly 0.0. a length mismatch is a contract violation.
pub fn buffer_fitness(back: &[u32], front: &[u32]) -> f64 {
    profiling::scope!("buffer_fitness");
    assert_eq!(
        back.len(),
        front.len(),
        "fitness buffers must have equal length"
    );
    if front.is_empty() {
        return 0.0;
    }

    // coarse-grain the parallelism so tiny buffers don't pay task overhead
    let min_chunk = 64 * 1024;
    let sum: f64 = front
        .par_iter()
        .zip(back.par_iter())
        .with_min_len(min_chunk)
        .map(|(&f, &b)| Color::from_code(f).similarity_with_alpha(&Color::from_code(b)))
        .sum();

    sum / front.len() as f64
}
