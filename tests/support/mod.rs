#![allow(dead_code)]

pub mod handsign_env;

use handsign::landmarks::LandmarkFrame;
use rand::Rng;
use rand::rngs::StdRng;

/// A 21-point hand pose whose y profile follows `shape`, with small jitter.
pub fn pose(rng: &mut StdRng, shape: fn(f32) -> f32) -> LandmarkFrame {
    LandmarkFrame::new(
        (0..21)
            .map(|i| {
                let t = i as f32 / 20.0;
                let jitter_x = rng.random_range(-0.005..0.005);
                let jitter_y = rng.random_range(-0.005..0.005);
                [t + jitter_x, shape(t) + jitter_y, rng.random_range(-0.01..0.01)]
            })
            .collect(),
    )
}

pub fn poses(rng: &mut StdRng, shape: fn(f32) -> f32, count: usize) -> Vec<LandmarkFrame> {
    (0..count).map(|_| pose(rng, shape)).collect()
}

pub fn rising(t: f32) -> f32 {
    t
}

pub fn falling(t: f32) -> f32 {
    1.0 - t
}

pub fn arch(t: f32) -> f32 {
    (t * std::f32::consts::PI).sin()
}

pub fn valley(t: f32) -> f32 {
    1.0 - (t * std::f32::consts::PI).sin()
}
