//! Weight initialization

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator, or one seeded from the OS when `seed` is `None`
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Uniform samples in `[-bound, bound]`
pub fn uniform<R: Rng>(len: usize, bound: f32, rng: &mut R) -> Array1<f32> {
    if bound <= 0.0 {
        return Array1::zeros(len);
    }
    Array1::from_iter((0..len).map(|_| rng.random_range(-bound..=bound)))
}

/// Kaiming uniform with `a = sqrt(5)`: `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`
pub fn kaiming_uniform<R: Rng>(len: usize, fan_in: usize, rng: &mut R) -> Array1<f32> {
    uniform(len, 1.0 / (fan_in.max(1) as f32).sqrt(), rng)
}

/// Normal samples via Box-Muller
pub fn normal<R: Rng>(len: usize, std: f32, rng: &mut R) -> Array1<f32> {
    Array1::from_iter((0..len).map(|_| {
        let u1: f64 = rng.random::<f64>().max(1e-10);
        let u2: f64 = rng.random::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        (z as f32) * std
    }))
}
