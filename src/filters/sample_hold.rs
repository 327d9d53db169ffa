use std::simd::cmp::SimdPartialOrd;
use std::simd::Select;
use std::simd::f32x4;

use crate::constants::N_COEFFS;
use crate::filter_state::QuadFilterUnitState;

const INCREMENT: usize = 0; // phase increment per sample
const SMOOTH: usize = 1; // one-pole coefficient applied to the held value

const PHASE: usize = 0;
const HELD: usize = 1;
const SMOOTHED: usize = 2;

pub fn coefficients(frequency: f32, resonance: f32, sample_rate: f32) -> [f32; N_COEFFS] {
    let mut out = [0.0; N_COEFFS];
    out[INCREMENT] = (frequency / sample_rate).clamp(0.0, 1.0);
    // higher resonance keeps the steps sharper
    out[SMOOTH] = 0.05 + 0.95 * resonance.clamp(0.0, 1.0);
    out
}

pub fn process(f: &mut QuadFilterUnitState, input: f32x4) -> f32x4 {
    let one = f32x4::splat(1.0);
    let phase = f.r[PHASE] + f.c[INCREMENT];
    let wrapped = phase.simd_ge(one);

    f.r[PHASE] = wrapped.select(phase - one, phase);
    f.r[HELD] = wrapped.select(input, f.r[HELD]);
    f.r[SMOOTHED] += (f.r[HELD] - f.r[SMOOTHED]) * f.c[SMOOTH];
    f.r[SMOOTHED]
}
