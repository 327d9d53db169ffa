use once_cell::sync::Lazy;
use std::f32::consts::PI;
use std::simd::f32x4;

const TANH_LUT_SIZE: usize = 1024;
const TANH_X_MIN: f32 = -5.0;
const TANH_X_MAX: f32 = 5.0;

/// Tanh lookup table, linear interpolation between entries.
static TANH_LUT: Lazy<[f32; TANH_LUT_SIZE]> = Lazy::new(|| {
    let mut lut = [0.0; TANH_LUT_SIZE];
    let step = (TANH_X_MAX - TANH_X_MIN) / (TANH_LUT_SIZE - 1) as f32;
    for (i, value) in lut.iter_mut().enumerate() {
        *value = (TANH_X_MIN + i as f32 * step).tanh();
    }
    lut
});

pub(crate) fn warm_tables() {
    Lazy::force(&TANH_LUT);
}

#[inline(always)]
pub fn fast_tanh(x: f32) -> f32 {
    const LAST: usize = TANH_LUT_SIZE - 1;
    const INV_RANGE: f32 = 1.0 / (TANH_X_MAX - TANH_X_MIN);

    let clamped = x.clamp(TANH_X_MIN, TANH_X_MAX);
    let normalized = (clamped - TANH_X_MIN) * INV_RANGE * LAST as f32;
    let index_f = normalized.floor();
    let index = (index_f as usize).min(LAST);
    let frac = normalized - index_f;

    let y0 = TANH_LUT[index];
    if index < LAST {
        y0 + (TANH_LUT[index + 1] - y0) * frac
    } else {
        y0
    }
}

#[inline(always)]
pub fn fast_tanh_simd(x: f32x4) -> f32x4 {
    f32x4::from_array(x.to_array().map(fast_tanh))
}

/// Semitone offset from `reference_note` to Hz.
#[inline]
pub fn note_to_hz(semitones: f32, reference_hz: f32) -> f32 {
    reference_hz * 2f32.powf(semitones / 12.0)
}

/// Map normalized resonance (0–1) onto a biquad Q.
#[inline(always)]
pub fn normalized_resonance_to_q(normalized: f32) -> f32 {
    // 0 -> 0.707, 0.5 -> ~4, 1.0 -> 10
    0.707 + normalized.clamp(0.0, 1.0).powf(1.5) * 9.3
}

/// Blackman-windowed sinc, `half_width` taps either side of zero.
pub fn windowed_sinc(x: f32, half_width: f32) -> f32 {
    if x.abs() >= half_width {
        return 0.0;
    }
    let sinc = if x.abs() < 1e-6 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    };
    let n = (x + half_width) / (2.0 * half_width);
    let window = 0.42 - 0.5 * (2.0 * PI * n).cos() + 0.08 * (4.0 * PI * n).cos();
    sinc * window
}
