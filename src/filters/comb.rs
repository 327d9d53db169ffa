use once_cell::sync::Lazy;
use std::simd::f32x4;

use super::{FilterSelection, FilterType, SUBTYPE_COMB_HALF_WET};
use crate::constants::{FIR_IPOL_N, MAX_FB_COMB, N_COEFFS, SIMD_WIDTH};
use crate::filter_state::QuadFilterUnitState;
use crate::utils::fast_tanh;
use crate::utils::math::windowed_sinc;

// Coefficient slots
const DELAY: usize = 0; // samples, fractional
const FEEDBACK: usize = 1;
const WET: usize = 2;

const HALF_TAPS: usize = FIR_IPOL_N / 2;
const SINC_PHASES: usize = 256;
const MAX_FEEDBACK: f32 = 0.98;

/// Shortest usable delay: the kernel must only touch already written samples.
pub const MIN_DELAY: f32 = FIR_IPOL_N as f32;
pub const MAX_DELAY: f32 = (MAX_FB_COMB - FIR_IPOL_N) as f32;

/// Kernel weights per fractional phase. Row `p` interpolates at
/// `t = p / SINC_PHASES` samples after the base tap.
static SINC_TABLE: Lazy<[[f32; FIR_IPOL_N]; SINC_PHASES + 1]> = Lazy::new(|| {
    let mut table = [[0.0; FIR_IPOL_N]; SINC_PHASES + 1];
    for (phase, row) in table.iter_mut().enumerate() {
        let t = phase as f32 / SINC_PHASES as f32;
        for (j, weight) in row.iter_mut().enumerate() {
            let x = j as f32 - (HALF_TAPS as f32 - 1.0) - t;
            *weight = windowed_sinc(x, HALF_TAPS as f32);
        }
    }
    table
});

/// Build the kernel table now so the audio path never initializes it.
pub(crate) fn warm_tables() {
    Lazy::force(&SINC_TABLE);
}

pub fn coefficients(
    selection: FilterSelection,
    frequency: f32,
    resonance: f32,
    sample_rate: f32,
) -> [f32; N_COEFFS] {
    let mut out = [0.0; N_COEFFS];
    out[DELAY] = (sample_rate / frequency.max(1.0)).clamp(MIN_DELAY, MAX_DELAY);
    let feedback = resonance.clamp(0.0, 1.0) * MAX_FEEDBACK;
    out[FEEDBACK] = if selection.filter_type == FilterType::CombNeg {
        -feedback
    } else {
        feedback
    };
    out[WET] = if selection.subtype == SUBTYPE_COMB_HALF_WET {
        0.5
    } else {
        1.0
    };
    out
}

/// Read the line `delay` samples behind the write pointer.
#[inline]
fn read_delayed(line: &[f32], wp: usize, delay: f32) -> f32 {
    let delay = delay.clamp(MIN_DELAY, MAX_DELAY);
    let d_int = delay.floor() as usize;
    let frac = delay - d_int as f32;
    // position wp - delay lies t = 1 - frac after tap `wp - d_int - 1`
    let t = 1.0 - frac;
    let phase = ((t * SINC_PHASES as f32).round() as usize).min(SINC_PHASES);
    let kernel = &SINC_TABLE[phase];

    let start = (wp + MAX_FB_COMB - d_int - HALF_TAPS) % MAX_FB_COMB;
    line[start..start + FIR_IPOL_N]
        .iter()
        .zip(kernel.iter())
        .map(|(x, w)| x * w)
        .sum()
}

#[inline]
fn write_sample(line: &mut [f32], wp: usize, value: f32) {
    line[wp] = value;
    // mirror the head so kernel reads never wrap
    if wp < FIR_IPOL_N {
        line[wp + MAX_FB_COMB] = value;
    }
}

/// Feedback comb. Each lane runs its own delay line; inactive lanes are
/// skipped and output silence.
pub fn process(f: &mut QuadFilterUnitState, input: f32x4) -> f32x4 {
    let x = input.to_array();
    let delay = f.c[DELAY].to_array();
    let feedback = f.c[FEEDBACK].to_array();
    let wet = f.c[WET].to_array();
    let mut out = [0.0; SIMD_WIDTH];

    for lane in 0..SIMD_WIDTH {
        if !f.is_lane_active(lane) {
            continue;
        }
        let wp = f.wp[lane];
        let line = &mut f.delay[lane];
        let delayed = read_delayed(line, wp, delay[lane]);
        write_sample(line, wp, fast_tanh(x[lane] + feedback[lane] * delayed));
        f.wp[lane] = (wp + 1) % MAX_FB_COMB;
        out[lane] = x[lane] * (1.0 - wet[lane]) + delayed * wet[lane];
    }

    f32x4::from_array(out)
}
