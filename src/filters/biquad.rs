use std::f32::consts::PI;
use std::simd::f32x4;
use std::simd::num::SimdFloat;
use std::simd::cmp::SimdPartialOrd;
use std::simd::Select;

use super::{FilterSelection, FilterType, SUBTYPE_CLEAN, SUBTYPE_MILD};
use crate::constants::N_COEFFS;
use crate::filter_state::QuadFilterUnitState;
use crate::utils::{fast_tanh_simd, normalized_resonance_to_q};

// Coefficient slots
const B0: usize = 0;
const B1: usize = 1;
const B2: usize = 2;
const A1: usize = 3;
const A2: usize = 4;

// Register slots per stage (Direct Form I)
const X1: usize = 0;
const X2: usize = 1;
const Y1: usize = 2;
const Y2: usize = 3;
const STAGE_STRIDE: usize = 4;

const DRIVE: f32 = 1.5;
const DENORMAL_FLOOR: f32 = 1e-18;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BiquadKind {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    AllPass,
}

impl BiquadKind {
    pub fn for_type(filter_type: FilterType) -> Option<Self> {
        match filter_type {
            FilterType::Lp12 | FilterType::Lp24 => Some(BiquadKind::LowPass),
            FilterType::Hp12 | FilterType::Hp24 => Some(BiquadKind::HighPass),
            FilterType::Bp12 | FilterType::Bp24 => Some(BiquadKind::BandPass),
            FilterType::Notch12 | FilterType::Notch24 => Some(BiquadKind::Notch),
            FilterType::Apf => Some(BiquadKind::AllPass),
            _ => None,
        }
    }
}

/// Normalized `[b0, b1, b2, a1, a2]` from the Audio EQ Cookbook.
pub fn design(kind: BiquadKind, frequency: f32, sample_rate: f32, q: f32) -> [f32; 5] {
    let omega = 2.0 * PI * frequency / sample_rate;
    let sn = omega.sin();
    let cs = omega.cos();
    let alpha = sn / (2.0 * q.max(0.01));

    let (b0, b1, b2, a0, a1, a2) = match kind {
        BiquadKind::LowPass => (
            (1.0 - cs) / 2.0,
            1.0 - cs,
            (1.0 - cs) / 2.0,
            1.0 + alpha,
            -2.0 * cs,
            1.0 - alpha,
        ),
        BiquadKind::HighPass => (
            (1.0 + cs) / 2.0,
            -(1.0 + cs),
            (1.0 + cs) / 2.0,
            1.0 + alpha,
            -2.0 * cs,
            1.0 - alpha,
        ),
        // constant skirt gain, peak gain = Q
        BiquadKind::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cs, 1.0 - alpha),
        BiquadKind::Notch => (1.0, -2.0 * cs, 1.0, 1.0 + alpha, -2.0 * cs, 1.0 - alpha),
        BiquadKind::AllPass => (
            1.0 - alpha,
            -2.0 * cs,
            1.0 + alpha,
            1.0 + alpha,
            -2.0 * cs,
            1.0 - alpha,
        ),
    };

    if a0.abs() > 1e-8 {
        [b0 / a0, b1 / a0, b2 / a0, a1 / a0, a2 / a0]
    } else {
        // pass-through
        [1.0, 0.0, 0.0, 0.0, 0.0]
    }
}

fn q_for(selection: FilterSelection, resonance: f32) -> f32 {
    let r = resonance.clamp(0.0, 1.0);
    match selection.filter_type {
        FilterType::Notch12 | FilterType::Notch24 | FilterType::Apf => {
            if selection.subtype == SUBTYPE_MILD {
                0.35 + r * 2.0
            } else {
                0.5 + r * 6.0
            }
        }
        _ => {
            let q = if selection.subtype == SUBTYPE_CLEAN {
                0.5 + r * 4.5
            } else {
                normalized_resonance_to_q(r)
            };
            if is_cascaded(selection.filter_type) {
                // keep each stage slightly above critical damping
                q.max(0.501)
            } else {
                q
            }
        }
    }
}

fn is_cascaded(filter_type: FilterType) -> bool {
    matches!(
        filter_type,
        FilterType::Lp24 | FilterType::Hp24 | FilterType::Bp24 | FilterType::Notch24
    )
}

/// Target coefficients for a biquad-family selection.
pub fn coefficients(
    selection: FilterSelection,
    frequency: f32,
    resonance: f32,
    sample_rate: f32,
) -> [f32; N_COEFFS] {
    let mut out = [0.0; N_COEFFS];
    let Some(kind) = BiquadKind::for_type(selection.filter_type) else {
        out[B0] = 1.0;
        return out;
    };
    let designed = design(kind, frequency, sample_rate, q_for(selection, resonance));
    out[..5].copy_from_slice(&designed);
    out
}

#[inline(always)]
fn stage(f: &mut QuadFilterUnitState, base: usize, input: f32x4) -> f32x4 {
    let r = &mut f.r[base..base + STAGE_STRIDE];
    let c = &f.c;
    let out = c[B0] * input + c[B1] * r[X1] + c[B2] * r[X2] - c[A1] * r[Y1] - c[A2] * r[Y2];
    let out = out
        .abs()
        .simd_lt(f32x4::splat(DENORMAL_FLOOR))
        .select(f32x4::splat(0.0), out);

    r[X2] = r[X1];
    r[X1] = input;
    r[Y2] = r[Y1];
    r[Y1] = out;
    out
}

#[inline(always)]
fn drive(input: f32x4) -> f32x4 {
    fast_tanh_simd(input * f32x4::splat(DRIVE)) * f32x4::splat(1.0 / DRIVE)
}

pub fn process_12(f: &mut QuadFilterUnitState, input: f32x4) -> f32x4 {
    stage(f, 0, input)
}

pub fn process_12_driven(f: &mut QuadFilterUnitState, input: f32x4) -> f32x4 {
    stage(f, 0, drive(input))
}

pub fn process_24(f: &mut QuadFilterUnitState, input: f32x4) -> f32x4 {
    let first = stage(f, 0, input);
    stage(f, STAGE_STRIDE, first)
}

pub fn process_24_driven(f: &mut QuadFilterUnitState, input: f32x4) -> f32x4 {
    let first = stage(f, 0, drive(input));
    stage(f, STAGE_STRIDE, drive(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn unit_with(coeffs: [f32; N_COEFFS]) -> QuadFilterUnitState {
        let mut unit = QuadFilterUnitState::new();
        for (slot, value) in coeffs.iter().enumerate() {
            unit.c[slot] = f32x4::splat(*value);
        }
        unit
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let sel = FilterSelection::new(FilterType::Lp12, 0);
        let mut unit = unit_with(coefficients(sel, 1000.0, 0.0, SAMPLE_RATE));
        let mut out = f32x4::splat(0.0);
        for _ in 0..4000 {
            out = process_12(&mut unit, f32x4::splat(0.5));
        }
        for v in out.to_array() {
            assert!((v - 0.5).abs() < 1e-3, "dc gain off: {}", v);
        }
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let sel = FilterSelection::new(FilterType::Hp24, 0);
        let mut unit = unit_with(coefficients(sel, 1000.0, 0.2, SAMPLE_RATE));
        let mut out = f32x4::splat(1.0);
        for _ in 0..8000 {
            out = process_24(&mut unit, f32x4::splat(0.5));
        }
        for v in out.to_array() {
            assert!(v.abs() < 1e-3, "dc leaked: {}", v);
        }
    }

    #[test]
    fn test_lanes_are_independent() {
        let sel = FilterSelection::new(FilterType::Lp12, 0);
        let mut unit = unit_with(coefficients(sel, 500.0, 0.5, SAMPLE_RATE));
        for _ in 0..100 {
            let out = process_12(&mut unit, f32x4::from_array([1.0, 0.0, 0.0, 0.0]));
            let lanes = out.to_array();
            assert_eq!(lanes[1], 0.0);
            assert_eq!(lanes[2], 0.0);
            assert_eq!(lanes[3], 0.0);
        }
    }

    #[test]
    fn test_allpass_is_finite_near_nyquist() {
        let c = design(BiquadKind::AllPass, SAMPLE_RATE * 0.49, SAMPLE_RATE, 0.35);
        assert!(c.iter().all(|v| v.is_finite()));
    }
}
