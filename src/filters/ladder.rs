use std::f32::consts::PI;
use std::simd::f32x4;

use crate::constants::N_COEFFS;
use crate::filter_state::QuadFilterUnitState;
use crate::utils::fast_tanh_simd;

// Coefficient slots
const G: usize = 0; // one-pole gain g/(1+g)
const K: usize = 1; // feedback amount
const COMP: usize = 2; // output make-up gain

// Registers 0..4 are the integrator states, 4..8 the stage outputs.
const STAGE_OUT: usize = 4;

const MAX_FEEDBACK: f32 = 3.9;

/// Ladder coefficients. `frequency` must already be clamped below Nyquist.
pub fn coefficients(frequency: f32, resonance: f32, sample_rate: f32) -> [f32; N_COEFFS] {
    let mut out = [0.0; N_COEFFS];
    let g = (PI * frequency / sample_rate).tan();
    let k = resonance.clamp(0.0, 1.0) * MAX_FEEDBACK;
    out[G] = g / (1.0 + g);
    out[K] = k;
    out[COMP] = 1.0 + 0.5 * k;
    out
}

/// Four trapezoidal one-pole stages with saturated global feedback.
/// `POLES` picks the output tap (1 = 6 dB/oct ... 4 = 24 dB/oct).
pub fn process<const POLES: usize>(f: &mut QuadFilterUnitState, input: f32x4) -> f32x4 {
    let g = f.c[G];
    let k = f.c[K];

    let feedback = fast_tanh_simd(f.r[STAGE_OUT + 3]);
    let mut x = input - k * feedback;
    for stage in 0..4 {
        let s = f.r[stage];
        let v = (x - s) * g;
        let y = v + s;
        f.r[stage] = y + v;
        f.r[STAGE_OUT + stage] = y;
        x = y;
    }

    f.r[STAGE_OUT + POLES - 1] * f.c[COMP]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_with(coeffs: [f32; N_COEFFS]) -> QuadFilterUnitState {
        let mut unit = QuadFilterUnitState::new();
        for (slot, value) in coeffs.iter().enumerate() {
            unit.c[slot] = f32x4::splat(*value);
        }
        unit
    }

    #[test]
    fn test_ladder_settles_on_dc() {
        let mut unit = unit_with(coefficients(2000.0, 0.0, 48_000.0));
        let mut out = f32x4::splat(0.0);
        for _ in 0..4000 {
            out = process::<4>(&mut unit, f32x4::splat(0.3));
        }
        for v in out.to_array() {
            assert!((v - 0.3).abs() < 1e-3, "unexpected dc level {}", v);
        }
    }

    #[test]
    fn test_ladder_stays_bounded_at_full_resonance() {
        let mut unit = unit_with(coefficients(1000.0, 1.0, 48_000.0));
        for i in 0..20_000 {
            let x = if i % 100 < 50 { 0.5 } else { -0.5 };
            let out = process::<4>(&mut unit, f32x4::splat(x));
            for v in out.to_array() {
                assert!(v.is_finite() && v.abs() < 50.0);
            }
        }
    }

    #[test]
    fn test_steeper_tap_attenuates_more() {
        let coeffs = coefficients(500.0, 0.0, 48_000.0);
        let mut one = unit_with(coeffs);
        let mut four = unit_with(coeffs);
        let mut energy_one = 0.0;
        let mut energy_four = 0.0;
        for i in 0..4800 {
            // 6 kHz square-ish tone, well above cutoff
            let x = if (i / 4) % 2 == 0 { 0.5 } else { -0.5 };
            energy_one += process::<1>(&mut one, f32x4::splat(x))[0].powi(2);
            energy_four += process::<4>(&mut four, f32x4::splat(x))[0].powi(2);
        }
        assert!(energy_four < energy_one);
    }
}
