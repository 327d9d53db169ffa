use serde::{Deserialize, Serialize};

use crate::constants::{BLOCK_SIZE, DEFAULT_SAMPLE_RATE, N_COEFFS, SIMD_WIDTH};
use crate::filter_state::{FilterStateStore, QuadFilterUnitState};
use crate::filters::{biquad, comb, ladder, sample_hold, FilterSelection, FilterType};
use crate::utils::note_to_hz;

const MIN_CUTOFF_HZ: f32 = 5.0;
const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Tuning shared by every coefficient maker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// MIDI note the frequency parameter is relative to.
    #[serde(rename = "referenceNote", default = "default_reference_note")]
    pub reference_note: f32,
    /// Frequency of MIDI note 69.
    #[serde(rename = "tuningFrequency", default = "default_tuning_frequency")]
    pub tuning_frequency: f32,
}

fn default_reference_note() -> f32 {
    69.0
}

fn default_tuning_frequency() -> f32 {
    440.0
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            reference_note: default_reference_note(),
            tuning_frequency: default_tuning_frequency(),
        }
    }
}

impl SharedConfig {
    /// Hz for a semitone offset from the reference note.
    pub fn frequency_for(&self, semitones: f32) -> f32 {
        let reference_hz = note_to_hz(self.reference_note - 69.0, self.tuning_frequency);
        note_to_hz(semitones, reference_hz)
    }
}

/// Per-group coefficient context. Computes block targets and the per-sample
/// ramp that carries the unit's coefficients to them.
#[derive(Clone, Debug)]
pub struct CoefficientMaker {
    /// Coefficient values at the start of the block.
    pub c: [f32; N_COEFFS],
    /// Per-sample increment towards `target`.
    pub dc: [f32; N_COEFFS],
    pub target: [f32; N_COEFFS],
    sample_rate: f32,
    block_size: usize,
    first_run: bool,
}

impl CoefficientMaker {
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        let mut maker = Self {
            c: [0.0; N_COEFFS],
            dc: [0.0; N_COEFFS],
            target: [0.0; N_COEFFS],
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: BLOCK_SIZE,
            first_run: true,
        };
        maker.set_sample_rate_and_block_size(sample_rate, block_size);
        maker
    }

    pub fn set_sample_rate_and_block_size(&mut self, sample_rate: f32, block_size: usize) {
        self.sample_rate = sample_rate.max(1.0);
        self.block_size = block_size.max(1);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    /// Forget everything; the next `make_coeffs` jumps straight to its target.
    pub fn reset(&mut self) {
        self.c = [0.0; N_COEFFS];
        self.dc = [0.0; N_COEFFS];
        self.target = [0.0; N_COEFFS];
        self.first_run = true;
    }

    /// Pick up where the unit's lane 0 ramp ended.
    pub fn load_from(&mut self, unit: &QuadFilterUnitState) {
        for (c, unit_c) in self.c.iter_mut().zip(unit.c.iter()) {
            *c = unit_c[0];
        }
    }

    /// Compute targets for this block and the ramp towards them.
    pub fn make_coeffs(
        &mut self,
        frequency: f32,
        resonance: f32,
        selection: FilterSelection,
        config: &SharedConfig,
    ) {
        let hz = config
            .frequency_for(frequency)
            .clamp(MIN_CUTOFF_HZ, self.sample_rate * MAX_CUTOFF_RATIO);
        let sr = self.sample_rate;

        self.target = match selection.filter_type {
            FilterType::None => [0.0; N_COEFFS],
            FilterType::LpMoog => ladder::coefficients(hz, resonance, sr),
            FilterType::CombPos | FilterType::CombNeg => {
                comb::coefficients(selection, hz, resonance, sr)
            }
            FilterType::SampleAndHold => sample_hold::coefficients(hz, resonance, sr),
            _ => biquad::coefficients(selection, hz, resonance, sr),
        };

        if self.first_run {
            self.c = self.target;
            self.dc = [0.0; N_COEFFS];
        } else {
            let inv_block = 1.0 / self.block_size as f32;
            for i in 0..N_COEFFS {
                self.dc[i] = (self.target[i] - self.c[i]) * inv_block;
            }
        }
    }

    /// Write the ramp into one lane of the unit. On a cold start the lane's
    /// registers are cleared as well.
    pub fn update_state(&mut self, unit: &mut QuadFilterUnitState, lane: usize) {
        for i in 0..N_COEFFS {
            unit.c[i][lane] = self.c[i];
            unit.dc[i][lane] = self.dc[i];
        }
        if self.first_run {
            for r in unit.r.iter_mut() {
                r[lane] = 0.0;
            }
        }
        if lane == SIMD_WIDTH - 1 {
            self.first_run = false;
        }
    }
}

impl Default for CoefficientMaker {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, BLOCK_SIZE)
    }
}

/// Values the scheduler needs for one block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockParameters {
    pub frequency: f32,
    pub resonance: f32,
    pub selection: FilterSelection,
}

/// Recompute every unit's coefficients for the coming block without
/// touching the units' register files.
pub fn schedule_block(
    store: &mut FilterStateStore,
    makers: &mut [CoefficientMaker],
    params: &BlockParameters,
    config: &SharedConfig,
) {
    for (unit, maker) in store.units_mut().zip(makers.iter_mut()) {
        unit.with_preserved_registers(|unit| {
            maker.load_from(unit);
            maker.make_coeffs(params.frequency, params.resonance, params.selection, config);
            for lane in 0..SIMD_WIDTH {
                maker.update_state(unit, lane);
            }
        });
    }
}

/// Current coefficients of one lane.
pub fn lane_coefficients(unit: &QuadFilterUnitState, lane: usize) -> [f32; N_COEFFS] {
    let mut out = [0.0; N_COEFFS];
    for (i, c) in unit.c.iter().enumerate() {
        out[i] = c[lane];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::N_QUAD_UNITS;
    use std::simd::f32x4;

    fn makers() -> Vec<CoefficientMaker> {
        (0..N_QUAD_UNITS)
            .map(|_| CoefficientMaker::new(48_000.0, BLOCK_SIZE))
            .collect()
    }

    fn params(frequency: f32) -> BlockParameters {
        BlockParameters {
            frequency,
            resonance: 0.3,
            selection: FilterSelection::new(FilterType::Lp12, 0),
        }
    }

    #[test]
    fn test_reference_note_is_a440() {
        let config = SharedConfig::default();
        assert!((config.frequency_for(0.0) - 440.0).abs() < 1e-3);
        let shifted = SharedConfig {
            reference_note: 57.0,
            ..SharedConfig::default()
        };
        assert!((shifted.frequency_for(0.0) - 220.0).abs() < 1e-3);
    }

    #[test]
    fn test_first_run_jumps_then_ramps() {
        let config = SharedConfig::default();
        let mut maker = CoefficientMaker::new(48_000.0, BLOCK_SIZE);
        let lp = FilterSelection::new(FilterType::Lp12, 0);

        maker.make_coeffs(0.0, 0.0, lp, &config);
        assert_eq!(maker.c, maker.target);
        assert!(maker.dc.iter().all(|d| *d == 0.0));

        let mut unit = QuadFilterUnitState::new();
        for lane in 0..SIMD_WIDTH {
            maker.update_state(&mut unit, lane);
        }
        assert!(!maker.is_first_run());

        maker.load_from(&unit);
        maker.make_coeffs(12.0, 0.0, lp, &config);
        let start = maker.c;
        let target = maker.target;
        for lane in 0..SIMD_WIDTH {
            maker.update_state(&mut unit, lane);
        }
        for _ in 0..BLOCK_SIZE {
            unit.advance_coefficients();
        }
        let end = lane_coefficients(&unit, 2);
        for i in 0..N_COEFFS {
            assert!((end[i] - target[i]).abs() < 1e-5, "coef {} ended at {}", i, end[i]);
        }
        assert_ne!(start, target);
    }

    #[test]
    fn test_schedule_is_state_transparent() {
        let config = SharedConfig::default();
        let mut store = FilterStateStore::new();
        let mut makers = makers();

        // cold start (would clear registers) with live state present
        for (i, unit) in store.units_mut().enumerate() {
            for (j, r) in unit.r.iter_mut().enumerate() {
                *r = f32x4::splat((i * 16 + j) as f32 * 0.01 + 0.5);
            }
        }
        let before: Vec<_> = (0..store.len()).map(|i| store.unit(i).snapshot()).collect();

        schedule_block(&mut store, &mut makers, &params(0.0), &config);
        schedule_block(&mut store, &mut makers, &params(7.0), &config);

        for (i, snapshot) in before.iter().enumerate() {
            assert_eq!(store.unit(i).snapshot(), *snapshot);
        }
        // coefficients did change
        assert_ne!(store.unit(0).c[0], f32x4::splat(0.0));
    }

    #[test]
    fn test_sample_rate_change_keeps_state() {
        let mut maker = CoefficientMaker::new(48_000.0, BLOCK_SIZE);
        maker.first_run = false;
        maker.c[0] = 0.25;
        maker.set_sample_rate_and_block_size(96_000.0, BLOCK_SIZE);
        assert_eq!(maker.sample_rate(), 96_000.0);
        assert_eq!(maker.c[0], 0.25);
        assert!(!maker.is_first_run());
    }
}
