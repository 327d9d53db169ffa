use std::simd::f32x4;

use crate::constants::{DELAY_BUFFER_LEN, N_COEFFS, N_FILTER_REGISTERS, N_QUAD_UNITS, SIMD_WIDTH};

/// Lane mask value for a lane that carries a voice.
pub const LANE_ACTIVE: u32 = 0xFFFF_FFFF;

/// Value copy of a unit's register file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegisterSnapshot([f32x4; N_FILTER_REGISTERS]);

/// Running state of one SIMD group: four lanes of filter memory.
///
/// `c` holds the coefficients the algorithm reads this sample and `dc` the
/// per-sample increment that ramps them towards the block's targets. All
/// recursion lives in `r` or in the lane's delay line.
pub struct QuadFilterUnitState {
    pub c: [f32x4; N_COEFFS],
    pub dc: [f32x4; N_COEFFS],
    pub r: [f32x4; N_FILTER_REGISTERS],
    /// Per-lane write pointer into `delay`.
    pub wp: [usize; SIMD_WIDTH],
    /// Per-lane activity mask, `LANE_ACTIVE` or 0.
    pub active: [u32; SIMD_WIDTH],
    /// Private delay/history buffer, one line per lane.
    pub delay: Box<[[f32; DELAY_BUFFER_LEN]; SIMD_WIDTH]>,
}

impl QuadFilterUnitState {
    pub fn new() -> Self {
        Self {
            c: [f32x4::splat(0.0); N_COEFFS],
            dc: [f32x4::splat(0.0); N_COEFFS],
            r: [f32x4::splat(0.0); N_FILTER_REGISTERS],
            wp: [0; SIMD_WIDTH],
            active: [0; SIMD_WIDTH],
            delay: Box::new([[0.0; DELAY_BUFFER_LEN]; SIMD_WIDTH]),
        }
    }

    /// Zero registers, coefficients, write pointers, lane masks and delay lines.
    pub fn reset(&mut self) {
        self.c.fill(f32x4::splat(0.0));
        self.dc.fill(f32x4::splat(0.0));
        self.r.fill(f32x4::splat(0.0));
        self.wp = [0; SIMD_WIDTH];
        self.active = [0; SIMD_WIDTH];
        for line in self.delay.iter_mut() {
            line.fill(0.0);
        }
    }

    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot(self.r)
    }

    pub fn restore(&mut self, snapshot: &RegisterSnapshot) {
        self.r = snapshot.0;
    }

    /// Run `f` and put the register file back exactly as it was before.
    /// Coefficients and delay lines written by `f` are kept.
    pub fn with_preserved_registers<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let snapshot = self.snapshot();
        let result = f(self);
        self.restore(&snapshot);
        result
    }

    /// Move every coefficient one sample along its ramp.
    #[inline(always)]
    pub fn advance_coefficients(&mut self) {
        for (c, dc) in self.c.iter_mut().zip(self.dc.iter()) {
            *c += *dc;
        }
    }

    #[inline(always)]
    pub fn is_lane_active(&self, lane: usize) -> bool {
        self.active[lane] != 0
    }

    /// Mask with `1.0` in active lanes and `0.0` elsewhere.
    #[inline(always)]
    pub fn active_gain(&self) -> f32x4 {
        f32x4::from_array(self.active.map(|m| if m != 0 { 1.0 } else { 0.0 }))
    }
}

impl Default for QuadFilterUnitState {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena of quad units, sized once for the worst-case polyphony.
pub struct FilterStateStore {
    units: Vec<QuadFilterUnitState>,
}

impl FilterStateStore {
    pub fn new() -> Self {
        Self {
            units: (0..N_QUAD_UNITS).map(|_| QuadFilterUnitState::new()).collect(),
        }
    }

    pub fn reset_all(&mut self) {
        for unit in self.units.iter_mut() {
            unit.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, index: usize) -> &QuadFilterUnitState {
        &self.units[index]
    }

    pub fn unit_mut(&mut self, index: usize) -> &mut QuadFilterUnitState {
        &mut self.units[index]
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut QuadFilterUnitState> {
        self.units.iter_mut()
    }

    /// Mark a lane as carrying a voice.
    pub fn activate_lane(&mut self, group: usize, lane: usize) {
        self.units[group].active[lane] = LANE_ACTIVE;
    }

    /// True when every register of every unit is zero.
    pub fn registers_cleared(&self) -> bool {
        self.units
            .iter()
            .all(|u| u.r.iter().all(|r| r.to_array().iter().all(|v| *v == 0.0)))
    }
}

impl Default for FilterStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_everything() {
        let mut unit = QuadFilterUnitState::new();
        unit.r[3] = f32x4::splat(0.25);
        unit.c[1] = f32x4::splat(2.0);
        unit.dc[1] = f32x4::splat(0.1);
        unit.wp = [5, 6, 7, 8];
        unit.active = [LANE_ACTIVE; 4];
        unit.delay[2][10] = 1.0;

        unit.reset();

        assert_eq!(unit.r[3], f32x4::splat(0.0));
        assert_eq!(unit.c[1], f32x4::splat(0.0));
        assert_eq!(unit.dc[1], f32x4::splat(0.0));
        assert_eq!(unit.wp, [0; 4]);
        assert_eq!(unit.active, [0; 4]);
        assert_eq!(unit.delay[2][10], 0.0);
    }

    #[test]
    fn test_preserved_registers_survive_clobbering() {
        let mut unit = QuadFilterUnitState::new();
        unit.r[0] = f32x4::from_array([1.0, 2.0, 3.0, 4.0]);
        let before = unit.snapshot();

        unit.with_preserved_registers(|u| {
            u.r[0] = f32x4::splat(-9.0);
            u.c[0] = f32x4::splat(0.5);
        });

        assert_eq!(unit.snapshot(), before);
        // coefficient writes are kept
        assert_eq!(unit.c[0], f32x4::splat(0.5));
    }

    #[test]
    fn test_advance_coefficients() {
        let mut unit = QuadFilterUnitState::new();
        unit.c[2] = f32x4::splat(1.0);
        unit.dc[2] = f32x4::splat(0.25);
        unit.advance_coefficients();
        unit.advance_coefficients();
        assert_eq!(unit.c[2], f32x4::splat(1.5));
    }

    #[test]
    fn test_store_is_preallocated() {
        let store = FilterStateStore::new();
        assert_eq!(store.len(), N_QUAD_UNITS);
        assert!(store.registers_cleared());
    }
}
