use std::simd::f32x4;

use super::{biquad, comb, ladder, sample_hold};
use super::{FilterSelection, FilterType, SUBTYPE_DRIVEN};
use crate::filter_state::QuadFilterUnitState;

/// One sample of one quad unit: four lanes in, four lanes out.
pub type FilterUnitFn = fn(&mut QuadFilterUnitState, f32x4) -> f32x4;

/// Resolve a selection to its algorithm. `None` means bypass.
pub fn resolve(selection: FilterSelection) -> Option<FilterUnitFn> {
    let driven = selection.subtype == SUBTYPE_DRIVEN;
    match selection.filter_type {
        FilterType::None => None,
        FilterType::Lp12 | FilterType::Hp12 | FilterType::Bp12 => Some(if driven {
            biquad::process_12_driven
        } else {
            biquad::process_12
        }),
        FilterType::Lp24 | FilterType::Hp24 | FilterType::Bp24 => Some(if driven {
            biquad::process_24_driven
        } else {
            biquad::process_24
        }),
        FilterType::Notch12 | FilterType::Apf => Some(biquad::process_12),
        FilterType::Notch24 => Some(biquad::process_24),
        FilterType::LpMoog => match selection.subtype {
            0 => Some(ladder::process::<1>),
            1 => Some(ladder::process::<2>),
            2 => Some(ladder::process::<3>),
            3 => Some(ladder::process::<4>),
            _ => None,
        },
        FilterType::CombPos | FilterType::CombNeg => Some(comb::process),
        FilterType::SampleAndHold => Some(sample_hold::process),
    }
}

/// Caches the resolved function for the active selection.
#[derive(Default)]
pub struct FilterDispatcher {
    selection: Option<FilterSelection>,
    function: Option<FilterUnitFn>,
}

impl FilterDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `selection` active. Returns true when it differs from the
    /// previous one, in which case the caller must clear filter state.
    pub fn select(&mut self, selection: FilterSelection) -> bool {
        let changed = self.selection != Some(selection);
        if changed {
            self.function = resolve(selection);
        }
        self.selection = Some(selection);
        changed
    }

    pub fn selection(&self) -> Option<FilterSelection> {
        self.selection
    }

    pub fn function(&self) -> Option<FilterUnitFn> {
        self.function
    }

    pub fn is_bypassed(&self) -> bool {
        self.function.is_none()
    }
}
