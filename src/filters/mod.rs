//! Filter catalogue: the (type, subtype) selection and the per-group
//! algorithms the dispatcher resolves it to.

pub mod biquad;
pub mod comb;
pub mod ladder;
pub mod registry;
pub mod sample_hold;

use serde::{Deserialize, Serialize};

pub use registry::{resolve, FilterDispatcher, FilterUnitFn};

pub const NUM_FILTER_TYPES: usize = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Lp12,
    Lp24,
    Hp12,
    Hp24,
    Bp12,
    Bp24,
    Notch12,
    Notch24,
    Apf,
    LpMoog,
    CombPos,
    CombNeg,
    SampleAndHold,
}

impl FilterType {
    pub const ALL: [FilterType; NUM_FILTER_TYPES] = [
        FilterType::None,
        FilterType::Lp12,
        FilterType::Lp24,
        FilterType::Hp12,
        FilterType::Hp24,
        FilterType::Bp12,
        FilterType::Bp24,
        FilterType::Notch12,
        FilterType::Notch24,
        FilterType::Apf,
        FilterType::LpMoog,
        FilterType::CombPos,
        FilterType::CombNeg,
        FilterType::SampleAndHold,
    ];

    /// Map a host selector value onto a type, clamping out-of-range indices.
    pub fn from_index(index: i32) -> Self {
        let clamped = index.clamp(0, NUM_FILTER_TYPES as i32 - 1) as usize;
        Self::ALL[clamped]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Number of subtypes this type offers; 0 means the subtype is ignored.
    pub fn subtype_count(self) -> usize {
        match self {
            FilterType::None | FilterType::SampleAndHold => 0,
            FilterType::Lp12
            | FilterType::Lp24
            | FilterType::Hp12
            | FilterType::Hp24
            | FilterType::Bp12
            | FilterType::Bp24 => 3,
            FilterType::Notch12 | FilterType::Notch24 | FilterType::Apf => 2,
            FilterType::LpMoog => 4,
            FilterType::CombPos | FilterType::CombNeg => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterType::None => "Off",
            FilterType::Lp12 => "LP 12 dB",
            FilterType::Lp24 => "LP 24 dB",
            FilterType::Hp12 => "HP 12 dB",
            FilterType::Hp24 => "HP 24 dB",
            FilterType::Bp12 => "BP 12 dB",
            FilterType::Bp24 => "BP 24 dB",
            FilterType::Notch12 => "Notch 12 dB",
            FilterType::Notch24 => "Notch 24 dB",
            FilterType::Apf => "Allpass",
            FilterType::LpMoog => "LP Ladder",
            FilterType::CombPos => "Comb +",
            FilterType::CombNeg => "Comb -",
            FilterType::SampleAndHold => "Sample & Hold",
        }
    }

    /// Largest subtype count across the catalogue.
    pub fn max_subtype_count() -> usize {
        Self::ALL
            .iter()
            .map(|t| t.subtype_count())
            .max()
            .unwrap_or(0)
    }
}

/// Subtypes shared by the biquad low/high/band-pass families.
pub const SUBTYPE_STANDARD: u8 = 0;
pub const SUBTYPE_DRIVEN: u8 = 1;
pub const SUBTYPE_CLEAN: u8 = 2;

/// Notch and allpass.
pub const SUBTYPE_MILD: u8 = 1;

/// Comb wet amounts.
pub const SUBTYPE_COMB_HALF_WET: u8 = 0;
pub const SUBTYPE_COMB_FULL_WET: u8 = 1;

/// The active (type, subtype) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    pub filter_type: FilterType,
    pub subtype: u8,
}

impl FilterSelection {
    /// Build a selection from raw selector values, clamping the subtype
    /// into the type's range.
    pub fn new(filter_type: FilterType, subtype: i32) -> Self {
        let count = filter_type.subtype_count() as i32;
        let subtype = if count == 0 {
            0
        } else {
            subtype.clamp(0, count - 1)
        };
        Self {
            filter_type,
            subtype: subtype as u8,
        }
    }

    pub fn from_indices(type_index: i32, subtype: i32) -> Self {
        Self::new(FilterType::from_index(type_index), subtype)
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::new(FilterType::LpMoog, 3)
    }
}

/// Last-used subtype per filter type, offered when a type is reselected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultSubtypes([u8; NUM_FILTER_TYPES]);

impl DefaultSubtypes {
    pub fn new() -> Self {
        let mut table = [0; NUM_FILTER_TYPES];
        table[FilterType::LpMoog.index()] = 3;
        table[FilterType::CombPos.index()] = SUBTYPE_COMB_FULL_WET;
        table[FilterType::CombNeg.index()] = SUBTYPE_COMB_FULL_WET;
        Self(table)
    }

    pub fn get(&self, filter_type: FilterType) -> u8 {
        self.0[filter_type.index()]
    }

    pub fn remember(&mut self, selection: FilterSelection) {
        self.0[selection.filter_type.index()] = selection.subtype;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Load from a persisted list; missing entries keep their current value.
    pub fn load(&mut self, values: &[u8]) {
        for (filter_type, value) in FilterType::ALL.iter().zip(values.iter()) {
            let selection = FilterSelection::new(*filter_type, *value as i32);
            self.remember(selection);
        }
    }
}

impl Default for DefaultSubtypes {
    fn default() -> Self {
        Self::new()
    }
}
