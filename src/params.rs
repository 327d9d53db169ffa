use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::constants::MOD_FULL_SCALE_VOLTS;
use crate::error::{VcfError, VcfResult};
use crate::filters::{FilterSelection, FilterType, NUM_FILTER_TYPES};

pub const N_VCF_PARAMS: usize = 5;
pub const N_MOD_INPUTS: usize = 4;

pub const FREQUENCY: usize = 0;
pub const RESONANCE: usize = 1;
pub const IN_GAIN: usize = 2;
pub const MIX: usize = 3;
pub const OUT_GAIN: usize = 4;
pub const VCF_MOD_PARAM_0: usize = 5;
pub const VCF_TYPE: usize = VCF_MOD_PARAM_0 + N_VCF_PARAMS * N_MOD_INPUTS;
pub const VCF_SUBTYPE: usize = VCF_TYPE + 1;
pub const NUM_PARAMS: usize = VCF_SUBTYPE + 1;

/// Slot of modulation depth `modulator` for `base_param`.
pub fn modulator_index_for(base_param: usize, modulator: usize) -> usize {
    let offset = base_param - FREQUENCY;
    VCF_MOD_PARAM_0 + offset * N_MOD_INPUTS + modulator
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamSpec {
    fn new(name: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            default,
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

const BASE_NAMES: [&str; N_VCF_PARAMS] = ["frequency", "resonance", "in_gain", "mix", "out_gain"];

pub static PARAM_SPECS: Lazy<Vec<ParamSpec>> = Lazy::new(|| {
    let mut specs = Vec::with_capacity(NUM_PARAMS);
    specs.push(ParamSpec::new(BASE_NAMES[FREQUENCY], -60.0, 70.0, 0.0));
    specs.push(ParamSpec::new(
        BASE_NAMES[RESONANCE],
        0.0,
        1.0,
        std::f32::consts::SQRT_2 * 0.5,
    ));
    specs.push(ParamSpec::new(BASE_NAMES[IN_GAIN], 0.0, 2.0, 1.0));
    specs.push(ParamSpec::new(BASE_NAMES[MIX], 0.0, 1.0, 1.0));
    specs.push(ParamSpec::new(BASE_NAMES[OUT_GAIN], 0.0, 2.0, 1.0));
    for base in BASE_NAMES {
        for modulator in 0..N_MOD_INPUTS {
            specs.push(ParamSpec::new(
                format!("{}_mod_{}", base, modulator + 1),
                -1.0,
                1.0,
                0.0,
            ));
        }
    }
    specs.push(ParamSpec::new(
        "vcf_type",
        0.0,
        (NUM_FILTER_TYPES - 1) as f32,
        FilterType::LpMoog.index() as f32,
    ));
    specs.push(ParamSpec::new(
        "vcf_subtype",
        0.0,
        (FilterType::max_subtype_count() - 1) as f32,
        3.0,
    ));
    debug_assert_eq!(specs.len(), NUM_PARAMS);
    specs
});

static PARAM_LOOKUP: Lazy<FxHashMap<&'static str, usize>> = Lazy::new(|| {
    PARAM_SPECS
        .iter()
        .enumerate()
        .map(|(index, spec)| (spec.name.as_str(), index))
        .collect()
});

pub fn param_index(name: &str) -> Option<usize> {
    PARAM_LOOKUP.get(name).copied()
}

/// Current value of every parameter slot.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamBank {
    values: [f32; NUM_PARAMS],
}

impl ParamBank {
    pub fn new() -> Self {
        let mut values = [0.0; NUM_PARAMS];
        for (value, spec) in values.iter_mut().zip(PARAM_SPECS.iter()) {
            *value = spec.default;
        }
        Self { values }
    }

    pub fn get(&self, index: usize) -> f32 {
        self.values[index]
    }

    /// Store a value, clamped to the slot's range.
    pub fn set(&mut self, index: usize, value: f32) {
        self.values[index] = PARAM_SPECS[index].clamp(value);
    }

    pub fn get_by_name(&self, name: &str) -> VcfResult<f32> {
        param_index(name)
            .map(|index| self.values[index])
            .ok_or_else(|| VcfError::UnknownParameter(name.to_string()))
    }

    pub fn set_by_name(&mut self, name: &str, value: f32) -> VcfResult<()> {
        let index =
            param_index(name).ok_or_else(|| VcfError::UnknownParameter(name.to_string()))?;
        self.set(index, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        PARAM_SPECS
            .iter()
            .zip(self.values.iter())
            .map(|(spec, value)| (spec.name.as_str(), *value))
    }

    pub fn filter_type(&self) -> FilterType {
        FilterType::from_index(self.values[VCF_TYPE].round() as i32)
    }

    /// Type and subtype selectors, subtype clamped into the type's range.
    pub fn selection(&self) -> FilterSelection {
        FilterSelection::new(self.filter_type(), self.values[VCF_SUBTYPE].round() as i32)
    }

    /// Base value of one of the first five parameters plus the modulation
    /// contributed by `mod_volts`, clamped to the parameter's range.
    pub fn modulated(&self, base_param: usize, mod_volts: &[f32; N_MOD_INPUTS]) -> f32 {
        let spec = &PARAM_SPECS[base_param];
        let range = spec.max - spec.min;
        let offset: f32 = mod_volts
            .iter()
            .enumerate()
            .map(|(k, volts)| {
                self.values[modulator_index_for(base_param, k)] * (volts / MOD_FULL_SCALE_VOLTS)
            })
            .sum();
        spec.clamp(self.values[base_param] + offset * range)
    }
}

impl Default for ParamBank {
    fn default() -> Self {
        Self::new()
    }
}
