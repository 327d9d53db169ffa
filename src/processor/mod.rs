mod clock;

use log::info;
use serde::{Deserialize, Serialize};
use std::simd::f32x4;

pub use clock::BlockClock;

use crate::allocator::{AllocationTable, Side, VoiceAllocator};
use crate::coefficients::{schedule_block, BlockParameters, CoefficientMaker, SharedConfig};
use crate::constants::{
    BLOCK_SIZE, DEFAULT_SAMPLE_RATE, INTERNAL_TO_RACK, N_LANE_SLOTS, N_QUAD_UNITS,
    RACK_TO_INTERNAL, SIMD_WIDTH,
};
use crate::error::{VcfError, VcfResult};
use crate::filter_state::FilterStateStore;
use crate::filters::{DefaultSubtypes, FilterDispatcher, FilterSelection, FilterType};
use crate::params::{ParamBank, FREQUENCY, IN_GAIN, MIX, N_MOD_INPUTS, OUT_GAIN, RESONANCE};
use crate::ports::{
    PolyPort, INPUT_L, INPUT_R, NUM_INPUTS, NUM_OUTPUTS, OUTPUT_L, OUTPUT_R, VCF_MOD_INPUT,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    #[serde(rename = "sampleRate")]
    pub sample_rate: f32,
    #[serde(default)]
    pub shared: SharedConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            shared: SharedConfig::default(),
        }
    }
}

fn validate_sample_rate(sample_rate: f32) -> VcfResult<f32> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(VcfError::InvalidSampleRate(sample_rate))
    }
}

/// Linear per-sample ramp for block-rate gain values.
#[derive(Clone, Copy, Debug, Default)]
struct GainRamp {
    current: f32,
    delta: f32,
    primed: bool,
}

impl GainRamp {
    fn set_target(&mut self, target: f32, block_size: usize) {
        if self.primed {
            self.delta = (target - self.current) / block_size as f32;
        } else {
            self.current = target;
            self.delta = 0.0;
            self.primed = true;
        }
    }

    #[inline(always)]
    fn value(&self) -> f32 {
        self.current
    }

    #[inline(always)]
    fn advance(&mut self) {
        self.current += self.delta;
    }
}

fn input_for(side: Side) -> usize {
    match side {
        Side::Left => INPUT_L,
        Side::Right => INPUT_R,
    }
}

fn output_for(side: Side) -> usize {
    match side {
        Side::Left => OUTPUT_L,
        Side::Right => OUTPUT_R,
    }
}

/// Polyphonic stereo filter module. Call [`VcfProcessor::process`] once
/// per sample after writing the input ports; read the output ports after.
pub struct VcfProcessor {
    pub params: ParamBank,
    pub inputs: [PolyPort; NUM_INPUTS],
    pub outputs: [PolyPort; NUM_OUTPUTS],

    config: ProcessorConfig,
    store: FilterStateStore,
    makers: Vec<CoefficientMaker>,
    allocator: VoiceAllocator,
    dispatcher: FilterDispatcher,
    default_subtypes: DefaultSubtypes,
    clock: BlockClock,

    in_values: [f32; N_LANE_SLOTS],
    out_values: [f32; N_LANE_SLOTS],
    in_gain: GainRamp,
    mix: GainRamp,
    out_gain: GainRamp,

    reconfigurations: u64,
}

impl VcfProcessor {
    pub fn new(config: ProcessorConfig) -> VcfResult<Self> {
        let sample_rate = validate_sample_rate(config.sample_rate)?;
        info!(
            "creating VCF: {} Hz, block size {}, {} quad units",
            sample_rate, BLOCK_SIZE, N_QUAD_UNITS
        );
        // lookup tables are built here, off the audio path
        crate::utils::math::warm_tables();
        crate::filters::comb::warm_tables();

        Ok(Self {
            params: ParamBank::new(),
            inputs: std::array::from_fn(|_| PolyPort::new()),
            outputs: std::array::from_fn(|_| PolyPort::new()),
            config,
            store: FilterStateStore::new(),
            makers: (0..N_QUAD_UNITS)
                .map(|_| CoefficientMaker::new(sample_rate, BLOCK_SIZE))
                .collect(),
            allocator: VoiceAllocator::new(),
            dispatcher: FilterDispatcher::new(),
            default_subtypes: DefaultSubtypes::new(),
            clock: BlockClock::new(BLOCK_SIZE),
            in_values: [0.0; N_LANE_SLOTS],
            out_values: [0.0; N_LANE_SLOTS],
            in_gain: GainRamp::default(),
            mix: GainRamp::default(),
            out_gain: GainRamp::default(),
            reconfigurations: 0,
        })
    }

    /// Control-path notification. The host must not be running `process`
    /// concurrently. Registers and allocation are left alone.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> VcfResult<()> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        info!(
            "VCF sample rate {} -> {} Hz",
            self.config.sample_rate, sample_rate
        );
        self.config.sample_rate = sample_rate;
        for maker in self.makers.iter_mut() {
            maker.set_sample_rate_and_block_size(sample_rate, BLOCK_SIZE);
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn shared_config(&self) -> &SharedConfig {
        &self.config.shared
    }

    pub fn set_shared_config(&mut self, shared: SharedConfig) {
        self.config.shared = shared;
    }

    /// Selection the current block runs with, `None` before the first sample.
    pub fn active_selection(&self) -> Option<FilterSelection> {
        self.dispatcher.selection()
    }

    pub fn is_bypassed(&self) -> bool {
        self.dispatcher.is_bypassed()
    }

    pub fn default_subtype(&self, filter_type: FilterType) -> u8 {
        self.default_subtypes.get(filter_type)
    }

    pub fn set_default_subtype(&mut self, filter_type: FilterType, subtype: u8) {
        self.default_subtypes
            .remember(FilterSelection::new(filter_type, subtype as i32));
    }

    pub fn default_subtypes(&self) -> &DefaultSubtypes {
        &self.default_subtypes
    }

    pub(crate) fn default_subtypes_mut(&mut self) -> &mut DefaultSubtypes {
        &mut self.default_subtypes
    }

    pub fn allocation(&self) -> &AllocationTable {
        self.allocator.table()
    }

    pub fn filter_state(&self) -> &FilterStateStore {
        &self.store
    }

    /// Number of block-boundary reconfigurations run so far.
    pub fn reconfiguration_count(&self) -> u64 {
        self.reconfigurations
    }

    pub fn clock(&self) -> &BlockClock {
        &self.clock
    }

    /// One output sample for every connected voice.
    pub fn process(&mut self) {
        if self.clock.at_boundary() {
            self.reconfigure();
        }

        self.gather_inputs();
        self.run_filters();
        self.scatter_outputs();

        self.in_gain.advance();
        self.mix.advance();
        self.out_gain.advance();
        self.clock.advance();
    }

    fn reset_filter_state(&mut self) {
        self.store.reset_all();
        self.allocator.activate_lanes(&mut self.store);
        for maker in self.makers.iter_mut() {
            maker.reset();
        }
    }

    fn mod_voltages(&self) -> [f32; N_MOD_INPUTS] {
        std::array::from_fn(|k| self.inputs[VCF_MOD_INPUT + k].voltage(0))
    }

    fn reconfigure(&mut self) {
        let selection = self.params.selection();
        if self.dispatcher.select(selection) {
            self.reset_filter_state();
        }
        self.default_subtypes.remember(selection);

        let left = self.inputs[INPUT_L].polyphony();
        let right = self.inputs[INPUT_R].polyphony();
        if self.allocator.needs_restack(left, right) {
            for (side, poly) in [(Side::Left, left), (Side::Right, right)] {
                let output = &mut self.outputs[output_for(side)];
                output.clear();
                output.connect(poly.unwrap_or(0).max(1));
            }
            self.allocator.restack(left, right, &mut self.store);
            for maker in self.makers.iter_mut() {
                maker.reset();
            }
        }

        let mod_volts = self.mod_voltages();
        let block = BlockParameters {
            frequency: self.params.modulated(FREQUENCY, &mod_volts),
            resonance: self.params.modulated(RESONANCE, &mod_volts),
            selection,
        };
        schedule_block(&mut self.store, &mut self.makers, &block, &self.config.shared);

        self.in_gain
            .set_target(self.params.modulated(IN_GAIN, &mod_volts), BLOCK_SIZE);
        self.mix
            .set_target(self.params.modulated(MIX, &mod_volts), BLOCK_SIZE);
        self.out_gain
            .set_target(self.params.modulated(OUT_GAIN, &mod_volts), BLOCK_SIZE);

        self.reconfigurations += 1;
        self.clock.start_block();
    }

    fn gather_inputs(&mut self) {
        self.in_values = [0.0; N_LANE_SLOTS];
        let table = self.allocator.table();
        for side in Side::BOTH {
            let port = &self.inputs[input_for(side)];
            let poly = self.allocator.polyphony(side).unwrap_or(0);
            for voice in 0..poly {
                if let Some(address) = table.lane(side, voice) {
                    self.in_values[address.slot()] = port.voltage(voice) * RACK_TO_INTERNAL;
                }
            }
        }
    }

    fn run_filters(&mut self) {
        let n_slots = self.allocator.table().n_simd_slots();
        let Some(filter) = self.dispatcher.function() else {
            let n = n_slots * SIMD_WIDTH;
            self.out_values[..n].copy_from_slice(&self.in_values[..n]);
            return;
        };

        let in_gain = f32x4::splat(self.in_gain.value());
        let mix = f32x4::splat(self.mix.value());
        let dry_amount = f32x4::splat(1.0) - mix;
        let out_gain = f32x4::splat(self.out_gain.value());

        for s in 0..n_slots {
            let range = s * SIMD_WIDTH..(s + 1) * SIMD_WIDTH;
            let dry = f32x4::from_slice(&self.in_values[range.clone()]);
            let unit = self.store.unit_mut(s);
            unit.advance_coefficients();
            let wet = filter(unit, dry * in_gain);
            let out = (dry * dry_amount + wet * mix) * out_gain * unit.active_gain();
            out.copy_to_slice(&mut self.out_values[range]);
        }
    }

    fn scatter_outputs(&mut self) {
        let table = self.allocator.table();
        for side in Side::BOTH {
            let port = &mut self.outputs[output_for(side)];
            let poly = self.allocator.polyphony(side).unwrap_or(0);
            for voice in 0..poly {
                if let Some(address) = table.lane(side, voice) {
                    port.set_voltage(self.out_values[address.slot()] * INTERNAL_TO_RACK, voice);
                }
            }
        }
    }

    /// Run a buffer of mono left/right audio through the module, one
    /// channel per side. Unplugs a side whose input slice is empty.
    pub fn process_buffers(
        &mut self,
        input_left: &[f32],
        input_right: &[f32],
        output_left: &mut [f32],
        output_right: &mut [f32],
    ) {
        let frames = output_left.len().min(output_right.len());
        for (port, input) in [(INPUT_L, input_left), (INPUT_R, input_right)] {
            if input.is_empty() {
                self.inputs[port].set_connected(false);
            } else if self.inputs[port].channels() != 1 {
                self.inputs[port].connect(1);
            }
        }

        for i in 0..frames {
            if let Some(v) = input_left.get(i) {
                self.inputs[INPUT_L].set_voltage(*v, 0);
            }
            if let Some(v) = input_right.get(i) {
                self.inputs[INPUT_R].set_voltage(*v, 0);
            }
            self.process();
            output_left[i] = self.outputs[OUTPUT_L].voltage(0);
            output_right[i] = self.outputs[OUTPUT_R].voltage(0);
        }
    }
}
