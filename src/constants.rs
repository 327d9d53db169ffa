/// Maximum number of polyphonic channels carried by one cable.
pub const MAX_POLY: usize = 16;

/// Samples that share one set of computed coefficients.
pub const BLOCK_SIZE: usize = 8;

/// Lanes per vector.
pub const SIMD_WIDTH: usize = 4;

/// Quad units needed for the stereo-stacked worst case (2 × MAX_POLY lanes).
pub const N_QUAD_UNITS: usize = MAX_POLY * 2 / SIMD_WIDTH;

/// Total lane slots across every quad unit.
pub const N_LANE_SLOTS: usize = N_QUAD_UNITS * SIMD_WIDTH;

pub const N_FILTER_REGISTERS: usize = 16;
pub const N_COEFFS: usize = 8;

/// Longest feedback comb delay in samples.
pub const MAX_FB_COMB: usize = 2048;
/// Taps of the windowed-sinc read kernel used by the comb.
pub const FIR_IPOL_N: usize = 12;
/// Per-lane delay buffer capacity.
pub const DELAY_BUFFER_LEN: usize = MAX_FB_COMB + FIR_IPOL_N;

/// Host voltage (±5 V audio) to internal units.
pub const RACK_TO_INTERNAL: f32 = 1.0 / 5.0;
/// Internal units back to host voltage.
pub const INTERNAL_TO_RACK: f32 = 5.0;

/// Full-scale modulation voltage.
pub const MOD_FULL_SCALE_VOLTS: f32 = 10.0;

pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
