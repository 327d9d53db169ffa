pub mod math;

pub use math::{fast_tanh, fast_tanh_simd, note_to_hz, normalized_resonance_to_q};
