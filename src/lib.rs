#![feature(portable_simd)]

pub mod allocator;
pub mod coefficients;
pub mod constants;
pub mod error;
pub mod filter_state;
pub mod filters;
pub mod params;
pub mod patch;
pub mod ports;
pub mod processor;
pub mod utils;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use allocator::{AllocationTable, LaneAddress, Side, VoiceAllocator};
pub use coefficients::{CoefficientMaker, SharedConfig};
pub use error::{VcfError, VcfResult};
pub use filter_state::{FilterStateStore, QuadFilterUnitState};
pub use filters::{FilterDispatcher, FilterSelection, FilterType};
pub use params::ParamBank;
pub use patch::VcfPatch;
pub use ports::PolyPort;
pub use processor::{ProcessorConfig, VcfProcessor};
pub use utils::*;

#[cfg(feature = "wasm")]
pub use wasm::WasmVcf;
