use wasm_bindgen::prelude::*;

use crate::error::VcfError;
use crate::filters::FilterType;
use crate::patch::VcfPatch;
use crate::processor::{ProcessorConfig, VcfProcessor};

fn to_js(err: VcfError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Stereo VCF for an audio worklet: one mono channel per side.
#[wasm_bindgen]
pub struct WasmVcf {
    processor: VcfProcessor,
}

#[wasm_bindgen]
impl WasmVcf {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f32) -> Result<WasmVcf, JsValue> {
        let config = ProcessorConfig {
            sample_rate,
            ..ProcessorConfig::default()
        };
        let processor = VcfProcessor::new(config).map_err(to_js)?;
        Ok(WasmVcf { processor })
    }

    #[wasm_bindgen(js_name = "setParam")]
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<(), JsValue> {
        self.processor.params.set_by_name(name, value).map_err(to_js)
    }

    #[wasm_bindgen(js_name = "getParam")]
    pub fn get_param(&self, name: &str) -> Result<f32, JsValue> {
        self.processor.params.get_by_name(name).map_err(to_js)
    }

    #[wasm_bindgen(js_name = "setSampleRate")]
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), JsValue> {
        self.processor.set_sample_rate(sample_rate).map_err(to_js)
    }

    #[wasm_bindgen(js_name = "filterTypeName")]
    pub fn filter_type_name(&self) -> String {
        self.processor.params.filter_type().name().to_string()
    }

    #[wasm_bindgen(js_name = "defaultSubtype")]
    pub fn default_subtype(&self, type_index: i32) -> u8 {
        self.processor
            .default_subtype(FilterType::from_index(type_index))
    }

    /// Filter one render quantum. An empty right input runs mono.
    #[wasm_bindgen(js_name = "processBlock")]
    pub fn process_block(
        &mut self,
        input_left: &[f32],
        input_right: &[f32],
        output_left: &mut [f32],
        output_right: &mut [f32],
    ) {
        self.processor
            .process_buffers(input_left, input_right, output_left, output_right);
    }

    #[wasm_bindgen(js_name = "getState")]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.processor.to_patch())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize state: {}", e)))
    }

    #[wasm_bindgen(js_name = "loadState")]
    pub fn load_state(&mut self, state: JsValue) -> Result<(), JsValue> {
        let patch: VcfPatch = serde_wasm_bindgen::from_value(state)
            .map_err(|e| JsValue::from_str(&format!("Invalid VCF state: {}", e)))?;
        self.processor.apply_patch(&patch).map_err(to_js)
    }
}
