use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{VcfError, VcfResult};
use crate::params::param_index;
use crate::processor::VcfProcessor;

pub const PATCH_VERSION: i32 = 1;

/// Persisted module state: every parameter slot by name plus the per-type
/// subtype memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcfPatch {
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub params: HashMap<String, f32>,
    #[serde(rename = "defaultSubtypes", default)]
    pub default_subtypes: Vec<u8>,
}

impl VcfPatch {
    pub fn from_json(json: &str) -> VcfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> VcfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl VcfProcessor {
    pub fn to_patch(&self) -> VcfPatch {
        VcfPatch {
            version: PATCH_VERSION,
            params: self
                .params
                .iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            default_subtypes: self.default_subtypes().as_slice().to_vec(),
        }
    }

    /// Load a patch. Nothing is changed unless every name is known and the
    /// version is supported. Takes effect at the next block boundary.
    pub fn apply_patch(&mut self, patch: &VcfPatch) -> VcfResult<()> {
        if patch.version > PATCH_VERSION {
            return Err(VcfError::UnsupportedPatchVersion {
                found: patch.version,
                supported: PATCH_VERSION,
            });
        }

        let mut updates = Vec::with_capacity(patch.params.len());
        for (name, value) in patch.params.iter() {
            let index =
                param_index(name).ok_or_else(|| VcfError::UnknownParameter(name.clone()))?;
            updates.push((index, *value));
        }

        for (index, value) in updates {
            self.params.set(index, value);
        }
        self.default_subtypes_mut().load(&patch.default_subtypes);

        info!(
            "applied VCF patch v{}: {} parameters, {} subtype entries",
            patch.version,
            patch.params.len(),
            patch.default_subtypes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterType;
    use crate::params::{MIX, VCF_TYPE};
    use crate::processor::ProcessorConfig;

    fn processor() -> VcfProcessor {
        VcfProcessor::new(ProcessorConfig::default()).unwrap()
    }

    #[test]
    fn test_patch_restores_parameters_and_subtypes() {
        let mut source = processor();
        source.params.set(MIX, 0.4);
        source.params.set(VCF_TYPE, FilterType::Bp24.index() as f32);
        source.set_default_subtype(FilterType::Hp12, 2);

        let json = source.to_patch().to_json().unwrap();
        let patch = VcfPatch::from_json(&json).unwrap();

        let mut target = processor();
        target.apply_patch(&patch).unwrap();
        assert_eq!(target.params, source.params);
        assert_eq!(target.default_subtype(FilterType::Hp12), 2);
        assert_eq!(target.default_subtype(FilterType::LpMoog), 3);
    }

    #[test]
    fn test_partial_patch_keeps_other_values() {
        let mut vcf = processor();
        let patch = VcfPatch::from_json(r#"{ "version": 1, "params": { "mix": 0.25 } }"#).unwrap();
        vcf.apply_patch(&patch).unwrap();
        assert_eq!(vcf.params.get(MIX), 0.25);
        assert_eq!(vcf.params.filter_type(), FilterType::LpMoog);
        assert_eq!(vcf.default_subtype(FilterType::CombPos), 1);
    }

    #[test]
    fn test_unknown_name_rejects_whole_patch() {
        let mut vcf = processor();
        let mut patch = vcf.to_patch();
        patch.params.insert("mix".to_string(), 0.1);
        patch.params.insert("drive".to_string(), 1.0);

        let err = vcf.apply_patch(&patch).unwrap_err();
        assert!(matches!(err, VcfError::UnknownParameter(name) if name == "drive"));
        assert_eq!(vcf.params.get(MIX), 1.0);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let mut vcf = processor();
        let mut patch = vcf.to_patch();
        patch.version = PATCH_VERSION + 1;
        assert!(matches!(
            vcf.apply_patch(&patch),
            Err(VcfError::UnsupportedPatchVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        assert!(matches!(
            VcfPatch::from_json("{ not json"),
            Err(VcfError::Serialization(_))
        ));
    }
}
