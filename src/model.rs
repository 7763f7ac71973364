//! Core data model: the type catalog, feature gates and the per-variant record.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Every tensor element layout the shader set is specialized for, in the
/// order the registry walks them. The order is part of the output contract:
/// it fixes compile-rule order in the generated build script and the row
/// order of the dequant-mat-vec lookup tables.
pub const TYPE_NAMES: &[&str] = &[
    "f32", "f16", "q4_0", "q4_1", "q5_0", "q5_1", "q8_0", "q2_k", "q3_k", "q4_k", "q5_k", "q6_k",
    "iq1_s", "iq1_m", "iq2_xxs", "iq2_xs", "iq2_s", "iq3_xxs", "iq3_s", "iq4_xs", "iq4_nl",
    "mxfp4", "bf16",
];

pub fn is_quantized_type(type_name: &str) -> bool {
    type_name != "f32" && type_name != "f16" && type_name != "bf16"
}

pub fn is_legacy_quant(type_name: &str) -> bool {
    matches!(type_name, "q4_0" | "q4_1" | "q5_0" | "q5_1" | "q8_0")
}

pub fn is_k_quant(type_name: &str) -> bool {
    type_name.ends_with("_k")
}

pub fn is_iq_quant(type_name: &str) -> bool {
    type_name.starts_with("iq")
}

/// Indirection-by-id mode for the matrix-multiply family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatMulIdType {
    None,
    Default,
    Subgroup,
}

/// What the external glslc build was configured to support. Each gate admits
/// a group of variants but never changes how surviving variants are named.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFlags {
    pub bfloat16: bool,
    pub coopmat: bool,
    pub coopmat2: bool,
    pub integer_dot: bool,
    pub debug_info: bool,
}

impl FeatureFlags {
    /// The gates baked into this build of the generator.
    pub fn from_build() -> Self {
        Self {
            bfloat16: cfg!(feature = "bfloat16"),
            coopmat: cfg!(feature = "coopmat"),
            coopmat2: cfg!(feature = "coopmat2"),
            integer_dot: cfg!(feature = "integer-dot"),
            debug_info: cfg!(feature = "shader-debug-info"),
        }
    }
}

/// Precision / cooperative-matrix flavor bits of one registration.
///
/// `fp16` defaults to true: the bulk of the catalog is registered on the
/// half-precision path and only matmul ever turns it off.
#[derive(Debug, Clone, Copy)]
pub struct Flavor {
    pub fp16: bool,
    pub coopmat: bool,
    pub coopmat2: bool,
    pub f16acc: bool,
}

impl Default for Flavor {
    fn default() -> Self {
        Self {
            fp16: true,
            coopmat: false,
            coopmat2: false,
            f16acc: false,
        }
    }
}

/// Preprocessor defines for one variant. A sorted map: iteration order feeds
/// the compiler command line, so it must be deterministic.
pub type Defines = BTreeMap<String, String>;

/// One fully specialized shader build, immutable once registered.
#[derive(Debug, Clone)]
pub struct VariantSpec {
    /// Unique symbol base, e.g. `matmul_q4_0_f32_aligned_f16acc_cm1`.
    pub name: String,
    /// Shader template under the input directory.
    pub template_path: PathBuf,
    /// Compiled SPIR-V location under the output directory.
    pub output_path: PathBuf,
    pub defines: Defines,
    /// Full glslc flag list: stage, target-env, optimization, debug info,
    /// then one `-D<k>=<v>` per define.
    pub flags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_predicates() {
        let cases = vec![
            ("f32", false, false, false, false),
            ("f16", false, false, false, false),
            ("bf16", false, false, false, false),
            ("q4_0", true, true, false, false),
            ("q8_0", true, true, false, false),
            ("q2_k", true, false, true, false),
            ("q6_k", true, false, true, false),
            ("iq1_s", true, false, false, true),
            ("iq4_nl", true, false, false, true),
            ("mxfp4", true, false, false, false),
        ];

        for (tname, quant, legacy, k, iq) in cases {
            assert_eq!(is_quantized_type(tname), quant, "{tname}");
            assert_eq!(is_legacy_quant(tname), legacy, "{tname}");
            assert_eq!(is_k_quant(tname), k, "{tname}");
            assert_eq!(is_iq_quant(tname), iq, "{tname}");
        }
    }

    #[test]
    fn catalog_is_duplicate_free() {
        let mut seen = std::collections::HashSet::new();
        for tname in TYPE_NAMES {
            assert!(seen.insert(*tname), "duplicate type tag {tname}");
        }
        assert_eq!(TYPE_NAMES.len(), 23);
    }
}
