//! The variant catalog: a fixed program that enumerates every specialized
//! shader build as a [`VariantSpec`] stream.
//!
//! Registration order is part of the output contract (it becomes compile-rule
//! order in the generated build script), so the family modules run strictly
//! in sequence: matmul, flash attention, the per-type mat-vec block, then
//! everything else.

pub mod flash_attn;
pub mod mat_vec;
pub mod matmul;
pub mod ops;

use crate::model::{Defines, FeatureFlags, Flavor, VariantSpec};
use anyhow::{Result, bail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Registration context threaded through the family modules.
pub struct Registry {
    pub features: FeatureFlags,
    input_dir: PathBuf,
    output_dir: PathBuf,
    variants: Vec<VariantSpec>,
    names: HashSet<String>,
}

impl Registry {
    pub fn new(features: FeatureFlags, input_dir: &Path, output_dir: &Path) -> Self {
        Self {
            features,
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            variants: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Register one variant on the default flavor (plain fp16 path).
    pub fn register(&mut self, name: &str, source: &str, defines: Defines) -> Result<()> {
        self.register_with(name, source, defines, Flavor::default())
    }

    /// Register one variant, deriving the final symbol name and the glslc
    /// command line from the flavor bits.
    pub fn register_with(
        &mut self,
        name: &str,
        source: &str,
        defines: Defines,
        flavor: Flavor,
    ) -> Result<()> {
        let mut name = name.to_string();
        if flavor.f16acc {
            name.push_str("_f16acc");
        }
        if flavor.coopmat {
            name.push_str("_cm1");
        }
        if flavor.coopmat2 {
            name.push_str("_cm2");
        } else if !flavor.fp16 {
            name.push_str("_fp32");
        }

        // A name collision would silently alias two different define sets to
        // one symbol; the catalog must never produce one.
        if !self.names.insert(name.clone()) {
            bail!("duplicate shader variant `{name}`");
        }

        let target_env = if name.contains("_cm2") {
            "--target-env=vulkan1.3"
        } else {
            "--target-env=vulkan1.2"
        };

        let mut flags = vec!["-fshader-stage=compute".to_string(), target_env.to_string()];

        // spirv-opt miscompiles coopmat and bf16 shaders, so those build
        // without -O.
        if !flavor.coopmat && !name.contains("bf16") {
            flags.push("-O".to_string());
        }

        if self.features.debug_info {
            flags.push("-g".to_string());
        }

        for (key, value) in &defines {
            flags.push(format!("-D{key}={value}"));
        }

        self.variants.push(VariantSpec {
            output_path: self.output_dir.join(format!("{name}.spv")),
            template_path: self.input_dir.join(source),
            name,
            defines,
            flags,
        });
        Ok(())
    }

    pub fn into_variants(self) -> Vec<VariantSpec> {
        self.variants
    }
}

/// Build a define map from literal pairs.
pub(crate) fn defs(pairs: &[(&str, &str)]) -> Defines {
    let mut map = Defines::new();
    for (key, value) in pairs {
        map.insert((*key).to_string(), (*value).to_string());
    }
    map
}

/// Merge literal pairs into a base define map. Base entries win on key
/// collision (`std::map::insert` semantics of the build catalog).
pub(crate) fn merged(base: &Defines, pairs: &[(&str, &str)]) -> Defines {
    let mut map = base.clone();
    for (key, value) in pairs {
        map.entry((*key).to_string())
            .or_insert_with(|| (*value).to_string());
    }
    map
}

/// Run the whole catalog and return the variant stream in registration order.
pub fn enumerate(
    features: FeatureFlags,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<VariantSpec>> {
    let mut reg = Registry::new(features, input_dir, output_dir);

    matmul::register_all(&mut reg)?;
    flash_attn::register_all(&mut reg)?;
    mat_vec::register_all(&mut reg)?;
    ops::register_all(&mut reg)?;

    Ok(reg.into_variants())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureFlags;
    use std::path::Path;

    fn test_registry(features: FeatureFlags) -> Registry {
        Registry::new(features, Path::new("in"), Path::new("out"))
    }

    fn all_features() -> FeatureFlags {
        FeatureFlags {
            bfloat16: true,
            coopmat: true,
            coopmat2: true,
            integer_dot: true,
            debug_info: false,
        }
    }

    #[test]
    fn suffixes_compose_in_fixed_order() {
        let cases = vec![
            (Flavor::default(), "base"),
            (
                Flavor {
                    fp16: false,
                    ..Flavor::default()
                },
                "base_fp32",
            ),
            (
                Flavor {
                    f16acc: true,
                    ..Flavor::default()
                },
                "base_f16acc",
            ),
            (
                Flavor {
                    coopmat: true,
                    f16acc: true,
                    ..Flavor::default()
                },
                "base_f16acc_cm1",
            ),
            (
                Flavor {
                    coopmat2: true,
                    f16acc: true,
                    ..Flavor::default()
                },
                "base_f16acc_cm2",
            ),
            (
                Flavor {
                    fp16: false,
                    coopmat2: true,
                    ..Flavor::default()
                },
                "base_cm2",
            ),
        ];

        for (flavor, expected) in cases {
            let mut reg = test_registry(FeatureFlags::default());
            reg.register_with("base", "x.comp", Defines::new(), flavor)
                .unwrap();
            assert_eq!(reg.variants[0].name, expected);
        }
    }

    #[test]
    fn target_env_follows_cm2() {
        let mut reg = test_registry(FeatureFlags::default());
        reg.register("plain", "x.comp", Defines::new()).unwrap();
        reg.register_with(
            "coop",
            "x.comp",
            Defines::new(),
            Flavor {
                coopmat2: true,
                ..Flavor::default()
            },
        )
        .unwrap();

        assert!(
            reg.variants[0]
                .flags
                .contains(&"--target-env=vulkan1.2".to_string())
        );
        assert!(
            reg.variants[1]
                .flags
                .contains(&"--target-env=vulkan1.3".to_string())
        );
    }

    #[test]
    fn optimization_flag_suppressed_for_coopmat_and_bf16() {
        let mut reg = test_registry(FeatureFlags::default());
        reg.register("plain", "x.comp", Defines::new()).unwrap();
        reg.register_with(
            "coop",
            "x.comp",
            Defines::new(),
            Flavor {
                coopmat: true,
                ..Flavor::default()
            },
        )
        .unwrap();
        reg.register("matmul_bf16", "x.comp", Defines::new()).unwrap();

        let has_opt = |v: &VariantSpec| v.flags.iter().any(|f| f == "-O");
        assert!(has_opt(&reg.variants[0]));
        assert!(!has_opt(&reg.variants[1]));
        assert!(!has_opt(&reg.variants[2]));
    }

    #[test]
    fn defines_render_in_sorted_order() {
        let mut reg = test_registry(FeatureFlags::default());
        reg.register(
            "v",
            "x.comp",
            defs(&[("B_TYPE", "float"), ("A_TYPE", "float16_t")]),
        )
        .unwrap();

        let dflags: Vec<&String> = reg.variants[0]
            .flags
            .iter()
            .filter(|f| f.starts_with("-D"))
            .collect();
        assert_eq!(dflags, ["-DA_TYPE=float16_t", "-DB_TYPE=float"]);
    }

    #[test]
    fn debug_info_flag_is_gated() {
        let mut reg = test_registry(FeatureFlags {
            debug_info: true,
            ..FeatureFlags::default()
        });
        reg.register("v", "x.comp", Defines::new()).unwrap();
        assert!(reg.variants[0].flags.contains(&"-g".to_string()));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = test_registry(FeatureFlags::default());
        reg.register("v", "x.comp", Defines::new()).unwrap();
        assert!(reg.register("v", "y.comp", Defines::new()).is_err());
    }

    #[test]
    fn merged_keeps_base_value_on_collision() {
        let base = defs(&[("FLOAT_TYPE", "float")]);
        let out = merged(&base, &[("FLOAT_TYPE", "float16_t"), ("D_TYPE", "float")]);
        assert_eq!(out["FLOAT_TYPE"], "float");
        assert_eq!(out["D_TYPE"], "float");
    }

    #[test]
    fn full_catalog_names_are_unique_and_flags_consistent() {
        let variants =
            enumerate(all_features(), Path::new("in"), Path::new("out")).expect("catalog");
        assert!(variants.len() > 500);

        let mut seen = HashSet::new();
        for v in &variants {
            assert!(seen.insert(v.name.clone()), "duplicate {}", v.name);

            let v12 = v.flags.iter().filter(|f| *f == "--target-env=vulkan1.2").count();
            let v13 = v.flags.iter().filter(|f| *f == "--target-env=vulkan1.3").count();
            assert_eq!(v12 + v13, 1, "{}", v.name);
            assert_eq!(v13 == 1, v.name.contains("_cm2"), "{}", v.name);

            for (key, value) in &v.defines {
                assert!(
                    v.flags.contains(&format!("-D{key}={value}")),
                    "{} missing define flag {key}",
                    v.name
                );
            }
        }
    }

    #[test]
    fn catalog_shrinks_with_features_disabled() {
        let full = enumerate(all_features(), Path::new("in"), Path::new("out")).unwrap();
        let minimal =
            enumerate(FeatureFlags::default(), Path::new("in"), Path::new("out")).unwrap();
        assert!(minimal.len() < full.len());

        // No cooperative-matrix names without the gates.
        assert!(
            minimal
                .iter()
                .all(|v| !v.name.contains("_cm1") && !v.name.contains("_cm2"))
        );
        assert!(minimal.iter().all(|v| !v.name.contains("_q8_1_f32")));
    }
}
