//! Flash-attention family: scalar, cooperative-v1 and cooperative-v2
//! templates, each in both accumulator precisions.

use super::{Registry, defs, merged};
use crate::model::{Defines, Flavor, TYPE_NAMES};
use anyhow::Result;

pub fn register_all(reg: &mut Registry) -> Result<()> {
    for f16acc in [false, true] {
        let mut fa_base_dict: Defines = defs(&[("FLOAT_TYPE", "float")]);
        fa_base_dict.insert(
            "ACC_TYPE".to_string(),
            if f16acc { "float16_t" } else { "float" }.to_string(),
        );
        fa_base_dict.insert(
            "ACC_TYPEV4".to_string(),
            if f16acc { "f16vec4" } else { "vec4" }.to_string(),
        );
        if f16acc {
            fa_base_dict.insert(
                "ACC_TYPE_MAX".to_string(),
                "\"float16_t(65504.0)\"".to_string(),
            );
        }

        for tname in TYPE_NAMES {
            let tname = *tname;
            if tname == "f32" || tname == "bf16" {
                continue;
            }
            let name = format!("flash_attn_f32_f16_{tname}");
            let data_a_key = format!("DATA_A_{}", tname.to_uppercase());
            let block_size = format!("QUANT_K_{}", tname.to_uppercase());
            let dequant_func = format!("dequantFunc{}", tname.to_uppercase());

            if reg.features.coopmat2 {
                let flavor = Flavor {
                    coopmat2: true,
                    f16acc,
                    ..Flavor::default()
                };
                if tname == "f16" {
                    reg.register_with(
                        &name,
                        "flash_attn_cm2.comp",
                        merged(&fa_base_dict, &[("Q_TYPE", "float"), ("D_TYPE", "float")]),
                        flavor,
                    )?;
                } else {
                    reg.register_with(
                        &name,
                        "flash_attn_cm2.comp",
                        merged(
                            &fa_base_dict,
                            &[
                                (data_a_key.as_str(), "1"),
                                ("Q_TYPE", "float"),
                                ("D_TYPE", "float"),
                                ("DEQUANTFUNC", dequant_func.as_str()),
                                ("BLOCK_SIZE", block_size.as_str()),
                            ],
                        ),
                        flavor,
                    )?;
                }
            }

            if reg.features.coopmat {
                let flavor = Flavor {
                    coopmat: true,
                    f16acc,
                    ..Flavor::default()
                };
                if tname == "f16" {
                    reg.register_with(
                        &name,
                        "flash_attn_cm1.comp",
                        merged(
                            &fa_base_dict,
                            &[("Q_TYPE", "float"), ("D_TYPE", "float"), ("COOPMAT", "1")],
                        ),
                        flavor,
                    )?;
                } else if tname == "q4_0" || tname == "q8_0" {
                    reg.register_with(
                        &name,
                        "flash_attn_cm1.comp",
                        merged(
                            &fa_base_dict,
                            &[
                                (data_a_key.as_str(), "1"),
                                ("Q_TYPE", "float"),
                                ("D_TYPE", "float"),
                                ("BLOCK_SIZE", block_size.as_str()),
                                ("COOPMAT", "1"),
                            ],
                        ),
                        flavor,
                    )?;
                }
            }

            let flavor = Flavor {
                f16acc,
                ..Flavor::default()
            };
            if tname == "f16" {
                reg.register_with(
                    &name,
                    "flash_attn.comp",
                    merged(&fa_base_dict, &[("Q_TYPE", "float"), ("D_TYPE", "float")]),
                    flavor,
                )?;
            } else if tname == "q4_0" || tname == "q8_0" {
                reg.register_with(
                    &name,
                    "flash_attn.comp",
                    merged(
                        &fa_base_dict,
                        &[
                            (data_a_key.as_str(), "1"),
                            ("Q_TYPE", "float"),
                            ("D_TYPE", "float"),
                            ("BLOCK_SIZE", block_size.as_str()),
                        ],
                    ),
                    flavor,
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureFlags, VariantSpec};
    use std::path::Path;

    fn run(features: FeatureFlags) -> Vec<VariantSpec> {
        let mut reg = Registry::new(features, Path::new("in"), Path::new("out"));
        register_all(&mut reg).expect("flash_attn catalog");
        reg.into_variants()
    }

    #[test]
    fn scalar_template_covers_f16_and_block_quants_only() {
        let variants = run(FeatureFlags::default());

        let names: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();
        assert!(names.contains(&"flash_attn_f32_f16_f16"));
        assert!(names.contains(&"flash_attn_f32_f16_f16_f16acc"));
        assert!(names.contains(&"flash_attn_f32_f16_q4_0"));
        assert!(names.contains(&"flash_attn_f32_f16_q8_0"));
        assert!(!names.iter().any(|n| n.contains("q4_k")));
        assert_eq!(variants.len(), 6);

        let v = variants
            .iter()
            .find(|v| v.name == "flash_attn_f32_f16_q8_0")
            .unwrap();
        assert_eq!(v.defines["BLOCK_SIZE"], "QUANT_K_Q8_0");
        assert_eq!(v.defines["DATA_A_Q8_0"], "1");
    }

    #[test]
    fn coopmat2_covers_every_quant_with_dequant_function() {
        let features = FeatureFlags {
            coopmat2: true,
            ..FeatureFlags::default()
        };
        let variants = run(features);

        let v = variants
            .iter()
            .find(|v| v.name == "flash_attn_f32_f16_q4_k_cm2")
            .expect("cm2 quant variant");
        assert_eq!(v.defines["DEQUANTFUNC"], "dequantFuncQ4_K");
        assert_eq!(v.defines["BLOCK_SIZE"], "QUANT_K_Q4_K");
        assert!(v.flags.contains(&"--target-env=vulkan1.3".to_string()));
        assert!(v.template_path.ends_with("flash_attn_cm2.comp"));

        // f16 cm2 has no dequant machinery
        let v = variants
            .iter()
            .find(|v| v.name == "flash_attn_f32_f16_f16_cm2")
            .unwrap();
        assert_eq!(v.defines.get("DEQUANTFUNC"), None);
    }

    #[test]
    fn coopmat1_sets_coopmat_define_and_drops_opt() {
        let features = FeatureFlags {
            coopmat: true,
            ..FeatureFlags::default()
        };
        let variants = run(features);

        let v = variants
            .iter()
            .find(|v| v.name == "flash_attn_f32_f16_f16_cm1")
            .expect("cm1 variant");
        assert_eq!(v.defines["COOPMAT"], "1");
        assert!(!v.flags.contains(&"-O".to_string()));
        assert!(v.flags.contains(&"--target-env=vulkan1.2".to_string()));
    }

    #[test]
    fn accumulator_precision_defines() {
        let variants = run(FeatureFlags::default());

        let v = variants
            .iter()
            .find(|v| v.name == "flash_attn_f32_f16_f16_f16acc")
            .unwrap();
        assert_eq!(v.defines["ACC_TYPE"], "float16_t");
        assert_eq!(v.defines["ACC_TYPEV4"], "f16vec4");
        assert_eq!(v.defines["ACC_TYPE_MAX"], "\"float16_t(65504.0)\"");

        let v = variants
            .iter()
            .find(|v| v.name == "flash_attn_f32_f16_f16")
            .unwrap();
        assert_eq!(v.defines["ACC_TYPEV4"], "vec4");
    }
}
