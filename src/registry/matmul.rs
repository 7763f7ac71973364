//! Matrix-multiply family: id-mode x flavor x type x alignment x B-type.

use super::{Registry, defs, merged};
use crate::model::{Flavor, MatMulIdType, TYPE_NAMES, is_legacy_quant};
use anyhow::Result;

pub fn register_all(reg: &mut Registry) -> Result<()> {
    for id_type in [
        MatMulIdType::None,
        MatMulIdType::Default,
        MatMulIdType::Subgroup,
    ] {
        // Scalar fp32, then fp16 with both accumulator precisions.
        matmul_shaders(reg, false, id_type, false, false, false)?;
        matmul_shaders(reg, true, id_type, false, false, false)?;
        matmul_shaders(reg, true, id_type, false, false, true)?;

        if id_type != MatMulIdType::Default {
            if reg.features.coopmat {
                matmul_shaders(reg, true, id_type, true, false, false)?;
                matmul_shaders(reg, true, id_type, true, false, true)?;
            }
            if reg.features.coopmat2 {
                matmul_shaders(reg, true, id_type, false, true, false)?;
                matmul_shaders(reg, true, id_type, false, true, true)?;
            }
        }
    }
    Ok(())
}

/// Scalar promoted type for target data type `t` under the given flavor.
fn float_type(t: &str, fp16: bool, coopmat: bool, coopmat2: bool) -> &'static str {
    if t == "bf16" {
        // scalar path promotes to float
        if !coopmat && !coopmat2 {
            return "float";
        }
        return "bfloat16_t";
    }
    if coopmat2 || fp16 {
        return "float16_t";
    }
    "float"
}

fn matmul_shaders(
    reg: &mut Registry,
    fp16: bool,
    matmul_id_type: MatMulIdType,
    coopmat: bool,
    coopmat2: bool,
    f16acc: bool,
) -> Result<()> {
    let load_vec = if coopmat2 {
        "1"
    } else if fp16 {
        "8"
    } else {
        "4"
    };
    let aligned_b_type_f32 = if coopmat2 {
        "float"
    } else if fp16 {
        "mat2x4"
    } else {
        "vec4"
    };
    let aligned_b_type_f16 = if coopmat2 {
        "float16_t"
    } else if fp16 {
        "f16mat2x4"
    } else {
        "f16vec4"
    };

    let mut base_dict = defs(&[(
        "FLOAT_TYPE_VEC2",
        if coopmat2 || fp16 { "f16vec2" } else { "vec2" },
    )]);
    let shader_name = match matmul_id_type {
        MatMulIdType::None => "matmul",
        MatMulIdType::Default => {
            base_dict.insert("MUL_MAT_ID".to_string(), "1".to_string());
            "matmul_id"
        }
        MatMulIdType::Subgroup => {
            base_dict.insert("MUL_MAT_ID".to_string(), "1".to_string());
            base_dict.insert("MUL_MAT_ID_USE_SUBGROUPS".to_string(), "1".to_string());
            "matmul_id_subgroup"
        }
    };

    if fp16 {
        base_dict.insert("FLOAT16".to_string(), "1".to_string());
    }

    base_dict.insert(
        "ACC_TYPE".to_string(),
        if f16acc { "float16_t" } else { "float" }.to_string(),
    );
    if f16acc {
        base_dict.insert(
            "ACC_TYPE_MAX".to_string(),
            "\"float16_t(65504.0)\"".to_string(),
        );
    }

    if coopmat {
        base_dict.insert("COOPMAT".to_string(), "1".to_string());
    }

    let source_name = if coopmat2 {
        "mul_mm_cm2.comp"
    } else {
        "mul_mm.comp"
    };

    let flavor = Flavor {
        fp16,
        coopmat,
        coopmat2,
        f16acc,
    };
    let ft = |t: &str| float_type(t, fp16, coopmat, coopmat2);

    // Shaders with f16 B_TYPE
    reg.register_with(
        &format!("{shader_name}_f32_f16"),
        source_name,
        merged(
            &base_dict,
            &[
                ("FLOAT_TYPE", ft("f16")),
                ("DATA_A_F32", "1"),
                ("B_TYPE", "float16_t"),
                ("D_TYPE", "float"),
            ],
        ),
        flavor,
    )?;
    reg.register_with(
        &format!("{shader_name}_f32_f16_aligned"),
        source_name,
        merged(
            &base_dict,
            &[
                ("FLOAT_TYPE", ft("f16")),
                ("DATA_A_F32", "1"),
                ("LOAD_VEC_A", load_vec),
                ("LOAD_VEC_B", load_vec),
                ("B_TYPE", aligned_b_type_f16),
                ("B_TYPE32", aligned_b_type_f32),
                ("D_TYPE", "float"),
                ("ALIGNED", "1"),
            ],
        ),
        flavor,
    )?;

    reg.register_with(
        &format!("{shader_name}_f16_aligned"),
        source_name,
        merged(
            &base_dict,
            &[
                ("FLOAT_TYPE", ft("f16")),
                ("DATA_A_F16", "1"),
                ("LOAD_VEC_A", load_vec),
                ("LOAD_VEC_B", load_vec),
                ("B_TYPE", aligned_b_type_f16),
                ("B_TYPE32", aligned_b_type_f32),
                ("D_TYPE", "float"),
                ("ALIGNED", "1"),
            ],
        ),
        flavor,
    )?;
    reg.register_with(
        &format!("{shader_name}_f16"),
        source_name,
        merged(
            &base_dict,
            &[
                ("FLOAT_TYPE", ft("f16")),
                ("DATA_A_F16", "1"),
                ("B_TYPE", "float16_t"),
                ("D_TYPE", "float"),
            ],
        ),
        flavor,
    )?;

    // bf16 target data. Without glslc bfloat16 support only the scalar
    // (promote to fp32) path compiles.
    if reg.features.bfloat16 || !(coopmat || coopmat2) {
        let load_vec_a_unaligned = "1";
        // For aligned matmul loads
        let load_vec_a = if coopmat2 { "1" } else { "4" };
        let to_float_type = if coopmat || coopmat2 {
            "uintBitsToBFloat16EXT"
        } else {
            "bf16_to_fp32"
        };

        reg.register_with(
            &format!("{shader_name}_bf16_aligned"),
            source_name,
            merged(
                &base_dict,
                &[
                    ("FLOAT_TYPE", ft("bf16")),
                    ("TO_FLOAT_TYPE", to_float_type),
                    ("DATA_A_BF16", "1"),
                    ("LOAD_VEC_A", load_vec_a),
                    ("LOAD_VEC_B", "4"),
                    ("B_TYPE", if coopmat2 { "bfloat16_t" } else { "u16vec4" }),
                    ("B_TYPE32", "vec4"),
                    ("D_TYPE", "float"),
                    ("B_IS_FLOAT", "1"),
                    ("DATA_B_BF16", "1"),
                    ("ALIGNED", "1"),
                ],
            ),
            flavor,
        )?;
        reg.register_with(
            &format!("{shader_name}_bf16"),
            source_name,
            merged(
                &base_dict,
                &[
                    ("FLOAT_TYPE", ft("bf16")),
                    ("TO_FLOAT_TYPE", to_float_type),
                    ("DATA_A_BF16", "1"),
                    ("LOAD_VEC_A", load_vec_a_unaligned),
                    ("B_TYPE", if coopmat2 { "bfloat16_t" } else { "uint16_t" }),
                    ("D_TYPE", "float"),
                    ("B_IS_FLOAT", "1"),
                    ("DATA_B_BF16", "1"),
                ],
            ),
            flavor,
        )?;
    }

    for tname in TYPE_NAMES {
        let tname = *tname;
        if tname == "bf16" {
            continue;
        }

        let load_vec_quant = match tname {
            "q4_0" | "q4_1" | "iq1_s" | "iq1_m" | "iq2_xxs" | "iq2_xs" | "iq2_s" => "8",
            "q5_0" | "q5_1" | "q8_0" | "iq3_xxs" | "iq3_s" | "iq4_nl" | "mxfp4" => "4",
            _ => "2",
        };

        let data_a_key = format!("DATA_A_{}", tname.to_uppercase());
        let float_like = tname == "f32" || tname == "f16";
        // For unaligned, load one at a time for f32/f16, or a full quant
        // block group for quants
        let load_vec_a_unaligned = if coopmat2 || float_like {
            "1"
        } else {
            load_vec_quant
        };
        // For aligned matmul loads
        let load_vec_a = if coopmat2 || float_like {
            load_vec
        } else {
            load_vec_quant
        };

        // don't generate f32 variants for coopmat2
        if !coopmat2 {
            reg.register_with(
                &format!("{shader_name}_{tname}_f32"),
                source_name,
                merged(
                    &base_dict,
                    &[
                        ("FLOAT_TYPE", ft(tname)),
                        (data_a_key.as_str(), "1"),
                        ("LOAD_VEC_A", load_vec_a_unaligned),
                        ("B_TYPE", "float"),
                        ("D_TYPE", "float"),
                    ],
                ),
                flavor,
            )?;
            reg.register_with(
                &format!("{shader_name}_{tname}_f32_aligned"),
                source_name,
                merged(
                    &base_dict,
                    &[
                        ("FLOAT_TYPE", ft(tname)),
                        (data_a_key.as_str(), "1"),
                        ("LOAD_VEC_A", load_vec_a),
                        ("LOAD_VEC_B", load_vec),
                        ("B_TYPE", aligned_b_type_f32),
                        ("B_TYPE32", aligned_b_type_f32),
                        ("D_TYPE", "float"),
                        ("ALIGNED", "1"),
                    ],
                ),
                flavor,
            )?;
        }

        if tname != "f16" && tname != "f32" {
            reg.register_with(
                &format!("{shader_name}_{tname}_f16"),
                source_name,
                merged(
                    &base_dict,
                    &[
                        ("FLOAT_TYPE", ft(tname)),
                        (data_a_key.as_str(), "1"),
                        ("LOAD_VEC_A", load_vec_a_unaligned),
                        ("B_TYPE", "float16_t"),
                        ("D_TYPE", "float"),
                    ],
                ),
                flavor,
            )?;
            reg.register_with(
                &format!("{shader_name}_{tname}_f16_aligned"),
                source_name,
                merged(
                    &base_dict,
                    &[
                        ("FLOAT_TYPE", ft(tname)),
                        (data_a_key.as_str(), "1"),
                        ("LOAD_VEC_A", load_vec_a),
                        ("LOAD_VEC_B", load_vec),
                        ("B_TYPE", aligned_b_type_f16),
                        ("B_TYPE32", aligned_b_type_f32),
                        ("D_TYPE", "float"),
                        ("ALIGNED", "1"),
                    ],
                ),
                flavor,
            )?;
        }

        if reg.features.integer_dot
            && !coopmat
            && !coopmat2
            && matmul_id_type == MatMulIdType::None
            && is_legacy_quant(tname)
        {
            reg.register_with(
                &format!("{shader_name}_{tname}_q8_1"),
                "mul_mmq.comp",
                merged(
                    &base_dict,
                    &[("FLOAT_TYPE", ft(tname)), (data_a_key.as_str(), "1"), ("D_TYPE", "float")],
                ),
                flavor,
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureFlags;
    use crate::model::VariantSpec;
    use std::path::Path;

    fn run(features: FeatureFlags) -> Vec<VariantSpec> {
        let mut reg = Registry::new(features, Path::new("in"), Path::new("out"));
        register_all(&mut reg).expect("matmul catalog");
        reg.into_variants()
    }

    fn find<'a>(variants: &'a [VariantSpec], name: &str) -> &'a VariantSpec {
        variants
            .iter()
            .find(|v| v.name == name)
            .unwrap_or_else(|| panic!("missing variant {name}"))
    }

    #[test]
    fn scalar_fp32_path_gets_suffix_and_vec4_loads() {
        let variants = run(FeatureFlags::default());

        let v = find(&variants, "matmul_f32_f16_aligned_fp32");
        assert_eq!(v.defines["LOAD_VEC_A"], "4");
        assert_eq!(v.defines["LOAD_VEC_B"], "4");
        assert_eq!(v.defines["B_TYPE"], "f16vec4");
        assert_eq!(v.defines["B_TYPE32"], "vec4");
        assert_eq!(v.defines["FLOAT_TYPE"], "float");
    }

    #[test]
    fn fp16_path_uses_wide_loads_and_mat2x4() {
        let variants = run(FeatureFlags::default());

        let v = find(&variants, "matmul_f32_f16_aligned");
        assert_eq!(v.defines["LOAD_VEC_A"], "8");
        assert_eq!(v.defines["B_TYPE"], "f16mat2x4");
        assert_eq!(v.defines["B_TYPE32"], "mat2x4");
        assert_eq!(v.defines["FLOAT_TYPE"], "float16_t");
        assert_eq!(v.defines["FLOAT16"], "1");
    }

    #[test]
    fn quant_load_widths_override_the_base_width() {
        let variants = run(FeatureFlags::default());

        let cases = vec![
            ("matmul_q4_0_f32_aligned", "8"),
            ("matmul_q8_0_f32_aligned", "4"),
            ("matmul_q2_k_f32_aligned", "2"),
            ("matmul_iq2_s_f32_aligned", "8"),
            ("matmul_mxfp4_f32_aligned", "4"),
        ];
        for (name, width) in cases {
            assert_eq!(find(&variants, name).defines["LOAD_VEC_A"], width, "{name}");
        }
        // unaligned quant path keeps the override, float path drops to 1
        assert_eq!(find(&variants, "matmul_q4_0_f32").defines["LOAD_VEC_A"], "8");
        assert_eq!(find(&variants, "matmul_f32_f16").defines.get("LOAD_VEC_A"), None);
    }

    #[test]
    fn id_modes_set_their_defines() {
        let variants = run(FeatureFlags::default());

        let v = find(&variants, "matmul_id_f16");
        assert_eq!(v.defines["MUL_MAT_ID"], "1");
        assert_eq!(v.defines.get("MUL_MAT_ID_USE_SUBGROUPS"), None);

        let v = find(&variants, "matmul_id_subgroup_f16");
        assert_eq!(v.defines["MUL_MAT_ID_USE_SUBGROUPS"], "1");
    }

    #[test]
    fn coopmat_variants_only_outside_default_id_mode() {
        let features = FeatureFlags {
            coopmat: true,
            coopmat2: true,
            ..FeatureFlags::default()
        };
        let variants = run(features);

        assert!(variants.iter().any(|v| v.name == "matmul_f16_cm1"));
        assert!(variants.iter().any(|v| v.name == "matmul_id_subgroup_f16_cm2"));
        assert!(!variants.iter().any(|v| v.name.starts_with("matmul_id_f")
            && (v.name.ends_with("_cm1") || v.name.ends_with("_cm2"))));

        // coopmat2 keeps the f16 B-type group but skips f32 B-type variants
        assert!(variants.iter().any(|v| v.name == "matmul_f32_f16_cm2"));
        assert!(variants.iter().any(|v| v.name == "matmul_q4_0_f16_cm2"));
        assert!(!variants.iter().any(|v| v.name == "matmul_q4_0_f32_cm2"));
    }

    #[test]
    fn f16acc_accumulator_defines() {
        let variants = run(FeatureFlags::default());

        let v = find(&variants, "matmul_f16_f16acc");
        assert_eq!(v.defines["ACC_TYPE"], "float16_t");
        assert_eq!(v.defines["ACC_TYPE_MAX"], "\"float16_t(65504.0)\"");

        let v = find(&variants, "matmul_f16");
        assert_eq!(v.defines["ACC_TYPE"], "float");
        assert_eq!(v.defines.get("ACC_TYPE_MAX"), None);
    }

    #[test]
    fn bf16_scalar_path_promotes_to_float() {
        let variants = run(FeatureFlags::default());

        let v = find(&variants, "matmul_bf16");
        assert_eq!(v.defines["FLOAT_TYPE"], "float");
        assert_eq!(v.defines["TO_FLOAT_TYPE"], "bf16_to_fp32");
        assert_eq!(v.defines["B_TYPE"], "uint16_t");
        assert!(!v.flags.contains(&"-O".to_string()));

        // without bfloat16 support the coopmat flavors skip bf16 entirely
        let features = FeatureFlags {
            coopmat: true,
            ..FeatureFlags::default()
        };
        let variants = run(features);
        assert!(!variants.iter().any(|v| v.name == "matmul_bf16_cm1"));

        let features = FeatureFlags {
            coopmat: true,
            bfloat16: true,
            ..FeatureFlags::default()
        };
        let variants = run(features);
        let v = find(&variants, "matmul_bf16_cm1");
        assert_eq!(v.defines["FLOAT_TYPE"], "bfloat16_t");
        assert_eq!(v.defines["TO_FLOAT_TYPE"], "uintBitsToBFloat16EXT");
    }

    #[test]
    fn integer_dot_adds_q8_1_for_legacy_quants_only() {
        let features = FeatureFlags {
            integer_dot: true,
            ..FeatureFlags::default()
        };
        let variants = run(features);

        for tname in ["q4_0", "q4_1", "q5_0", "q5_1", "q8_0"] {
            let v = find(&variants, &format!("matmul_{tname}_q8_1"));
            assert!(v.template_path.ends_with("mul_mmq.comp"));
        }
        assert!(!variants.iter().any(|v| v.name == "matmul_q2_k_q8_1"));
        assert!(!variants.iter().any(|v| v.name.starts_with("matmul_id") && v.name.ends_with("_q8_1")));
    }
}
