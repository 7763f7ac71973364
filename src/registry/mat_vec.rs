//! Matrix-vector family, plus the per-type dequant and get-rows variants
//! that ride along in the same type loop.

use super::{Registry, defs, merged};
use crate::model::{TYPE_NAMES, is_k_quant, is_legacy_quant};
use anyhow::Result;

pub fn register_all(reg: &mut Registry) -> Result<()> {
    let base_dict = defs(&[("FLOAT_TYPE", "float")]);

    for tname in TYPE_NAMES {
        let tname = *tname;
        let data_a_key = format!("DATA_A_{}", tname.to_uppercase());
        let data_a = data_a_key.as_str();

        // K-quants and the multi-block iq layouts each have a dedicated
        // template; everything else shares the generic one.
        let shader = if is_k_quant(tname)
            || tname.starts_with("iq1_")
            || tname.starts_with("iq2_")
            || tname.starts_with("iq3_")
        {
            format!("mul_mat_vec_{tname}.comp")
        } else {
            "mul_mat_vec.comp".to_string()
        };

        reg.register(
            &format!("mul_mat_vec_{tname}_f32_f32"),
            &shader,
            merged(
                &base_dict,
                &[
                    (data_a, "1"),
                    ("B_TYPE", "float"),
                    ("B_TYPE_VEC2", "vec2"),
                    ("B_TYPE_VEC4", "vec4"),
                    ("D_TYPE", "float"),
                ],
            ),
        )?;
        reg.register(
            &format!("mul_mat_vec_{tname}_f16_f32"),
            &shader,
            merged(
                &base_dict,
                &[
                    (data_a, "1"),
                    ("B_TYPE", "float16_t"),
                    ("B_TYPE_VEC2", "f16vec2"),
                    ("B_TYPE_VEC4", "f16vec4"),
                    ("D_TYPE", "float"),
                ],
            ),
        )?;

        reg.register(
            &format!("mul_mat_vec_{tname}_f32_f32_subgroup"),
            &shader,
            merged(
                &base_dict,
                &[
                    (data_a, "1"),
                    ("B_TYPE", "float"),
                    ("B_TYPE_VEC2", "vec2"),
                    ("B_TYPE_VEC4", "vec4"),
                    ("D_TYPE", "float"),
                    ("USE_SUBGROUP_ADD", "1"),
                ],
            ),
        )?;
        reg.register(
            &format!("mul_mat_vec_{tname}_f16_f32_subgroup"),
            &shader,
            merged(
                &base_dict,
                &[
                    (data_a, "1"),
                    ("B_TYPE", "float16_t"),
                    ("B_TYPE_VEC2", "f16vec2"),
                    ("B_TYPE_VEC4", "f16vec4"),
                    ("D_TYPE", "float"),
                    ("USE_SUBGROUP_ADD", "1"),
                ],
            ),
        )?;

        reg.register(
            &format!("mul_mat_vec_{tname}_f32_f32_subgroup_no_shmem"),
            &shader,
            merged(
                &base_dict,
                &[
                    (data_a, "1"),
                    ("B_TYPE", "float"),
                    ("B_TYPE_VEC2", "vec2"),
                    ("B_TYPE_VEC4", "vec4"),
                    ("D_TYPE", "float"),
                    ("USE_SUBGROUP_ADD_NO_SHMEM", "1"),
                ],
            ),
        )?;
        reg.register(
            &format!("mul_mat_vec_{tname}_f16_f32_subgroup_no_shmem"),
            &shader,
            merged(
                &base_dict,
                &[
                    (data_a, "1"),
                    ("B_TYPE", "float16_t"),
                    ("B_TYPE_VEC2", "f16vec2"),
                    ("B_TYPE_VEC4", "f16vec4"),
                    ("D_TYPE", "float"),
                    ("USE_SUBGROUP_ADD_NO_SHMEM", "1"),
                ],
            ),
        )?;

        reg.register(
            &format!("mul_mat_vec_id_{tname}_f32"),
            &shader,
            merged(
                &base_dict,
                &[
                    ("MUL_MAT_ID", "1"),
                    (data_a, "1"),
                    ("B_TYPE", "float"),
                    ("B_TYPE_VEC2", "vec2"),
                    ("B_TYPE_VEC4", "vec4"),
                    ("D_TYPE", "float"),
                ],
            ),
        )?;

        // mul mat vec with integer dot product
        if reg.features.integer_dot && is_legacy_quant(tname) {
            reg.register(
                &format!("mul_mat_vec_{tname}_q8_1_f32"),
                "mul_mat_vecq.comp",
                merged(
                    &base_dict,
                    &[
                        (data_a, "1"),
                        ("D_TYPE", "float"),
                        ("FLOAT_TYPE", "float"),
                        ("FLOAT_TYPE_VEC2", "vec2"),
                        ("ACC_TYPE", "float"),
                    ],
                ),
            )?;
            reg.register(
                &format!("mul_mat_vec_{tname}_q8_1_f32_subgroup"),
                "mul_mat_vecq.comp",
                merged(
                    &base_dict,
                    &[
                        (data_a, "1"),
                        ("D_TYPE", "float"),
                        ("FLOAT_TYPE", "float"),
                        ("FLOAT_TYPE_VEC2", "vec2"),
                        ("ACC_TYPE", "float"),
                        ("USE_SUBGROUP_ADD", "1"),
                    ],
                ),
            )?;
            reg.register(
                &format!("mul_mat_vec_{tname}_q8_1_f32_subgroup_no_shmem"),
                "mul_mat_vecq.comp",
                merged(
                    &base_dict,
                    &[
                        (data_a, "1"),
                        ("D_TYPE", "float"),
                        ("FLOAT_TYPE", "float"),
                        ("FLOAT_TYPE_VEC2", "vec2"),
                        ("ACC_TYPE", "float"),
                        ("USE_SUBGROUP_ADD_NO_SHMEM", "1"),
                    ],
                ),
            )?;
        }

        // Dequant shaders
        if tname != "f16" && tname != "bf16" {
            reg.register(
                &format!("dequant_{tname}"),
                &format!("dequant_{tname}.comp"),
                merged(&base_dict, &[(data_a, "1"), ("D_TYPE", "float16_t")]),
            )?;
        }

        if !is_k_quant(tname) {
            let shader = if tname == "f32" || tname == "f16" || tname == "bf16" {
                "get_rows.comp"
            } else {
                "get_rows_quant.comp"
            };

            if tname == "f16" {
                reg.register(
                    &format!("get_rows_{tname}"),
                    shader,
                    merged(
                        &base_dict,
                        &[
                            (data_a, "1"),
                            ("B_TYPE", "int"),
                            ("D_TYPE", "float16_t"),
                            ("OPTIMIZATION_ERROR_WORKAROUND", "1"),
                        ],
                    ),
                )?;
            } else {
                reg.register(
                    &format!("get_rows_{tname}"),
                    shader,
                    merged(
                        &base_dict,
                        &[(data_a, "1"), ("B_TYPE", "int"), ("D_TYPE", "float16_t")],
                    ),
                )?;
            }
            reg.register(
                &format!("get_rows_{tname}_f32"),
                shader,
                merged(
                    &base_dict,
                    &[(data_a, "1"), ("B_TYPE", "int"), ("D_TYPE", "float")],
                ),
            )?;
        }
    }

    // Permuted / non-contiguous f16 mat-vec specials.
    reg.register(
        "mul_mat_vec_p021_f16_f32_subgroup_add",
        "mul_mat_vec_p021.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("A_TYPE_VEC4", "f16vec4"),
            ("B_TYPE", "float"),
            ("B_TYPE_VEC4", "vec4"),
            ("D_TYPE", "float"),
            ("USE_SUBGROUP_ADD", "1"),
        ]),
    )?;
    reg.register(
        "mul_mat_vec_p021_f16_f32",
        "mul_mat_vec_p021.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("A_TYPE_VEC4", "f16vec4"),
            ("B_TYPE", "float"),
            ("B_TYPE_VEC4", "vec4"),
            ("D_TYPE", "float"),
        ]),
    )?;
    reg.register(
        "mul_mat_vec_nc_f16_f32",
        "mul_mat_vec_nc.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("A_TYPE_VEC4", "f16vec4"),
            ("B_TYPE", "float"),
            ("B_TYPE_VEC4", "vec4"),
            ("D_TYPE", "float"),
        ]),
    )?;

    Ok(())
}
