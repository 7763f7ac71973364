//! The long tail of the catalog: norms, copies, element-wise ops,
//! activations, rope, reductions, convolutions and the optimizer steps.

use super::{Registry, defs, merged};
use crate::model::Flavor;
use anyhow::Result;

fn type_str(f16: bool) -> &'static str {
    if f16 { "float16_t" } else { "float" }
}

fn half_suffix(f16: bool) -> &'static str {
    if f16 { "_f16" } else { "_f32" }
}

pub fn register_all(reg: &mut Registry) -> Result<()> {
    let base_dict = defs(&[("FLOAT_TYPE", "float")]);

    // Norms
    reg.register(
        "norm_f32",
        "norm.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "group_norm_f32",
        "group_norm.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "rms_norm_f32",
        "rms_norm.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        ),
    )?;
    reg.register(
        "rms_norm_partials_f32",
        "rms_norm_partials.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        ),
    )?;
    reg.register(
        "rms_norm_back_f32",
        "rms_norm_back.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        ),
    )?;
    reg.register(
        "l2_norm_f32",
        "l2_norm.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    // Copies. The f16-source ones carry the miscompilation workaround.
    reg.register(
        "cpy_f32_f32",
        "copy.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "cpy_f32_f16",
        "copy.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float16_t")]),
    )?;
    reg.register(
        "cpy_f16_f16",
        "copy.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("D_TYPE", "float16_t"),
            ("OPTIMIZATION_ERROR_WORKAROUND", "1"),
        ]),
    )?;
    reg.register(
        "cpy_f16_f32",
        "copy.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("D_TYPE", "float"),
            ("OPTIMIZATION_ERROR_WORKAROUND", "1"),
        ]),
    )?;
    reg.register(
        "cpy_f32_bf16",
        "copy.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("D_TYPE", "uint16_t"),
            ("DATA_D_BF16", "1"),
        ]),
    )?;
    reg.register(
        "contig_cpy_f32_f32",
        "contig_copy.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "contig_cpy_f32_i32",
        "contig_copy.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "int")]),
    )?;
    reg.register(
        "contig_cpy_i32_f32",
        "contig_copy.comp",
        defs(&[("A_TYPE", "int"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "contig_cpy_f32_f16",
        "contig_copy.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float16_t")]),
    )?;
    reg.register(
        "contig_cpy_f16_f16",
        "contig_copy.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("D_TYPE", "float16_t"),
            ("OPTIMIZATION_ERROR_WORKAROUND", "1"),
        ]),
    )?;
    reg.register(
        "contig_cpy_f16_f32",
        "contig_copy.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("D_TYPE", "float"),
            ("OPTIMIZATION_ERROR_WORKAROUND", "1"),
        ]),
    )?;
    reg.register(
        "contig_cpy_f32_bf16",
        "contig_copy.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("D_TYPE", "uint16_t"),
            ("DATA_D_BF16", "1"),
        ]),
    )?;
    reg.register(
        "cpy_f32_i32",
        "copy.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "int")]),
    )?;
    reg.register(
        "cpy_i32_f32",
        "copy.comp",
        defs(&[("A_TYPE", "int"), ("D_TYPE", "float")]),
    )?;

    // Quantizing and dequantizing copies for the block formats that support
    // in-place conversion.
    for t in ["q4_0", "q4_1", "q5_0", "q5_1", "q8_0", "iq4_nl"] {
        let data_a_key = format!("DATA_A_{}", t.to_uppercase());
        let data_a = data_a_key.as_str();
        reg.register(
            &format!("cpy_f32_{t}"),
            "copy_to_quant.comp",
            defs(&[(data_a, "1"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
        )?;
        reg.register(
            &format!("cpy_f32_{t}_rte"),
            "copy_to_quant.comp",
            defs(&[
                (data_a, "1"),
                ("D_TYPE", "float"),
                ("FLOAT_TYPE", "float"),
                ("RTE16", "1"),
            ]),
        )?;
        reg.register(
            &format!("cpy_{t}_f32"),
            "copy_from_quant.comp",
            defs(&[(data_a, "1"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
        )?;
    }

    for t in [
        "f32", "f16", "bf16", "q4_0", "q4_1", "q5_0", "q5_1", "q8_0", "iq4_nl",
    ] {
        let data_a_key = format!("DATA_A_{}", t.to_uppercase());
        let data_a = data_a_key.as_str();
        reg.register(
            &format!("set_rows_{t}"),
            "copy_to_quant.comp",
            defs(&[
                ("SET_ROWS", "1"),
                (data_a, "1"),
                ("B_TYPE", "uvec2"),
                ("D_TYPE", "float"),
                ("FLOAT_TYPE", "float"),
            ]),
        )?;
        reg.register(
            &format!("set_rows_{t}_rte"),
            "copy_to_quant.comp",
            defs(&[
                ("SET_ROWS", "1"),
                (data_a, "1"),
                ("B_TYPE", "uvec2"),
                ("D_TYPE", "float"),
                ("FLOAT_TYPE", "float"),
                ("RTE16", "1"),
            ]),
        )?;
    }

    // Binary arithmetic: full precision cross product, each with and without
    // round-to-even conversion.
    for op in ["add", "sub", "mul", "div", "add_rms"] {
        for src0_f16 in [false, true] {
            for src1_f16 in [false, true] {
                for dst_f16 in [false, true] {
                    for rte in [false, true] {
                        let source = if op == "add_rms" { "add" } else { op };
                        let name = format!(
                            "{op}{}{}{}{}",
                            half_suffix(src0_f16),
                            half_suffix(src1_f16),
                            half_suffix(dst_f16),
                            if rte { "_rte" } else { "" }
                        );
                        reg.register(
                            &name,
                            &format!("{source}.comp"),
                            defs(&[
                                ("A_TYPE", type_str(src0_f16)),
                                ("B_TYPE", type_str(src1_f16)),
                                ("D_TYPE", type_str(dst_f16)),
                                ("FLOAT_TYPE", "float"),
                                ("RTE16", if rte { "1" } else { "0" }),
                                ("ADD_RMS", if op == "add_rms" { "1" } else { "0" }),
                            ]),
                        )?;
                    }
                }
            }
        }
    }

    reg.register(
        "sub_f32",
        "sub.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
        ]),
    )?;

    reg.register(
        "acc_f32",
        "acc.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
        ]),
    )?;

    reg.register("split_k_reduce", "mul_mat_split_k_reduce.comp", defs(&[]))?;
    reg.register("fa_split_k_reduce", "flash_attn_split_k_reduce.comp", defs(&[]))?;

    reg.register("quantize_q8_1", "quantize_q8_1.comp", defs(&[]))?;
    reg.register(
        "quantize_q8_1_subgroup",
        "quantize_q8_1.comp",
        defs(&[("USE_SUBGROUPS", "1")]),
    )?;

    reg.register(
        "quantize_q8_1_x4",
        "quantize_q8_1.comp",
        defs(&[("QBLOCK_X4", "1")]),
    )?;
    reg.register(
        "quantize_q8_1_x4_subgroup",
        "quantize_q8_1.comp",
        defs(&[("QBLOCK_X4", "1"), ("USE_SUBGROUPS", "1")]),
    )?;

    reg.register(
        "mul_f32",
        "mul.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
        ]),
    )?;

    reg.register(
        "div_f32",
        "div.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
        ]),
    )?;

    reg.register(
        "repeat_f32",
        "repeat.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "repeat_back_f32",
        "repeat_back.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "scale_f32",
        "scale.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
    )?;

    reg.register(
        "sqr_f32",
        "square.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
    )?;

    reg.register(
        "sqrt_f32",
        "sqrt.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
    )?;

    reg.register(
        "sin_f32",
        "sin.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
    )?;

    reg.register(
        "cos_f32",
        "cos.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
    )?;

    reg.register(
        "clamp_f32",
        "clamp.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float"), ("FLOAT_TYPE", "float")]),
    )?;

    reg.register(
        "pad_f32",
        "pad.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "concat_f32",
        "concat.comp",
        defs(&[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "concat_f16",
        "concat.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("B_TYPE", "float16_t"),
            ("D_TYPE", "float16_t"),
            ("OPTIMIZATION_ERROR_WORKAROUND", "1"),
        ]),
    )?;
    reg.register(
        "concat_i32",
        "concat.comp",
        defs(&[("A_TYPE", "int"), ("B_TYPE", "int"), ("D_TYPE", "int")]),
    )?;

    reg.register(
        "upscale_f32",
        "upscale.comp",
        defs(&[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    // Unary activations in both precisions.
    for (name, source) in [
        ("exp", "exp.comp"),
        ("gelu", "gelu.comp"),
        ("gelu_erf", "gelu_erf.comp"),
        ("gelu_quick", "gelu_quick.comp"),
        ("silu", "silu.comp"),
        ("relu", "relu.comp"),
        ("tanh", "tanh.comp"),
        ("sigmoid", "sigmoid.comp"),
        ("hardsigmoid", "hardsigmoid.comp"),
        ("hardswish", "hardswish.comp"),
    ] {
        reg.register(
            &format!("{name}_f16"),
            source,
            defs(&[("A_TYPE", "float16_t"), ("D_TYPE", "float16_t")]),
        )?;
        reg.register(
            &format!("{name}_f32"),
            source,
            defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
        )?;
    }

    // Gated activations, both precisions, both rounding modes.
    for rte in [false, true] {
        let suffix = if rte { "_rte" } else { "" };
        let rte16 = if rte { "1" } else { "0" };
        for (name, source) in [
            ("geglu", "geglu.comp"),
            ("reglu", "reglu.comp"),
            ("swiglu", "swiglu.comp"),
            ("swiglu_oai", "swiglu_oai.comp"),
            ("geglu_erf", "geglu_erf.comp"),
            ("geglu_quick", "geglu_quick.comp"),
        ] {
            reg.register(
                &format!("{name}_f16{suffix}"),
                source,
                defs(&[
                    ("A_TYPE", "float16_t"),
                    ("D_TYPE", "float16_t"),
                    ("RTE16", rte16),
                ]),
            )?;
            reg.register(
                &format!("{name}_f32{suffix}"),
                source,
                defs(&[("A_TYPE", "float"), ("D_TYPE", "float"), ("RTE16", rte16)]),
            )?;
        }
    }

    reg.register(
        "leaky_relu_f32",
        "leaky_relu.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "silu_back_f32",
        "silu_back.comp",
        defs(&[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "diag_mask_inf_f32",
        "diag_mask_inf.comp",
        defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "soft_max_f32",
        "soft_max.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        ),
    )?;
    reg.register(
        "soft_max_f32_f16",
        "soft_max.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("B_TYPE", "float16_t"), ("D_TYPE", "float")],
        ),
    )?;
    reg.register(
        "soft_max_back_f32",
        "soft_max_back.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        ),
    )?;

    // Rope: four layouts, f16 additionally with explicit round-to-even.
    for (name, source) in [
        ("rope_norm", "rope_norm.comp"),
        ("rope_neox", "rope_neox.comp"),
        ("rope_multi", "rope_multi.comp"),
        ("rope_vision", "rope_vision.comp"),
    ] {
        reg.register(
            &format!("{name}_f32"),
            source,
            defs(&[("A_TYPE", "float"), ("D_TYPE", "float")]),
        )?;
        reg.register(
            &format!("{name}_f16"),
            source,
            defs(&[("A_TYPE", "float16_t"), ("D_TYPE", "float16_t")]),
        )?;
        reg.register(
            &format!("{name}_f16_rte"),
            source,
            defs(&[
                ("A_TYPE", "float16_t"),
                ("D_TYPE", "float16_t"),
                ("RTE16", "1"),
            ]),
        )?;
    }

    reg.register("argsort_f32", "argsort.comp", defs(&[("A_TYPE", "float")]))?;

    reg.register(
        "argmax_f32",
        "argmax.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "int")]),
    )?;
    reg.register(
        "sum_rows_f32",
        "sum_rows.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "count_equal_i32",
        "count_equal.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "int"), ("B_TYPE", "int"), ("D_TYPE", "int")],
        ),
    )?;

    reg.register(
        "im2col_f32",
        "im2col.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "im2col_f32_f16",
        "im2col.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float16_t")]),
    )?;
    reg.register(
        "im2col_f32_f16_rte",
        "im2col.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("D_TYPE", "float16_t"), ("RTE16", "1")],
        ),
    )?;

    reg.register(
        "im2col_3d_f32",
        "im2col_3d.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;
    reg.register(
        "im2col_3d_f32_f16",
        "im2col_3d.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float16_t")]),
    )?;
    reg.register(
        "im2col_3d_f32_f16_rte",
        "im2col_3d.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("D_TYPE", "float16_t"), ("RTE16", "1")],
        ),
    )?;

    reg.register(
        "timestep_embedding_f32",
        "timestep_embedding.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "conv_transpose_1d_f32",
        "conv_transpose_1d.comp",
        defs(&[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "pool2d_f32",
        "pool2d.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "rwkv_wkv6_f32",
        "wkv6.comp",
        merged(&base_dict, &[("A_TYPE", "float")]),
    )?;

    reg.register(
        "rwkv_wkv7_f32",
        "wkv7.comp",
        merged(&base_dict, &[("A_TYPE", "float")]),
    )?;

    reg.register(
        "opt_step_adamw_f32",
        "opt_step_adamw.comp",
        merged(&base_dict, &[("A_TYPE", "float")]),
    )?;
    reg.register(
        "opt_step_sgd_f32",
        "opt_step_sgd.comp",
        merged(&base_dict, &[("A_TYPE", "float")]),
    )?;

    reg.register(
        "conv2d_f32_unroll",
        "conv2d_mm.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("USE_COLLECTIVES", "1"),
            ("UNROLL", "[[unroll]]"),
        ]),
    )?;
    reg.register(
        "conv2d_f16_f32_unroll",
        "conv2d_mm.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("USE_COLLECTIVES", "1"),
            ("UNROLL", "[[unroll]]"),
        ]),
    )?;

    reg.register(
        "conv2d_f32",
        "conv2d_mm.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("USE_COLLECTIVES", "1"),
            ("UNROLL", ""),
        ]),
    )?;
    reg.register(
        "conv2d_f16_f32",
        "conv2d_mm.comp",
        defs(&[
            ("A_TYPE", "float16_t"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("USE_COLLECTIVES", "1"),
            ("UNROLL", ""),
        ]),
    )?;

    if reg.features.coopmat2 {
        let cm2 = Flavor {
            coopmat2: true,
            ..Flavor::default()
        };
        reg.register_with(
            "conv2d_f32",
            "conv2d_mm.comp",
            defs(&[
                ("A_TYPE", "float"),
                ("B_TYPE", "float"),
                ("D_TYPE", "float"),
                ("USE_COLLECTIVES", "1"),
                ("UNROLL", "[[unroll]]"),
                ("COOPMAT2", "1"),
            ]),
            cm2,
        )?;
        reg.register_with(
            "conv2d_f16_f32",
            "conv2d_mm.comp",
            defs(&[
                ("A_TYPE", "float16_t"),
                ("B_TYPE", "float"),
                ("D_TYPE", "float"),
                ("USE_COLLECTIVES", "1"),
                ("UNROLL", "[[unroll]]"),
                ("COOPMAT2", "1"),
            ]),
            cm2,
        )?;
    }

    reg.register(
        "conv2d_dw_whcn_f32",
        "conv2d_dw.comp",
        merged(
            &base_dict,
            &[
                ("A_TYPE", "float"),
                ("B_TYPE", "float"),
                ("D_TYPE", "float"),
                ("WHCN", "1"),
            ],
        ),
    )?;
    reg.register(
        "conv2d_dw_cwhn_f32",
        "conv2d_dw.comp",
        merged(
            &base_dict,
            &[
                ("A_TYPE", "float"),
                ("B_TYPE", "float"),
                ("D_TYPE", "float"),
                ("CWHN", "1"),
            ],
        ),
    )?;
    reg.register(
        "conv2d_dw_whcn_f16_f32",
        "conv2d_dw.comp",
        merged(
            &base_dict,
            &[
                ("A_TYPE", "float16_t"),
                ("B_TYPE", "float"),
                ("D_TYPE", "float"),
                ("WHCN", "1"),
            ],
        ),
    )?;
    reg.register(
        "conv2d_dw_cwhn_f16_f32",
        "conv2d_dw.comp",
        merged(
            &base_dict,
            &[
                ("A_TYPE", "float16_t"),
                ("B_TYPE", "float"),
                ("D_TYPE", "float"),
                ("CWHN", "1"),
            ],
        ),
    )?;

    reg.register(
        "roll_f32",
        "roll.comp",
        merged(&base_dict, &[("A_TYPE", "float"), ("D_TYPE", "float")]),
    )?;

    reg.register(
        "add_id_f32",
        "add_id.comp",
        merged(
            &base_dict,
            &[("A_TYPE", "float"), ("B_TYPE", "float"), ("D_TYPE", "float")],
        ),
    )?;

    reg.register(
        "multi_add_f32",
        "multi_add.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
            ("RTE16", "1"),
            ("ADD_RMS", "0"),
        ]),
    )?;
    reg.register(
        "multi_add_rms_f32",
        "multi_add.comp",
        defs(&[
            ("A_TYPE", "float"),
            ("B_TYPE", "float"),
            ("D_TYPE", "float"),
            ("FLOAT_TYPE", "float"),
            ("RTE16", "1"),
            ("ADD_RMS", "1"),
        ]),
    )?;

    Ok(())
}
