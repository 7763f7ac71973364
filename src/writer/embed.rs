//! Emit the C++ header/source that expose each compiled blob by symbol,
//! plus the aggregate lookup tables the runtime indexes into.

use super::{read_binary_file, write_file_if_changed};
use crate::cli::Cli;
use crate::model::{FeatureFlags, TYPE_NAMES, VariantSpec, is_legacy_quant};
use anyhow::{Context, Result};
use std::fs;

pub fn write_embed_files(
    variants: &[VariantSpec],
    args: &Cli,
    features: FeatureFlags,
) -> Result<()> {
    let no_embed = args.no_embed;

    let mut hdr = String::from("#include <cstdint>\n\n");
    let mut src = format!(
        "#include \"{}\"\n\n",
        args.target_hpp
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );

    if no_embed {
        // Forward-slash form so the macro is portable across generators.
        let shader_dir = args.output_dir.display().to_string().replace('\\', "/");
        hdr.push_str(&format!("#define GGML_VK_SHADER_DIR \"{shader_dir}\"\n\n"));
    }

    // Registration order is whatever the catalog dictates; symbol order is
    // lexicographic for stable output.
    let mut sorted: Vec<&VariantSpec> = variants.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    for variant in &sorted {
        let name = &variant.name;
        if no_embed {
            let basename = variant
                .output_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            hdr.push_str(&format!(
                "inline constexpr char const * {name}_data = \"{basename}\";\n"
            ));
            hdr.push_str(&format!("const uint64_t {name}_len = 0;\n\n"));
        } else {
            let data = read_binary_file(&variant.output_path, false);
            if data.is_empty() {
                continue;
            }

            hdr.push_str(&format!(
                "extern const unsigned char {name}_data[{}];\n",
                data.len()
            ));
            hdr.push_str(&format!("const uint64_t {name}_len = {};\n\n", data.len()));

            src.push_str(&format!(
                "const unsigned char {name}_data[{}] = {{\n",
                data.len()
            ));
            for (i, byte) in data.iter().enumerate() {
                src.push_str(&format!("0x{byte:x},"));
                if (i + 1) % 12 == 0 {
                    src.push('\n');
                }
            }
            src.push_str("\n};\n\n");
        }
    }

    write_binary_op_tables(&mut hdr, &mut src);
    write_dmmv_tables(&mut hdr, &mut src, features);

    write_file_if_changed(&args.target_hpp, &hdr)?;
    if no_embed {
        write_file_if_changed(&args.target_cpp, &src)?;
    } else {
        // The embedded source can be hundreds of megabytes; skip the
        // read-back comparison and just write it.
        fs::write(&args.target_cpp, &src)
            .with_context(|| format!("Writing {}", args.target_cpp.display()))?;
    }
    Ok(())
}

/// Per element-wise binary op, a 2x2x2x2 table over (src0 half?, src1 half?,
/// dst half?, rte?) referencing the per-variant symbols.
fn write_binary_op_tables(hdr: &mut String, src: &mut String) {
    let suffixes = ["_f32", "_f16"];
    for op in ["add", "sub", "mul", "div", "add_rms"] {
        hdr.push_str(&format!("extern const void * {op}_data[2][2][2][2];\n"));
        hdr.push_str(&format!("extern const uint64_t {op}_len[2][2][2][2];\n"));

        let mut data = format!("const void * {op}_data[2][2][2][2] = ");
        let mut len = format!("const uint64_t {op}_len[2][2][2][2] = ");
        for t0 in 0..2usize {
            if t0 == 0 {
                data.push('{');
                len.push('{');
            }
            for t1 in 0..2usize {
                if t1 == 0 {
                    data.push('{');
                    len.push('{');
                }
                for t2 in 0..2usize {
                    if t2 == 0 {
                        data.push('{');
                        len.push('{');
                    }
                    for rte in 0..2usize {
                        if rte == 0 {
                            data.push('{');
                            len.push('{');
                        }
                        let name = format!(
                            "{op}{}{}{}{}",
                            suffixes[t0],
                            suffixes[t1],
                            suffixes[t2],
                            if rte != 0 { "_rte" } else { "" }
                        );
                        data.push_str(&format!("{name}_data,"));
                        len.push_str(&format!("{name}_len,"));
                        if rte == 1 {
                            data.push_str("}, ");
                            len.push_str("}, ");
                        }
                    }
                    if t2 == 1 {
                        data.push_str("}, ");
                        len.push_str("}, ");
                    }
                }
                if t1 == 1 {
                    data.push_str("}, ");
                    len.push_str("}, ");
                }
            }
            if t0 == 1 {
                data.push_str("};\n");
                len.push_str("};\n");
            }
        }
        src.push_str(&data);
        src.push_str(&len);
    }
}

/// Per (type, b-type), the three dequantizing mat-vec dispatch entries:
/// base, subgroup, subgroup-no-shared-memory.
fn write_dmmv_tables(hdr: &mut String, src: &mut String, features: FeatureFlags) {
    let mut btypes = vec!["f16", "f32"];
    if features.integer_dot {
        btypes.push("q8_1");
    }

    for btype in &btypes {
        for tname in TYPE_NAMES {
            if *btype == "q8_1" && !is_legacy_quant(tname) {
                continue;
            }
            hdr.push_str(&format!(
                "extern const void * arr_dmmv_{tname}_{btype}_f32_data[3];\n"
            ));
            hdr.push_str(&format!(
                "extern const uint64_t arr_dmmv_{tname}_{btype}_f32_len[3];\n"
            ));
            src.push_str(&format!(
                "const void * arr_dmmv_{tname}_{btype}_f32_data[3] = {{mul_mat_vec_{tname}_{btype}_f32_data, mul_mat_vec_{tname}_{btype}_f32_subgroup_data, mul_mat_vec_{tname}_{btype}_f32_subgroup_no_shmem_data}};\n"
            ));
            src.push_str(&format!(
                "const uint64_t arr_dmmv_{tname}_{btype}_f32_len[3] =  {{mul_mat_vec_{tname}_{btype}_f32_len,  mul_mat_vec_{tname}_{btype}_f32_subgroup_len, mul_mat_vec_{tname}_{btype}_f32_subgroup_no_shmem_len}};\n"
            ));
        }
    }
}
