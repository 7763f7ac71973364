//! Emit the subordinate CMake project that actually drives glslc.

use super::{cmake_escape, cmake_path, write_file_if_changed};
use crate::cli::Cli;
use crate::model::VariantSpec;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Accumulates the generated build script in registration order, then writes
/// it idempotently.
pub struct CmakeScript {
    out: String,
    spv_paths: Vec<PathBuf>,
    glslc: String,
}

impl CmakeScript {
    /// Script prologue: argv echo, project boilerplate and the
    /// `compile_shader` helper every variant rule goes through.
    pub fn new(argv: &[String], glslc: &str) -> Self {
        let mut out = String::new();
        out.push_str("# Generated with ");
        for arg in argv {
            out.push_str(arg);
            out.push(' ');
        }
        out.push_str("\n\n");
        out.push_str("cmake_minimum_required(VERSION 3.14)\n");
        out.push_str("project(ggml-vulkan-shaders)\n\n");
        out.push_str(&format!("set(GLSLC \"{glslc}\")\n\n"));
        out.push_str("function(compile_shader name in_file out_file flags)\n");
        out.push_str("  add_custom_command(\n");
        out.push_str("    OUTPUT ${out_file}\n");
        out.push_str(
            "    COMMAND ${GLSLC} ${flags} ${ARGN} -MD -MF ${out_file}.d ${in_file} -o ${out_file}\n",
        );
        out.push_str("    DEPENDS ${in_file}\n");
        out.push_str("    DEPFILE ${out_file}.d\n");
        out.push_str("    COMMENT \"Building Vulkan shader ${name}.spv\"\n");
        out.push_str("  )\n");
        out.push_str("endfunction()\n\n");

        Self {
            out,
            spv_paths: Vec::new(),
            glslc: glslc.to_string(),
        }
    }

    /// One `compile_shader(...)` call per variant.
    pub fn add_build_command(&mut self, variant: &VariantSpec) {
        self.out.push_str(&format!(
            "compile_shader({} {} {} ",
            variant.name,
            cmake_path(&variant.template_path),
            cmake_path(&variant.output_path)
        ));
        for flag in &variant.flags {
            self.out.push_str(&format!("\"{}\" ", cmake_escape(flag)));
        }
        self.out.push_str(")\n");
        self.spv_paths.push(variant.output_path.clone());
    }

    /// Terminal target for embed mode: a follow-up rule that re-invokes this
    /// generator once every binary exists, then an aggregate target over the
    /// two generated sources.
    pub fn add_target_embed(&mut self, executable: &Path, args: &Cli) {
        self.out.push_str("\nadd_custom_command(\n");
        self.out.push_str(&format!(
            "  OUTPUT {} {}\n",
            cmake_path(&args.target_hpp),
            cmake_path(&args.target_cpp)
        ));
        self.out.push_str(&format!(
            "  COMMAND {} --glslc {} --input-dir {} --output-dir {} --target-hpp {} --target-cpp {}\n",
            cmake_path(executable),
            self.glslc,
            cmake_path(&args.input_dir),
            cmake_path(&args.output_dir),
            cmake_path(&args.target_hpp),
            cmake_path(&args.target_cpp)
        ));
        self.out.push_str("  DEPENDS\n");
        for spv_path in &self.spv_paths {
            self.out.push_str(&format!("    {}\n", cmake_path(spv_path)));
        }
        self.out
            .push_str("  COMMENT \"Embedding Vulkan shaders into C++ source\"\n");
        self.out.push_str(")\n");

        self.out.push_str("\nadd_custom_target(vulkan-shaders ALL DEPENDS\n");
        self.out
            .push_str(&format!("  {}\n", cmake_path(&args.target_hpp)));
        self.out
            .push_str(&format!("  {}\n", cmake_path(&args.target_cpp)));
        self.out.push_str(")\n");
    }

    /// Terminal target for build-only mode: depend on every binary directly.
    pub fn add_target_build_only(&mut self) {
        self.out.push_str("\nadd_custom_target(vulkan-shaders ALL DEPENDS\n");
        for spv_path in &self.spv_paths {
            self.out.push_str(&format!("  {}\n", cmake_path(spv_path)));
        }
        self.out.push_str(")\n");
    }

    pub fn write(&self, target_filepath: &Path) -> Result<()> {
        write_file_if_changed(target_filepath, &self.out)
    }

    #[cfg(test)]
    fn contents(&self) -> &str {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Defines;
    use clap::Parser;

    fn variant(name: &str) -> VariantSpec {
        VariantSpec {
            name: name.to_string(),
            template_path: PathBuf::from("in/mul_mm.comp"),
            output_path: PathBuf::from(format!("out/{name}.spv")),
            defines: Defines::new(),
            flags: vec![
                "-fshader-stage=compute".to_string(),
                "--target-env=vulkan1.2".to_string(),
                "-O".to_string(),
                "-DACC_TYPE_MAX=\"float16_t(65504.0)\"".to_string(),
            ],
        }
    }

    fn argv(extra: &[&str]) -> Vec<String> {
        std::iter::once("vulkan-shaders-gen")
            .chain(extra.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn header_echoes_argv_and_declares_the_compile_function() {
        let script = CmakeScript::new(&argv(&["--output-dir", "out"]), "glslc");
        let text = script.contents();

        assert!(text.starts_with("# Generated with vulkan-shaders-gen --output-dir out \n"));
        assert!(text.contains("cmake_minimum_required(VERSION 3.14)"));
        assert!(text.contains("project(ggml-vulkan-shaders)"));
        assert!(text.contains("set(GLSLC \"glslc\")"));
        assert!(text.contains("function(compile_shader name in_file out_file flags)"));
        assert!(text.contains("-MD -MF ${out_file}.d ${in_file} -o ${out_file}"));
        assert!(text.contains("DEPFILE ${out_file}.d"));
    }

    #[test]
    fn build_commands_quote_and_escape_flags() {
        let mut script = CmakeScript::new(&argv(&[]), "glslc");
        script.add_build_command(&variant("matmul_f32_f16"));

        let text = script.contents();
        assert!(text.contains(
            "compile_shader(matmul_f32_f16 \"in/mul_mm.comp\" \"out/matmul_f32_f16.spv\" \
             \"-fshader-stage=compute\" \"--target-env=vulkan1.2\" \"-O\" \
             \"-DACC_TYPE_MAX=\\\"float16_t(65504.0)\\\"\" )"
        ));
    }

    #[test]
    fn build_only_target_lists_every_binary() {
        let mut script = CmakeScript::new(&argv(&[]), "glslc");
        script.add_build_command(&variant("matmul_f32_f16"));
        script.add_build_command(&variant("norm_f32"));
        script.add_target_build_only();

        let text = script.contents();
        assert!(text.contains("add_custom_target(vulkan-shaders ALL DEPENDS\n"));
        assert!(text.contains("  \"out/matmul_f32_f16.spv\"\n"));
        assert!(text.contains("  \"out/norm_f32.spv\"\n"));
        assert!(!text.contains("add_custom_command(\n  OUTPUT"));
    }

    #[test]
    fn embed_target_reinvokes_the_generator() {
        let args = Cli::parse_from([
            "vulkan-shaders-gen",
            "--input-dir",
            "in",
            "--output-dir",
            "out",
            "--target-hpp",
            "shaders.hpp",
            "--target-cpp",
            "shaders.cpp",
            "--target-cmake",
            "build.cmake",
        ]);

        let mut script = CmakeScript::new(&argv(&[]), "glslc");
        script.add_build_command(&variant("matmul_f32_f16"));
        script.add_target_embed(Path::new("vulkan-shaders-gen"), &args);

        let text = script.contents();
        assert!(text.contains("  OUTPUT \"shaders.hpp\" \"shaders.cpp\"\n"));
        assert!(text.contains(
            "  COMMAND \"vulkan-shaders-gen\" --glslc glslc --input-dir \"in\" \
             --output-dir \"out\" --target-hpp \"shaders.hpp\" --target-cpp \"shaders.cpp\"\n"
        ));
        assert!(text.contains("  DEPENDS\n    \"out/matmul_f32_f16.spv\"\n"));
        assert!(text.contains(
            "add_custom_target(vulkan-shaders ALL DEPENDS\n  \"shaders.hpp\"\n  \"shaders.cpp\"\n)"
        ));
    }
}
