use clap::Parser;
use std::path::PathBuf;

const LONG_ABOUT: &str = "\
Compiles Vulkan compute shaders to SPIR-V and embeds them into C++ source files.

This executable runs at build time. Typically it is invoked by CMake like this:
  1. Run with --target-cmake to generate a CMakeLists.txt that contains build
     commands for the shaders.
  2. Configure and build the generated CMake sub-project to compile the
     shaders into SPIR-V files.
  3. Run without --target-cmake to generate C++ source files that embed the
     SPIR-V binaries. This invocation is part of the generated sub-project.

If --no-embed is used, step 1 generates stub C++ source files and step 3 is
skipped. This allows fast iteration on shader code without recompiling C++
code, but can't be deployed.";

#[derive(Parser, Debug)]
#[command(author, version, about = "Vulkan shader variant generator", long_about = LONG_ABOUT)]
pub struct Cli {
    /// Path to the glslc executable
    #[arg(long, value_name = "PATH", default_value = "glslc")]
    pub glslc: String,

    /// Input directory containing .comp shader templates
    #[arg(long, value_name = "PATH", default_value = "vulkan-shaders")]
    pub input_dir: PathBuf,

    /// Output directory for compiled .spv files
    #[arg(long, value_name = "PATH", default_value = "/tmp")]
    pub output_dir: PathBuf,

    /// Output C++ header file path
    #[arg(long, value_name = "PATH", default_value = "ggml-vulkan-shaders.hpp")]
    pub target_hpp: PathBuf,

    /// Output C++ source file path
    #[arg(long, value_name = "PATH", default_value = "ggml-vulkan-shaders.cpp")]
    pub target_cpp: PathBuf,

    /// Output CMakeLists.txt file path; selects build-script generation
    #[arg(long, value_name = "PATH")]
    pub target_cmake: Option<PathBuf>,

    /// Do not embed SPIR-V binaries into C++ source, reference them by name
    #[arg(long, requires = "target_cmake")]
    pub no_embed: bool,
}
