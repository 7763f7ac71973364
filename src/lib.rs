pub mod cli;
pub mod model;
pub mod registry;
pub mod writer;

use anyhow::{Context, bail};
use clap::Parser;
use std::path::Path;

pub fn run() -> anyhow::Result<()> {
    let argv: Vec<String> = std::env::args().collect();
    let args = cli::Cli::parse();
    generate(&args, &argv)
}

/// The whole pipeline for one invocation. `argv` is echoed into the build
/// script header and names the executable for the phase-2 re-invocation.
pub fn generate(args: &cli::Cli, argv: &[String]) -> anyhow::Result<()> {
    let features = model::FeatureFlags::from_build();

    // 1. ── Validate directories ───────────────────────────────────────
    if !args.input_dir.exists() {
        bail!("Input directory does not exist: {}", args.input_dir.display());
    }
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Creating {}", args.output_dir.display()))?;

    // 2. ── Enumerate the variant catalog ──────────────────────────────
    println!("vulkan-shaders-gen: enumerating shader variants");
    let variants = registry::enumerate(features, &args.input_dir, &args.output_dir)
        .with_context(|| "Building the variant catalog")?;
    println!("vulkan-shaders-gen: {} variants", variants.len());

    // 3. ── Write outputs ──────────────────────────────────────────────
    if args.target_cmake.is_none() || args.no_embed {
        writer::embed::write_embed_files(&variants, args, features)
            .with_context(|| "Writing C++ artifacts")?;
    }

    if let Some(target_cmake) = &args.target_cmake {
        if let Some(parent) = target_cmake.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Creating {}", parent.display()))?;
            }
        }

        let mut script = writer::cmake::CmakeScript::new(argv, &args.glslc);
        for variant in &variants {
            script.add_build_command(variant);
        }
        if args.no_embed {
            script.add_target_build_only();
        } else {
            let executable = argv
                .first()
                .map(String::as_str)
                .unwrap_or("vulkan-shaders-gen");
            script.add_target_embed(Path::new(executable), args);
        }
        script
            .write(target_cmake)
            .with_context(|| "Writing build script")?;
    }

    Ok(())
}
