fn main() {
    if let Err(err) = vulkan_shaders_gen::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
