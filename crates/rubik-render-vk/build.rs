use std::{env, fs, path::PathBuf};

#[cfg(feature = "embed-shaders")]
fn compile_shaders(out: &std::path::Path) {
    let comp = shaderc::Compiler::new().unwrap();
    let mut opts = shaderc::CompileOptions::new().unwrap();

    // Vulkan 1.0 matches the instance API version.
    opts.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    opts.set_optimization_level(shaderc::OptimizationLevel::Performance);

    for (file, kind) in [
        ("triangle.vert", shaderc::ShaderKind::Vertex),
        ("triangle.frag", shaderc::ShaderKind::Fragment),
    ] {
        let path = PathBuf::from("shaders").join(file);
        let src = fs::read_to_string(&path).unwrap();
        let spv = comp
            .compile_into_spirv(&src, kind, file, "main", Some(&opts))
            .unwrap();
        fs::write(out.join(format!("{file}.spv")), spv.as_binary_u8()).unwrap();
    }
}

#[cfg(not(feature = "embed-shaders"))]
fn compile_shaders(_out: &std::path::Path) {}

fn main() {
    let out = PathBuf::from(env::var("OUT_DIR").unwrap());
    compile_shaders(&out);

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=shaders/triangle.vert");
    println!("cargo:rerun-if-changed=shaders/triangle.frag");
}
