// build.rs

use std::process::Command;

const SHADERS: &[(&str, &str)] = &[
    ("shaders/shader.vert", "shaders/vert.spv"),
    ("shaders/shader.frag", "shaders/frag.spv"),
];

fn main() {
    for (source, output) in SHADERS {
        println!("cargo::rerun-if-changed={}", source);

        // The renderer reads the blobs at startup, so a missing compiler only
        // matters when the .spv files are absent or stale.
        match Command::new("glslc").args([source, "-o", output]).status() {
            Err(err) => {
                println!("cargo::warning=glslc unavailable, `{}` not rebuilt: {}", output, err);
            }
            Ok(status) if !status.success() => {
                println!("cargo::warning=glslc failed on `{}`: {}", source, status);
            }
            Ok(_) => {}
        }
    }
}
