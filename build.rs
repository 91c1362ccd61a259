//! Build script: embeds the git hash and checks GPU toolkits.
//!
//! A missing toolkit for an enabled GPU feature fails here with an install
//! hint instead of deep inside the whisper-rs-sys build.

use std::path::Path;
use std::process::Command;

/// A GPU feature and how to tell whether its toolkit is present.
struct Toolkit {
    feature: &'static str,
    name: &'static str,
    probe: &'static [&'static str],
    install: &'static str,
}

const TOOLKITS: &[Toolkit] = &[
    Toolkit {
        feature: "CARGO_FEATURE_CUDA",
        name: "CUDA toolkit (nvcc)",
        probe: &["nvcc", "--version"],
        install: "https://developer.nvidia.com/cuda-downloads",
    },
    Toolkit {
        feature: "CARGO_FEATURE_VULKAN",
        name: "Vulkan SDK (vulkaninfo)",
        probe: &["vulkaninfo", "--summary"],
        install: "https://vulkan.lunarg.com/",
    },
    Toolkit {
        feature: "CARGO_FEATURE_HIPBLAS",
        name: "ROCm (rocminfo)",
        probe: &["rocminfo"],
        install: "https://rocm.docs.amd.com/",
    },
];

const OPENBLAS_LIBS: &[&str] = &[
    "/usr/lib/x86_64-linux-gnu/libopenblas.so",
    "/usr/lib/libopenblas.so",
    "/usr/lib64/libopenblas.so",
];

fn main() {
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    for toolkit in TOOLKITS {
        if std::env::var_os(toolkit.feature).is_none() {
            continue;
        }
        let (program, args) = match toolkit.probe.split_first() {
            Some(split) => split,
            None => continue,
        };
        match Command::new(program).args(args).output() {
            Ok(out) if out.status.success() => {
                if toolkit.feature == "CARGO_FEATURE_CUDA"
                    && let Some((major, minor)) =
                        parse_cuda_version(&String::from_utf8_lossy(&out.stdout))
                {
                    println!("cargo::warning=Building with CUDA {}.{}", major, minor);
                } else {
                    println!("cargo::warning={} detected", toolkit.name);
                }
            }
            _ => missing(toolkit.name, toolkit.install),
        }
    }

    if std::env::var_os("CARGO_FEATURE_OPENBLAS").is_some() {
        let pkg_config_ok = Command::new("pkg-config")
            .args(["--exists", "openblas"])
            .status()
            .is_ok_and(|s| s.success());
        if !pkg_config_ok && !OPENBLAS_LIBS.iter().any(|lib| Path::new(lib).exists()) {
            missing("OpenBLAS", "sudo apt install libopenblas-dev");
        }
    }
}

fn missing(name: &str, install: &str) -> ! {
    panic!(
        "\n\n{} not found.\n  Install: {}\n  Or build without GPU features: cargo build --release\n",
        name, install
    );
}

/// Parse "release X.Y" from nvcc --version output.
fn parse_cuda_version(text: &str) -> Option<(u32, u32)> {
    // nvcc output: "Cuda compilation tools, release 12.4, V12.4.131"
    let release_pos = text.find("release ")?;
    let after = &text[release_pos + 8..];
    let version_str = &after[..after.find(',')?];
    let mut parts = version_str.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}
