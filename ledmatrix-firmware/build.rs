//! Build script for ledmatrix-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates link.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use ledmatrix_core::config::{parse_link_config, LinkConfig};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Print a boxed build error and stop
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate link.toml configuration at compile time
///
/// The file must be valid TOML, deserialize into `LinkConfig`, parse the
/// same way with the firmware's own parser, and pass `LinkConfig::validate`.
fn validate_config() {
    println!("cargo:rerun-if-changed=link.toml");

    let config_path = Path::new("link.toml");
    if !config_path.exists() {
        fail(
            "link.toml not found!",
            &["Create link.toml in the ledmatrix-firmware directory.".to_string()],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read link.toml", &[e.to_string()]),
    };

    let config: LinkConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => fail(
            "Invalid link.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    match parse_link_config(&content) {
        Ok(parsed) if parsed == config => {}
        Ok(_) => fail(
            "link.toml uses TOML the firmware parser reads differently",
            &["Keep to flat `key = value` lines with plain strings.".to_string()],
        ),
        Err(e) => fail(
            "link.toml is not readable by the firmware parser",
            &[format!("{:?}", e)],
        ),
    }

    if let Err(e) = config.validate() {
        fail("Invalid link configuration", &[format!("{:?}", e)]);
    }
}
