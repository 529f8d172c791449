// Build script to inject version information from git tags
//
// Falls back to CARGO_PKG_VERSION when git is unavailable.

use std::process::Command;

fn main() {
    let version = get_git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=RISKDOT_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn get_git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let version = String::from_utf8(output.stdout).ok()?;
    let version = version.trim();

    if version.starts_with('v') && !version.contains('-') {
        // Clean tag like "v0.1.0"
        Some(version.trim_start_matches('v').to_string())
    } else if version.starts_with('v') {
        // Tag with commits/dirty like "v0.1.0-5-gabc123"
        version
            .find('-')
            .map(|dash_pos| version[1..dash_pos].to_string())
    } else {
        // Not a tagged version: CARGO_PKG_VERSION plus git info
        let base_version = env!("CARGO_PKG_VERSION");
        if let Some(clean_version) = version.strip_suffix("-dirty") {
            Some(format!("{}-{}-dirty", base_version, clean_version))
        } else {
            Some(format!("{}-{}", base_version, version))
        }
    }
}
