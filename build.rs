//! Copies `.env.example` into the local data directory so a template
//! sits next to where `spotify-mcp` looks for its `.env` file.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotify-mcp");

    if !template.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
        return Ok(());
    }

    // Read-only build sandboxes are not a reason to fail the build.
    if fs::create_dir_all(&out_dir).is_err() {
        println!("cargo:warning=cannot create {}", out_dir.display());
        return Ok(());
    }
    fs::copy(&template, out_dir.join(".env.example"))?;

    Ok(())
}
