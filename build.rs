use anyhow::*;
use fs_extra::{copy_items, dir::CopyOptions};
use std::{env, path::PathBuf};

/// Mirrors `assets/` (the glTF models) into the build output so packaged
/// builds can ship them next to the binary.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let models = manifest_dir.join("assets");
    if !models.exists() {
        println!("cargo:warning=no assets/ directory, the viewer will start with an empty scene");
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut options = CopyOptions::new();
    options.overwrite = true;
    copy_items(&[models], out_dir, &options)?;

    Ok(())
}
