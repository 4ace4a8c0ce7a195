// Stages the static host page into `dist/`. Run `wasm-pack build --target web
// --out-dir static/pkg` first so the module ships with it.
use std::path::Path;

use fs_extra::dir::{self, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=static");

    let static_dir = Path::new("static");
    if !static_dir.exists() {
        return;
    }
    let out_dir = Path::new("dist");
    if let Err(e) = std::fs::create_dir_all(out_dir) {
        println!("cargo:warning=cannot create dist/: {e}");
        return;
    }

    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;
    if let Err(e) = dir::copy(static_dir, out_dir, &options) {
        println!("cargo:warning=static assets not copied: {e}");
    }
}
