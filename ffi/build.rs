//! Generates `bookshelf.h` for the native shell under `OUT_DIR`.

use std::path::PathBuf;

fn main() {
    let crate_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    println!("cargo:rerun-if-changed=src");

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("BOOKSHELF_H")
        .with_documentation(true)
        .generate();

    let header = out_dir.join("bookshelf.h");
    match generated {
        Ok(bindings) => {
            let mut text = Vec::new();
            bindings.write(&mut text);
            if let Err(err) = std::fs::write(&header, text) {
                println!("cargo:warning=C header not written to {}: {err}", header.display());
            }
        }
        Err(err) => println!("cargo:warning=C header not generated: {err}"),
    }
}
