//! Exposes the package name and the `[package.metadata]` strings to the crate
//! as `APP_METADATA_*` constants in `$OUT_DIR/app_metadata.rs`.

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use toml::Value;

fn constant(key: &str, value: &str) -> String {
    format!("#[allow(unused)]\npub const APP_METADATA_{}: &str = {:?};\n", key.to_uppercase(), value)
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=Cargo.toml");

    let out_dir = env::var("OUT_DIR").map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    let manifest: Value = toml::from_str(&fs::read_to_string("Cargo.toml")?)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut source = constant("NAME", &env::var("CARGO_PKG_NAME").unwrap_or_else(|_| "microrm".to_string()));
    source.push_str(&constant("VERSION", &env::var("CARGO_PKG_VERSION").unwrap_or_default()));

    let metadata = manifest.get("package").and_then(|package| package.get("metadata")).and_then(Value::as_table);
    for (key, value) in metadata.into_iter().flatten() {
        if let Some(value) = value.as_str() {
            source.push_str(&constant(key, value));
        }
    }

    fs::write(Path::new(&out_dir).join("app_metadata.rs"), source)
}
