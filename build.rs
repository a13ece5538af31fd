// build.rs

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const LOCALE_FILE: &str = "locales/en.toml";

/// Compiles the flat keys of the locale file into a `t!` macro that expands to
/// string literals, so `format!(t!("key"), ...)` is checked at compile time.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", LOCALE_FILE);

    let content = fs::read_to_string(LOCALE_FILE)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", LOCALE_FILE, e));
    let translations: BTreeMap<String, String> = toml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", LOCALE_FILE, e));

    let mut macro_code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in &translations {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        macro_code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, escaped));
    }
    macro_code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    macro_code.push('}');

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("translations.rs"), macro_code)
        .expect("Failed to write translations.rs");
}
