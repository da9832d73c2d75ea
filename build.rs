fn main() {
    // Declared here so core-only builds, which skip `tauri_build`, still know these cfgs.
    println!("cargo:rustc-check-cfg=cfg(desktop)");
    println!("cargo:rustc-check-cfg=cfg(mobile)");

    // `tauri_build::build()` reads tauri.conf.json and env vars exported by the `tauri`
    // crate, which only exists with the `app` feature.
    if std::env::var_os("CARGO_FEATURE_APP").is_some() {
        tauri_build::build()
    }
}
