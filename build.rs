fn main() {
    // The library and its tests build without the Tauri shell; only the
    // desktop binary needs the generated context.
    #[cfg(feature = "desktop")]
    {
        tauri_build::build();
    }

    println!("cargo:rerun-if-changed=tauri.conf.json");
    println!("cargo:rerun-if-changed=capabilities");
}
