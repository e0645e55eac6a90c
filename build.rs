fn main() {
    // CI writes the pipeline counter to BUILD_NUMBER; local builds report 0.
    let build_number = std::fs::read_to_string("BUILD_NUMBER")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "0".to_string());

    println!("cargo:rustc-env=BUILD_NUMBER={build_number}");
    println!("cargo:rerun-if-changed=BUILD_NUMBER");
}
