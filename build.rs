fn main() {
    // Re-run build script if the embedded migrations change
    println!("cargo:rerun-if-changed=migrations");
}
