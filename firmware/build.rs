fn main() {
    // .env is optional; config.rs falls back to built-in defaults
    let _ = dotenv_build::output(dotenv_build::Config::default());

    println!(
        "cargo:rustc-env=BUILD_VERSION={}",
        chrono::Utc::now().format("0.1.0+%Y%m%d")
    );
    println!("cargo:rerun-if-changed=.env");
}
