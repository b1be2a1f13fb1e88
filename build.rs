fn main() {
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .unwrap_or_default();
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rustc-env=SOLAR_VIZ_BUILD={}", hash.trim());
}
