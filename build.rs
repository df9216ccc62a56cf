fn cfg(name: &str) -> String {
    std::env::var(format!("CARGO_CFG_{}", name.to_uppercase())).unwrap_or_default()
}

fn make_overridable_cfg(name: &str, logic: impl FnOnce() -> &'static str) -> String {
    let env_name = format!("FAULT_BARRIER_{}", name.to_uppercase());
    println!("cargo::rerun-if-env-changed={env_name}");
    let value = std::env::var(env_name).unwrap_or_else(|_| logic().to_string());
    println!("cargo::rustc-cfg={name}=\"{value}\"");
    value
}

fn main() {
    // `CARGO_CFG_PANIC` reflects the strategy the crate itself is compiled with. Under
    // `panic = "abort"` there is nothing to intercept, so the barrier degrades to a plain call.
    make_overridable_cfg("backend", || {
        if cfg("panic") == "abort" {
            "abort"
        } else {
            "unwind"
        }
    });
}
