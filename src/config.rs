//! Ambient runtime configuration: logging setup.
//!
//! Kept as its own tiny module, mirroring the rest of the crate's habit of
//! giving each cross-cutting concern a named home rather than inlining it
//! into `main`. Gated by the `logging` feature exactly like the optional
//! `env_logger`/`chrono` dependencies in `Cargo.toml`.

#[cfg(feature = "logging")]
pub fn init_logging() {
    use std::io::Write;
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {} {}] {}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });
    let _ = builder.try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init_logging() {}
