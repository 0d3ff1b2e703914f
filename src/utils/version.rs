//! Version information utilities

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the current crate version
pub fn get_version() -> &'static str {
    VERSION
}

/// Version string including the git commit when the build provides one
pub fn get_detailed_version() -> String {
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    format!("{} ({})", get_version(), git_hash)
}
