const fn release_or_cargo_version(opt: Option<&'static str>) -> &'static str {
    match opt {
        Some(val) => val,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Version reported by `--version` and the health endpoint. Release builds
/// stamp it through `STOREFRONT_VERSION`.
pub const VERSION: &str = release_or_cargo_version(option_env!("STOREFRONT_VERSION"));
