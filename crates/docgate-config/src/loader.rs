//! Environment parsing over validated defaults.
//!
//! Every knob reads a `DOCGATE_*` variable; absent variables keep their
//! default so a bare environment yields a runnable configuration.

use std::path::PathBuf;

use crate::error::ConfigResult;
use crate::model::AppConfig;
use crate::validate::{
    parse_bind_addr, parse_bytes, parse_flag, parse_log_style, parse_port, parse_quality,
    parse_scale,
};

/// Assemble the full configuration from process environment variables.
///
/// # Errors
///
/// Returns a [`crate::ConfigError`] when any present variable fails
/// validation; absent variables never fail.
pub fn load_from_env() -> ConfigResult<AppConfig> {
    let lookup = |name: &str| std::env::var(name).ok();
    load_with(&lookup)
}

/// Assemble the configuration from an injected variable lookup.
///
/// # Errors
///
/// Returns a [`crate::ConfigError`] when any present variable fails
/// validation.
pub fn load_with(lookup: &dyn Fn(&str) -> Option<String>) -> ConfigResult<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(value) = lookup("DOCGATE_BIND_ADDR") {
        config.app.bind_addr = parse_bind_addr(&value)?;
    }
    if let Some(value) = lookup("DOCGATE_HTTP_PORT") {
        config.app.http_port = parse_port(&value)?;
    }
    if let Some(value) = lookup("DOCGATE_CORS_ORIGIN") {
        config.app.cors_origin = value;
    }
    if let Some(value) = lookup("DOCGATE_SCRATCH_DIR") {
        config.scratch.root = PathBuf::from(value);
    }
    if let Some(value) = lookup("DOCGATE_MAX_UPLOAD_BYTES") {
        config.scratch.max_upload_bytes = parse_bytes("max_upload_bytes", &value)?;
    }
    if let Some(value) = lookup("DOCGATE_STRICT_BOUNDS") {
        config.pipeline.strict_bounds = parse_flag("strict_bounds", &value)?;
    }
    if let Some(value) = lookup("DOCGATE_COMPRESS_SCALE") {
        config.pipeline.compress_scale = parse_scale("compress_scale", &value)?;
    }
    if let Some(value) = lookup("DOCGATE_COMPRESS_JPEG_QUALITY") {
        config.pipeline.compress_jpeg_quality = parse_quality("compress_jpeg_quality", &value)?;
    }
    if let Some(value) = lookup("DOCGATE_EXPORT_SCALE") {
        config.pipeline.export_scale = parse_scale("export_scale", &value)?;
    }
    if let Some(value) = lookup("DOCGATE_EXPORT_JPEG_QUALITY") {
        config.pipeline.export_jpeg_quality = parse_quality("export_jpeg_quality", &value)?;
    }
    if let Some(value) = lookup("DOCGATE_LOG_LEVEL") {
        config.telemetry.log_level = value;
    }
    if let Some(value) = lookup("DOCGATE_LOG_STYLE") {
        config.telemetry.log_style = parse_log_style(&value)?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| map.get(name).map(ToString::to_string)
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let map = HashMap::new();
        let config = load_with(&lookup_from(&map))?;
        assert_eq!(config.app.http_port, 8000);
        assert!(!config.pipeline.strict_bounds);
        assert_eq!(config.scratch.root, PathBuf::from("scratch"));
        Ok(())
    }

    #[test]
    fn present_variables_override_defaults() -> ConfigResult<()> {
        let map = HashMap::from([
            ("DOCGATE_HTTP_PORT", "9090"),
            ("DOCGATE_SCRATCH_DIR", "/tmp/docgate"),
            ("DOCGATE_STRICT_BOUNDS", "yes"),
            ("DOCGATE_COMPRESS_JPEG_QUALITY", "55"),
        ]);
        let config = load_with(&lookup_from(&map))?;
        assert_eq!(config.app.http_port, 9090);
        assert_eq!(config.scratch.root, PathBuf::from("/tmp/docgate"));
        assert!(config.pipeline.strict_bounds);
        assert_eq!(config.pipeline.compress_jpeg_quality, 55);
        Ok(())
    }

    #[test]
    fn invalid_variable_is_rejected() {
        let map = HashMap::from([("DOCGATE_HTTP_PORT", "notaport")]);
        assert!(load_with(&lookup_from(&map)).is_err());
    }
}
