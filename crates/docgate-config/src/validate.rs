//! Field-level parsing helpers shared by the environment loader.

use std::net::IpAddr;

use crate::error::{ConfigError, ConfigResult};
use crate::model::LogStyle;

/// Parse a bind address string.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an IP address.
pub fn parse_bind_addr(value: &str) -> ConfigResult<IpAddr> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid("bind_addr", value, "not_an_ip_address"))
}

/// Parse a non-zero TCP port.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not in `1..=65535`.
pub fn parse_port(value: &str) -> ConfigResult<u16> {
    let port: u16 = value
        .parse()
        .map_err(|_| ConfigError::invalid("http_port", value, "not_a_port"))?;
    if port == 0 {
        return Err(ConfigError::invalid("http_port", value, "zero"));
    }
    Ok(port)
}

/// Parse a boolean flag, accepting the usual truthy/falsey spellings.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not recognised.
pub fn parse_flag(field: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, value, "not_a_flag")),
    }
}

/// Parse a byte count.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a positive integer.
pub fn parse_bytes(field: &'static str, value: &str) -> ConfigResult<u64> {
    let bytes: u64 = value
        .parse()
        .map_err(|_| ConfigError::invalid(field, value, "not_an_integer"))?;
    if bytes == 0 {
        return Err(ConfigError::invalid(field, value, "zero"));
    }
    Ok(bytes)
}

/// Parse a JPEG quality in `1..=100`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is out of range.
pub fn parse_quality(field: &'static str, value: &str) -> ConfigResult<u8> {
    let quality: u8 = value
        .parse()
        .map_err(|_| ConfigError::invalid(field, value, "not_an_integer"))?;
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::invalid(field, value, "out_of_range"));
    }
    Ok(quality)
}

/// Parse a raster scale factor in `(0.0, 8.0]`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is out of range.
pub fn parse_scale(field: &'static str, value: &str) -> ConfigResult<f32> {
    let scale: f32 = value
        .parse()
        .map_err(|_| ConfigError::invalid(field, value, "not_a_number"))?;
    if !scale.is_finite() || scale <= 0.0 || scale > 8.0 {
        return Err(ConfigError::invalid(field, value, "out_of_range"));
    }
    Ok(scale)
}

/// Parse a log style selector.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not recognised.
pub fn parse_log_style(value: &str) -> ConfigResult<LogStyle> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogStyle::Json),
        "pretty" => Ok(LogStyle::Pretty),
        "infer" => Ok(LogStyle::Infer),
        _ => Err(ConfigError::invalid("log_style", value, "unknown_style")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_accepts_v4_and_v6() -> ConfigResult<()> {
        assert!(parse_bind_addr("127.0.0.1")?.is_loopback());
        assert!(parse_bind_addr("::1")?.is_loopback());
        assert!(parse_bind_addr("not-an-ip").is_err());
        Ok(())
    }

    #[test]
    fn port_rejects_zero() {
        assert!(parse_port("0").is_err());
        assert!(parse_port("65536").is_err());
        assert_eq!(parse_port("8000").ok(), Some(8000));
    }

    #[test]
    fn flag_accepts_common_spellings() -> ConfigResult<()> {
        assert!(parse_flag("strict_bounds", "TrUe")?);
        assert!(!parse_flag("strict_bounds", "off")?);
        assert!(parse_flag("strict_bounds", "maybe").is_err());
        Ok(())
    }

    #[test]
    fn quality_and_scale_are_bounded() {
        assert!(parse_quality("q", "0").is_err());
        assert!(parse_quality("q", "101").is_err());
        assert_eq!(parse_quality("q", "70").ok(), Some(70));
        assert!(parse_scale("s", "0").is_err());
        assert!(parse_scale("s", "nan").is_err());
        assert_eq!(parse_scale("s", "3").ok(), Some(3.0));
    }
}
