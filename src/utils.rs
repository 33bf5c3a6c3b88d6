//! utilities used across subexport
use {
    crate::error::Result,
    base64::{Engine, engine::general_purpose},
    reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue},
    tracing::Level,
};

/// make a basic auth header from an app's client id and secret
///
/// formats the id and secret into a single `id:secret` string, base64 encodes it and returns it
/// as an auth header for reqwest
///
/// # Errors
///
/// returns an error if the encoded credentials aren't a valid header value
pub fn create_auth_header(client_id: &str, client_secret: &str) -> Result<HeaderMap> {
    let auth_str = format!("{}:{}", client_id, client_secret);
    let encoded = general_purpose::STANDARD.encode(&auth_str);
    let auth_value = format!("Basic {}", encoded);
    let mut headers = HeaderMap::new();

    headers.insert(AUTHORIZATION, HeaderValue::from_str(&auth_value)?);

    Ok(headers)
}

/// convert a string to a log level
///
/// takes a given string and converts it into a [`tracing::Level`] for later use when setting up
/// tracing in the app module. `off` isn't a level, so callers check for it first
pub fn string_to_log_level(lvl: &str) -> Level {
    match lvl.to_lowercase().as_str() {
        "d" | "debug" | "dbg" => Level::DEBUG,
        "t" | "trace" | "trc" => Level::TRACE,
        "e" | "error" | "err" => Level::ERROR,
        "i" | "info" | "inf" => Level::INFO,
        "w" | "warn" | "wrn" => Level::WARN,
        _ => Level::ERROR,
    }
}

/// the first `max` characters of a string, with `...` if anything was cut
pub fn preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// turn a configured delimiter into the byte the csv writer wants
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| format!("delimiter {:?} is not a single ascii character", delimiter).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_header() {
        let headers = create_auth_header("id", "secret").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(string_to_log_level("DEBUG"), Level::DEBUG);
        assert_eq!(string_to_log_level("wrn"), Level::WARN);
        assert_eq!(string_to_log_level("nonsense"), Level::ERROR);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("✨✨✨", 2), "✨✨...");
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert!(delimiter_byte('é').is_err());
    }
}
