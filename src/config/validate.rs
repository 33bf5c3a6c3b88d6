//! configuration validation stuff
use {
    crate::{config::options::*, validator, validator_nested},
    color_eyre::Result,
};

/// trait for validating config structs
pub trait Validate {
    /// validate the config
    fn validate(&self) -> Result<(), Vec<String>>;

    /// check if the config is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// check that a string is an http(s) url
fn is_http_url(v: &str) -> bool {
    url::Url::parse(v).is_ok_and(|u| u.scheme() == "http" || u.scheme() == "https")
}

validator! { RedditCfg,
    user_agent => |v: &String| !v.trim().is_empty(),
        "must not be empty";
    auth_url => |v: &String| is_http_url(v),
        "must be an http(s) url";
    api_url => |v: &String| is_http_url(v),
        "must be an http(s) url";
}

validator! { HttpConfig,
    pool_max_idle_per_host => |v: &usize| *v > 0,
        "must be greater than 0";
    pool_idle_timeout => |v: &u64| *v > 0,
        "must be greater than 0";
    timeout => |v: &u64| *v > 0,
        "must be greater than 0";
    connect_timeout => |v: &u64| *v > 0,
        "must be greater than 0";
    max_retries => |v: &u32| *v <= 10,
        "must be at most 10";
    retry_base_ms => |v: &u64| *v <= 60_000,
        "must be at most 60000";
}

validator! { FetchCfg,
    forum => |v: &String| !v.trim().is_empty() && !v.contains('/'),
        "must be a bare subreddit name";
    limit => |v: &usize| *v > 0,
        "must be greater than 0";
    page_size => |v: &usize| *v >= 1 && *v <= 100,
        "must be between 1 and 100";
    more_batch_size => |v: &usize| *v >= 1 && *v <= 100,
        "must be between 1 and 100";
}

validator! { ExportCfg,
    output => |v: &String| !v.trim().is_empty(),
        "must not be empty";
    delimiter => |v: &char| v.is_ascii() && !matches!(v, '"' | '\n' | '\r'),
        "must be a single ascii character other than a quote or newline";
}

/// valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

validator! { LoggingConfig,
    level => |v: &String| VALID_LOG_LEVELS.contains(&v.to_lowercase().as_str()),
        "must be one of: trace, debug, info, warn, error, off";
}

validator_nested! { SubExport,
    fields: {}
    nested: {
        reddit;
        http;
        fetch;
        export;
        logging;
    }
}

/// format a list of validation errors for display
pub fn format_validation_errors(errors: &[String]) -> String {
    let mut out = format!("{} invalid config value(s):", errors.len());
    for err in errors {
        out.push_str("\n  - ");
        out.push_str(err);
    }
    out
}
