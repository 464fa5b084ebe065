//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are collected
//! rather than stopping at the first one.

use std::fmt;
use std::net::IpAddr;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::schema::{FunctionConfig, ProxyConfig};
use crate::http::rules::HeaderRules;
use crate::security::headers::SYNTHESIZED_HEADERS;

/// Longest accepted function identifier (name or ARN).
pub const MAX_FUNCTION_NAME_LEN: usize = 170;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn function_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(arn:(aws[a-zA-Z-]*)?:lambda:)?([a-z]{2}(-gov)?-[a-z]+-\d{1}:)?(\d{12}:)?(function:)?([a-zA-Z0-9_.\-]+)(:(\$LATEST|[a-zA-Z0-9_\-]+))?$",
        )
        .expect("function name pattern is valid")
    })
}

/// Check a function identifier: a name, a partial ARN or a full ARN.
pub fn validate_function_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("function name is required".to_string());
    }
    if name.len() > MAX_FUNCTION_NAME_LEN {
        return Err(format!(
            "function name must be between 1 and {MAX_FUNCTION_NAME_LEN} characters"
        ));
    }
    if !function_name_pattern().is_match(name) {
        return Err(format!(
            "invalid function name {name:?}: must be a valid function name, ARN, or partial ARN"
        ));
    }
    Ok(())
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    for (i, proxy) in config.client_ip.trusted_proxies.iter().enumerate() {
        if proxy.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::new(
                format!("client_ip.trusted_proxies[{i}]"),
                format!("{proxy:?} is not an IP address"),
            ));
        }
    }

    if config.functions.is_empty() {
        errors.push(ValidationError::new("functions", "at least one function is required"));
    }
    for (i, function) in config.functions.iter().enumerate() {
        validate_function(i, function, &mut errors);
        if function.timeout_secs > 0 && function.timeout_secs >= config.timeouts.request_secs {
            errors.push(ValidationError::new(
                format!("functions[{i}].timeout_secs"),
                format!(
                    "must be less than timeouts.request_secs ({})",
                    config.timeouts.request_secs
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_function(index: usize, function: &FunctionConfig, errors: &mut Vec<ValidationError>) {
    let field = |name: &str| format!("functions[{index}].{name}");

    if let Err(message) = validate_function_name(&function.name) {
        errors.push(ValidationError::new(field("name"), message));
    }
    if !function.path_prefix.starts_with('/') {
        errors.push(ValidationError::new(field("path_prefix"), "must start with '/'"));
    }
    if function.access_key.is_some() != function.secret_key.is_some() {
        errors.push(ValidationError::new(
            field("access_key"),
            "access_key and secret_key must be set together",
        ));
    }
    if function.timeout_secs == 0 {
        errors.push(ValidationError::new(field("timeout_secs"), "must be greater than zero"));
    }

    if let Err(e) = HeaderRules::compile(&function.header_up) {
        errors.push(ValidationError::new(field("header_up"), e.to_string()));
    }
    if let Err(e) = HeaderRules::compile(&function.header_down) {
        errors.push(ValidationError::new(field("header_down"), e.to_string()));
    }

    let up = &function.header_up;
    let touched = up
        .set
        .keys()
        .chain(up.add.keys())
        .chain(up.delete.iter())
        .chain(up.replace.iter().map(|r| &r.field));
    for name in touched {
        let lower = name.to_ascii_lowercase();
        if SYNTHESIZED_HEADERS.contains(&lower.as_str()) {
            tracing::warn!(
                function = %function.name,
                header = %lower,
                "header_up rule has no effect: the proxy always overwrites this header"
            );
        } else if lower == "x-forwarded-host" {
            tracing::warn!(
                function = %function.name,
                "Unnecessary header_up X-Forwarded-Host: the host header is already forwarded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{FunctionConfig, TlsConfig};

    fn config_with(function: FunctionConfig) -> ProxyConfig {
        ProxyConfig {
            functions: vec![function],
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn accepts_names_and_arns() {
        for name in [
            "my-function",
            "my_function.v2",
            "my-function:$LATEST",
            "my-function:live",
            "123456789012:function:my-function",
            "arn:aws:lambda:us-west-2:123456789012:function:my-function",
            "arn:aws-us-gov:lambda:us-gov-west-1:123456789012:function:fn:1",
        ] {
            assert!(validate_function_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_bad_names() {
        assert!(validate_function_name("").is_err());
        assert!(validate_function_name("has space").is_err());
        assert!(validate_function_name("fn/with/slash").is_err());
        assert!(validate_function_name(&"a".repeat(171)).is_err());
        assert!(validate_function_name(&"a".repeat(170)).is_ok());
    }

    #[test]
    fn default_config_requires_a_function() {
        let errors = validate_config(&ProxyConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "functions");
    }

    #[test]
    fn collects_all_errors() {
        let mut function = FunctionConfig::new("ok");
        function.access_key = Some("AKIA".into());
        function.timeout_secs = 0;
        function.path_prefix = "api".into();
        let mut config = config_with(function);
        config.client_ip.trusted_proxies = vec!["10.0.0.1".into(), "not-an-ip".into()];
        config.listener.tls = Some(TlsConfig {
            cert_path: String::new(),
            key_path: "key.pem".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.tls.cert_path",
                "client_ip.trusted_proxies[1]",
                "functions[0].path_prefix",
                "functions[0].access_key",
                "functions[0].timeout_secs",
            ]
        );
    }

    #[test]
    fn invoke_timeout_must_fit_inside_request_timeout() {
        let mut function = FunctionConfig::new("ok");
        function.timeout_secs = 60;
        let mut config = config_with(function);
        config.timeouts.request_secs = 60;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "functions[0].timeout_secs");

        config.functions[0].timeout_secs = 59;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_uncompilable_header_rules() {
        let mut function = FunctionConfig::new("ok");
        function.header_down.add.insert("bad name".into(), "x".into());
        let errors = validate_config(&config_with(function)).unwrap_err();
        assert_eq!(errors[0].field, "functions[0].header_down");
    }

    #[test]
    fn forwarding_header_rules_only_warn() {
        let mut function = FunctionConfig::new("ok");
        function
            .header_up
            .set
            .insert("X-Forwarded-For".into(), "1.2.3.4".into());
        assert!(validate_config(&config_with(function)).is_ok());
    }
}
