use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, unexpanded_env_vars};
use crate::pattern::PatternRegistry;
use crate::pipeline::SpamFilter;
use crate::source::timestamp::TargetZone;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Load a config file and validate it
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load a config file without validating it, so command-line overrides can
/// still fill in or replace values
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    deserialize_config(&yaml_string)
}

/// Parse and validate config text
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let config = deserialize_config(yaml)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse config text into a `Config` with env vars and tildes expanded
pub fn deserialize_config(yaml: &str) -> Result<Config, ConfigError> {
    // Expand environment variables in the YAML string before parsing
    let yaml_string = expand_env_vars(yaml);

    // Comments are gone once parsed, so only real values are checked
    let value: serde_yaml::Value = serde_yaml::from_str(&yaml_string)?;
    let mut vars = Vec::new();
    collect_unexpanded_vars(&value, &mut vars);
    check_unexpanded_vars(vars)?;

    let mut config: Config = serde_yaml::from_value(value)?;

    config.input = expand_tilde(&config.input);
    config.output_dir = expand_tilde(&config.output_dir);

    Ok(config)
}

fn collect_unexpanded_vars(value: &serde_yaml::Value, vars: &mut Vec<String>) {
    use serde_yaml::Value;

    match value {
        Value::String(text) => vars.extend(unexpanded_env_vars(text)),
        Value::Sequence(items) => {
            for item in items {
                collect_unexpanded_vars(item, vars);
            }
        }
        Value::Mapping(mapping) => {
            for (key, item) in mapping {
                collect_unexpanded_vars(key, vars);
                collect_unexpanded_vars(item, vars);
            }
        }
        Value::Tagged(tagged) => collect_unexpanded_vars(&tagged.value, vars),
        _ => {}
    }
}

fn check_unexpanded_vars(mut vars: Vec<String>) -> Result<(), ConfigError> {
    vars.sort();
    vars.dedup();
    if vars.is_empty() {
        return Ok(());
    }

    let error_msg = if vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             Set them, or replace the references in the config file with actual values",
            vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

/// Check the settings that need nothing compiled: input, chunk size and
/// report limits
pub fn validate_settings(config: &Config) -> Result<(), ConfigError> {
    into_result(settings_errors(config))
}

/// Check everything that can be checked before the input is opened
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = settings_errors(config);

    match PatternRegistry::from_config(&config.patterns) {
        Ok(registry) => {
            if let Err(e) = registry.get(&config.format) {
                errors.push(format!("format: {}", e));
            }
        }
        Err(e) => errors.push(format!("patterns: {}", e)),
    }

    if let Err(e) = SpamFilter::new(config.exclude.as_deref()) {
        errors.push(format!("exclude: {}", e));
    }

    if let Some(tz) = config.target_timezone.as_deref() {
        if !tz.trim().is_empty() {
            if let Err(e) = TargetZone::parse(tz) {
                errors.push(format!("target_timezone: {}", e));
            }
        }
    }

    into_result(errors)
}

fn settings_errors(config: &Config) -> Vec<String> {
    let mut errors = Vec::new();

    if config.input.as_os_str().is_empty() {
        errors.push("input: path cannot be empty".to_string());
    }

    if config.chunk_size == Some(0) {
        errors.push("chunk_size must be a positive integer".to_string());
    }

    validate_reports(&config.reports, &mut errors);
    errors
}

fn into_result(errors: Vec<String>) -> Result<(), ConfigError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_reports(reports: &ReportConfig, errors: &mut Vec<String>) {
    let limits = [
        ("top_pages", reports.top_pages),
        ("top_ips", reports.top_ips),
        ("top_url_ip", reports.top_url_ip),
        ("top_errors", reports.top_errors),
        ("unique_visitors", reports.unique_visitors),
        ("suspicious_bots", reports.suspicious_bots),
    ];
    for (name, limit) in limits {
        if limit == 0 {
            errors.push(format!("reports.{}: limit must be at least 1", name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse_config("input: /var/log/nginx/access.log\n").unwrap();

        assert_eq!(config.format, "generic");
        assert_eq!(config.output_dir, Path::new("dist"));
        assert_eq!(config.coercion, CoercionMode::Nullify);
        assert_eq!(config.on_undecodable, EncodingPolicy::Skip);
        assert!(config.chunk_size.is_none());
        assert!(config.reports.enabled);
        assert_eq!(config.reports.top_pages, 20);
    }

    #[test]
    fn test_errors_are_collected() {
        let yaml = r#"
input: access.log
format: apache
chunk_size: 0
exclude: "admin/|("
target_timezone: Nowhere/Special
"#;

        let err = parse_config(yaml).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("chunk_size must be a positive integer"));
        assert!(msg.contains("unknown format 'apache'"));
        assert!(msg.contains("exclude:"));
        assert!(msg.contains("unknown timezone 'Nowhere/Special'"));
    }

    #[test]
    fn test_unknown_coercion_mode() {
        let result = parse_config("input: a.log\ncoercion: maybe\n");

        assert!(matches!(result, Err(ConfigError::YamlParse(_))));
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let yaml = "# input may use $env{LOGSIFT_ONLY_IN_COMMENT}\ninput: access.log # or $env{LOGSIFT_ALSO_IN_COMMENT}\n";

        let config = parse_config(yaml).unwrap();

        assert_eq!(config.input, Path::new("access.log"));
    }

    #[test]
    fn test_deserialize_without_input() {
        let config = deserialize_config("format: nginx\nchunk_size: 0\n").unwrap();

        assert!(config.input.as_os_str().is_empty());
        assert_eq!(config.chunk_size, Some(0));
        assert!(validate_settings(&config).is_err());
    }

    #[test]
    fn test_unset_env_var_reported() {
        let result = parse_config("input: $env{LOGSIFT_SURELY_UNSET}/access.log\n");

        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("LOGSIFT_SURELY_UNSET")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
