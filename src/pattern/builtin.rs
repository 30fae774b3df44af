use crate::config::types::{PatternConfig, StrategyKind};

pub const NGINX: &str = "nginx";
pub const GENERIC: &str = "generic";

pub const NGINX_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Nginx/Apache combined log format, matched from line start
pub fn nginx() -> PatternConfig {
    PatternConfig {
        regex: concat!(
            r"(?P<ip>\S+)\s+",
            r"\S+\s+",
            r"\S+\s+",
            r"\[(?P<time>[^\]]+)\]\s+",
            // A request of "-" (400, 408) leaves method and url empty
            r#""(?:(?P<method>\S+)\s+(?P<url>\S+)[^"]*|[^"]*)"\s+"#,
            r"(?P<status>\S+)\s+",
            r"(?P<size>\S+)\s+",
            r#""(?P<referrer>[^"]*)"\s+"#,
            r#""(?P<user_agent>[^"]*)""#,
        )
        .to_string(),
        fields: Vec::new(),
        time_format: Some(NGINX_TIME_FORMAT.to_string()),
        anchored: true,
        strategy: StrategyKind::Nginx,
    }
}

/// Loose access-log pattern that finds its fields anywhere in the line
pub fn generic() -> PatternConfig {
    PatternConfig {
        regex: concat!(
            r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}).*?",
            r"\[(.*?)\]\s",
            r#""(GET|POST|PUT|PATCH|HEAD|DELETE) (\S+).*?"\s"#,
            r"(\d{3})",
        )
        .to_string(),
        fields: ["ip", "time", "method", "url", "status"]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        time_format: Some(NGINX_TIME_FORMAT.to_string()),
        anchored: false,
        strategy: StrategyKind::Generic,
    }
}

pub fn all() -> Vec<(&'static str, PatternConfig)> {
    vec![(NGINX, nginx()), (GENERIC, generic())]
}
