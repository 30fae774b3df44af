use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// May be left out of the file when given on the command line
    #[serde(default)]
    pub input: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub patterns: HashMap<String, PatternConfig>,
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default)]
    pub target_timezone: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub coercion: CoercionMode,
    #[serde(default)]
    pub on_undecodable: EncodingPolicy,
    #[serde(default)]
    pub reports: ReportConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_format() -> String {
    "generic".to_string()
}

impl Config {
    /// Minimal config for an input file, everything else defaulted
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: default_output_dir(),
            format: default_format(),
            patterns: HashMap::new(),
            exclude: None,
            target_timezone: None,
            chunk_size: None,
            coercion: CoercionMode::default(),
            on_undecodable: EncodingPolicy::default(),
            reports: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    pub regex: String,
    /// Names for positional groups, used only when the regex has no named groups
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub time_format: Option<String>,
    #[serde(default)]
    pub anchored: bool,
    #[serde(default)]
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Generic,
    Nginx,
}

/// Policy for numeric fields that fail to parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionMode {
    #[default]
    Nullify,
    Zero,
}

/// Policy for lines that are not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    #[default]
    Skip,
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_top_pages")]
    pub top_pages: usize,
    #[serde(default = "default_top_ips")]
    pub top_ips: usize,
    #[serde(default = "default_top_url_ip")]
    pub top_url_ip: usize,
    #[serde(default = "default_top_errors")]
    pub top_errors: usize,
    #[serde(default = "default_unique_visitors")]
    pub unique_visitors: usize,
    #[serde(default = "default_suspicious_bots")]
    pub suspicious_bots: usize,
}

fn default_true() -> bool {
    true
}

fn default_top_pages() -> usize {
    20
}

fn default_top_ips() -> usize {
    30
}

fn default_top_url_ip() -> usize {
    30
}

fn default_top_errors() -> usize {
    50
}

fn default_unique_visitors() -> usize {
    50
}

fn default_suspicious_bots() -> usize {
    20
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            top_pages: default_top_pages(),
            top_ips: default_top_ips(),
            top_url_ip: default_top_url_ip(),
            top_errors: default_top_errors(),
            unique_visitors: default_unique_visitors(),
            suspicious_bots: default_suspicious_bots(),
        }
    }
}
