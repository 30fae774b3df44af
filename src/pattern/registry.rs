use super::{builtin, Pattern, PatternError};
use crate::config::types::PatternConfig;
use std::collections::HashMap;
use tracing::warn;

/// Named patterns available to a run, loaded once at startup
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: HashMap<String, Pattern>,
}

impl PatternRegistry {
    /// Registry holding only the built-in formats
    pub fn builtin() -> Result<Self, PatternError> {
        let mut patterns = HashMap::new();
        for (name, config) in builtin::all() {
            patterns.insert(name.to_string(), Pattern::from_config(name, &config)?);
        }
        Ok(Self { patterns })
    }

    /// Built-ins plus user-defined patterns; a user pattern replaces a built-in of the same name
    pub fn from_config(user: &HashMap<String, PatternConfig>) -> Result<Self, PatternError> {
        let mut registry = Self::builtin()?;

        let mut names: Vec<&String> = user.keys().collect();
        names.sort();
        for name in names {
            let pattern = Pattern::from_config(name, &user[name])?;
            if registry.patterns.contains_key(name) {
                warn!(pattern = %name, "User pattern overrides built-in format");
            }
            registry.patterns.insert(name.clone(), pattern);
        }

        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<&Pattern, PatternError> {
        self.patterns
            .get(name)
            .ok_or_else(|| PatternError::UnknownFormat {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Sorted format identifiers
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
