//! Dispatch configuration

use serde::{Deserialize, Serialize};

/// How stored arguments are matched against a method's declared arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArityPolicy {
    /// The stored argument count must equal the declared arity
    #[default]
    Strict,
    /// Extra stored arguments are dropped; too few is still an error
    Lenient,
}

impl ArityPolicy {
    /// Number of stored arguments to pass, or `None` if they do not fit
    pub fn select(self, stored: usize, declared: usize) -> Option<usize> {
        match self {
            ArityPolicy::Strict if stored == declared => Some(declared),
            ArityPolicy::Lenient if stored >= declared => Some(declared),
            _ => None,
        }
    }
}

impl std::str::FromStr for ArityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" | "truncate" => Ok(Self::Lenient),
            _ => Err(format!("Unknown arity policy: {}", s)),
        }
    }
}

/// Per-event dispatch settings
///
/// ```toml
/// [dispatch]
/// arity = "strict"        # strict, lenient
/// catch_panics = true
/// report_failures = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Stored-argument arity policy
    pub arity: ArityPolicy,
    /// Turn listener panics into handler faults instead of unwinding
    pub catch_panics: bool,
    /// Log failures as they happen
    pub report_failures: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            arity: ArityPolicy::Strict,
            catch_panics: true,
            report_failures: true,
        }
    }
}

impl DispatchConfig {
    /// Set the arity policy
    pub fn with_arity(mut self, arity: ArityPolicy) -> Self {
        self.arity = arity;
        self
    }

    /// Enable or disable panic isolation
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// Enable or disable failure logging
    pub fn with_report_failures(mut self, report_failures: bool) -> Self {
        self.report_failures = report_failures;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_policy_select() {
        assert_eq!(ArityPolicy::Strict.select(2, 2), Some(2));
        assert_eq!(ArityPolicy::Strict.select(3, 2), None);
        assert_eq!(ArityPolicy::Strict.select(1, 2), None);

        assert_eq!(ArityPolicy::Lenient.select(3, 2), Some(2));
        assert_eq!(ArityPolicy::Lenient.select(1, 2), None);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("STRICT".parse::<ArityPolicy>(), Ok(ArityPolicy::Strict));
        assert_eq!("truncate".parse::<ArityPolicy>(), Ok(ArityPolicy::Lenient));
        assert!("loose".parse::<ArityPolicy>().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DispatchConfig = serde_json::from_str(r#"{"arity":"lenient"}"#).unwrap();
        assert_eq!(config.arity, ArityPolicy::Lenient);
        assert!(config.catch_panics);
        assert!(config.report_failures);
    }
}
