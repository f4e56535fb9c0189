use rolegate_invocation::{DEFAULT_THREAD_PREFIX, RunnerOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a [`RegistryConfig`].
#[derive(Error, Debug)]
pub enum RolegateConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    InvalidVariable {
        /// Name of the variable.
        variable: &'static str,
        /// Its raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A JSON document could not be parsed.
    #[error("Invalid registry configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Environment variable toggling post-mutation verification.
pub const VERIFY_MUTATIONS_VAR: &str = "ROLEGATE_VERIFY_MUTATIONS";
/// Environment variable naming the service thread prefix.
pub const SERVICE_THREAD_PREFIX_VAR: &str = "ROLEGATE_SERVICE_THREAD_PREFIX";
/// Environment variable holding the service thread stack size in bytes.
pub const SERVICE_STACK_SIZE_VAR: &str = "ROLEGATE_SERVICE_STACK_SIZE";

/// Tunables of a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Run the consistency verifier after every mutation. Defaults to on in
    /// debug builds.
    pub verify_mutations: bool,
    /// Prefix for the names of service threads.
    pub service_thread_prefix: String,
    /// Stack size of service threads in bytes; platform default if unset.
    pub service_stack_size: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verify_mutations: cfg!(debug_assertions),
            service_thread_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            service_stack_size: None,
        }
    }
}

impl RegistryConfig {
    /// Reads the configuration from `ROLEGATE_*` environment variables,
    /// falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, RolegateConfigError> {
        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Parses the configuration from a JSON document. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, RolegateConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, RolegateConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(VERIFY_MUTATIONS_VAR) {
            config.verify_mutations = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(RolegateConfigError::InvalidVariable {
                        variable: VERIFY_MUTATIONS_VAR,
                        value,
                        reason: "expected a boolean".into(),
                    });
                }
            };
        }

        if let Some(value) = lookup(SERVICE_THREAD_PREFIX_VAR) {
            config.service_thread_prefix = value;
        }

        if let Some(value) = lookup(SERVICE_STACK_SIZE_VAR) {
            let size = value
                .trim()
                .parse::<usize>()
                .map_err(|error| RolegateConfigError::InvalidVariable {
                    variable: SERVICE_STACK_SIZE_VAR,
                    value: value.clone(),
                    reason: error.to_string(),
                })?;
            config.service_stack_size = (size > 0).then_some(size);
        }

        Ok(config)
    }

    /// How service bodies are started under this configuration.
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            thread_prefix: self.service_thread_prefix.clone(),
            stack_size: self.service_stack_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let pairs = pairs
            .iter()
            .map(|(key, value)| (*key, value.to_string()))
            .collect::<HashMap<_, _>>();
        move |variable| pairs.get(variable).cloned()
    }

    #[test]
    fn it_defaults_when_nothing_is_set() -> anyhow::Result<()> {
        let config = RegistryConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.verify_mutations, cfg!(debug_assertions));
        assert_eq!(config.runner_options(), RunnerOptions::default());
        Ok(())
    }

    #[test]
    fn it_reads_environment_overrides() -> anyhow::Result<()> {
        let config = RegistryConfig::from_lookup(lookup(&[
            (VERIFY_MUTATIONS_VAR, "off"),
            (SERVICE_THREAD_PREFIX_VAR, "svc-"),
            (SERVICE_STACK_SIZE_VAR, "65536"),
        ]))?;

        assert_eq!(
            config,
            RegistryConfig {
                verify_mutations: false,
                service_thread_prefix: "svc-".into(),
                service_stack_size: Some(65536),
            }
        );
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_environment_values() {
        let error = RegistryConfig::from_lookup(lookup(&[(SERVICE_STACK_SIZE_VAR, "lots")]))
            .unwrap_err();
        assert!(matches!(
            error,
            RolegateConfigError::InvalidVariable {
                variable: SERVICE_STACK_SIZE_VAR,
                ..
            }
        ));

        assert!(RegistryConfig::from_lookup(lookup(&[(VERIFY_MUTATIONS_VAR, "maybe")])).is_err());
    }

    #[test]
    fn it_parses_partial_json() -> anyhow::Result<()> {
        let config = RegistryConfig::from_json(r#"{ "verify_mutations": true }"#)?;
        assert!(config.verify_mutations);
        assert_eq!(config.service_thread_prefix, DEFAULT_THREAD_PREFIX);

        assert!(RegistryConfig::from_json("{ \"service_stack_size\": \"big\" }").is_err());
        Ok(())
    }
}
