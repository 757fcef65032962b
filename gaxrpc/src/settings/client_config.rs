//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Loading of generated client configuration files.
//!
//! Generated clients ship a JSON file describing, per service interface,
//! named sets of retry codes, named backoff parameter sets, and which of them
//! each method uses:
//!
//! ```json
//! {
//!   "interfaces": {
//!     "google.showcase.v1beta1.Echo": {
//!       "retry_codes": { "idempotent": ["DEADLINE_EXCEEDED", "UNAVAILABLE"] },
//!       "retry_params": {
//!         "default": {
//!           "initial_retry_delay_millis": 100,
//!           "retry_delay_multiplier": 1.3,
//!           "max_retry_delay_millis": 60000,
//!           "initial_rpc_timeout_millis": 60000,
//!           "rpc_timeout_multiplier": 1.0,
//!           "max_rpc_timeout_millis": 60000,
//!           "total_timeout_millis": 600000
//!         }
//!       },
//!       "methods": {
//!         "Echo": {
//!           "timeout_millis": 60000,
//!           "retry_codes_name": "idempotent",
//!           "retry_params_name": "default"
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use super::{BackoffSettings, CallSettings, RetryOptions};
use crate::status::Code;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading a client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid client configuration JSON.
    #[error("malformed client config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service interface is not described.
    #[error("interface '{0}' not found in client config")]
    UnknownInterface(String),

    /// The method is not described by its interface.
    #[error("method '{method}' not found in interface '{interface}'")]
    UnknownMethod {
        /// Service interface name.
        interface: String,
        /// Method name.
        method: String,
    },

    /// A method refers to an undefined retry code set.
    #[error("retry codes '{0}' are not defined")]
    UnknownRetryCodes(String),

    /// A method refers to an undefined retry parameter set.
    #[error("retry params '{0}' are not defined")]
    UnknownRetryParams(String),
}

/// A parsed client configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Service interfaces keyed by fully-qualified name.
    #[serde(default)]
    pub interfaces: HashMap<String, InterfaceConfig>,
}

/// Configuration of one service interface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceConfig {
    /// Named retry code sets.
    #[serde(default)]
    pub retry_codes: HashMap<String, Vec<Code>>,
    /// Named backoff parameter sets.
    #[serde(default)]
    pub retry_params: HashMap<String, RetryParams>,
    /// Method entries keyed by method name.
    #[serde(default)]
    pub methods: HashMap<String, MethodEntry>,
}

/// Backoff parameters in milliseconds, as written in config files.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct RetryParams {
    pub initial_retry_delay_millis: Option<u64>,
    pub retry_delay_multiplier: Option<f64>,
    pub max_retry_delay_millis: Option<u64>,
    pub initial_rpc_timeout_millis: Option<u64>,
    pub rpc_timeout_multiplier: Option<f64>,
    pub max_rpc_timeout_millis: Option<u64>,
    pub total_timeout_millis: Option<u64>,
}

impl From<&RetryParams> for BackoffSettings {
    fn from(params: &RetryParams) -> Self {
        let defaults = BackoffSettings::default();
        BackoffSettings {
            initial_retry_delay: params
                .initial_retry_delay_millis
                .map_or(defaults.initial_retry_delay, Duration::from_millis),
            retry_delay_multiplier: params
                .retry_delay_multiplier
                .unwrap_or(defaults.retry_delay_multiplier),
            max_retry_delay: params
                .max_retry_delay_millis
                .map_or(defaults.max_retry_delay, Duration::from_millis),
            initial_rpc_timeout: params.initial_rpc_timeout_millis.map(Duration::from_millis),
            rpc_timeout_multiplier: params
                .rpc_timeout_multiplier
                .unwrap_or(defaults.rpc_timeout_multiplier),
            max_rpc_timeout: params.max_rpc_timeout_millis.map(Duration::from_millis),
            total_timeout: params.total_timeout_millis.map(Duration::from_millis),
            ..defaults
        }
    }
}

/// One method entry of an interface.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct MethodEntry {
    pub timeout_millis: Option<u64>,
    pub retry_codes_name: Option<String>,
    pub retry_params_name: Option<String>,
}

/// Resolved settings of a single method, independent of its message types.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodConfig {
    /// Call timeout.
    pub timeout: Duration,
    /// Retry codes and backoff, when the method is retried.
    pub retry: Option<(Vec<Code>, BackoffSettings)>,
}

impl ClientConfig {
    /// Parses a client configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves the settings of `method` in `interface`.
    ///
    /// Methods without a timeout use the default 30 second timeout. A method
    /// is retried only when it names both a retry code set and a parameter
    /// set.
    pub fn method_settings(
        &self,
        interface: &str,
        method: &str,
    ) -> Result<MethodConfig, ConfigError> {
        let service = self
            .interfaces
            .get(interface)
            .ok_or_else(|| ConfigError::UnknownInterface(interface.to_string()))?;
        let entry = service
            .methods
            .get(method)
            .ok_or_else(|| ConfigError::UnknownMethod {
                interface: interface.to_string(),
                method: method.to_string(),
            })?;

        let retry = match (&entry.retry_codes_name, &entry.retry_params_name) {
            (Some(codes_name), Some(params_name)) => {
                let codes = service
                    .retry_codes
                    .get(codes_name)
                    .ok_or_else(|| ConfigError::UnknownRetryCodes(codes_name.clone()))?;
                let params = service
                    .retry_params
                    .get(params_name)
                    .ok_or_else(|| ConfigError::UnknownRetryParams(params_name.clone()))?;
                Some((codes.clone(), BackoffSettings::from(params)))
            }
            _ => None,
        };

        Ok(MethodConfig {
            timeout: entry
                .timeout_millis
                .map_or(Duration::from_secs(30), Duration::from_millis),
            retry,
        })
    }
}

impl<Req, Resp> From<MethodConfig> for CallSettings<Req, Resp> {
    fn from(config: MethodConfig) -> Self {
        CallSettings {
            timeout: config.timeout,
            retry: config
                .retry
                .map(|(codes, backoff)| RetryOptions::new(codes, backoff)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "interfaces": {
            "google.showcase.v1beta1.Echo": {
                "retry_codes": {
                    "idempotent": ["DEADLINE_EXCEEDED", "UNAVAILABLE"],
                    "non_idempotent": []
                },
                "retry_params": {
                    "default": {
                        "initial_retry_delay_millis": 100,
                        "retry_delay_multiplier": 1.3,
                        "max_retry_delay_millis": 60000,
                        "initial_rpc_timeout_millis": 20000,
                        "rpc_timeout_multiplier": 1.0,
                        "max_rpc_timeout_millis": 20000,
                        "total_timeout_millis": 600000
                    }
                },
                "methods": {
                    "Echo": {
                        "timeout_millis": 60000,
                        "retry_codes_name": "idempotent",
                        "retry_params_name": "default"
                    },
                    "Chat": {
                        "timeout_millis": 5000
                    },
                    "Broken": {
                        "retry_codes_name": "missing",
                        "retry_params_name": "default"
                    }
                }
            }
        }
    }"#;

    const ECHO: &str = "google.showcase.v1beta1.Echo";

    #[test]
    fn test_retried_method() {
        let config = ClientConfig::from_json(CONFIG).unwrap();
        let method = config.method_settings(ECHO, "Echo").unwrap();
        assert_eq!(method.timeout, Duration::from_secs(60));

        let (codes, backoff) = method.retry.unwrap();
        assert_eq!(codes, vec![Code::DeadlineExceeded, Code::Unavailable]);
        assert_eq!(backoff.initial_rpc_timeout, Some(Duration::from_secs(20)));
        assert_eq!(backoff.total_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_method_without_retry() {
        let config = ClientConfig::from_json(CONFIG).unwrap();
        let method = config.method_settings(ECHO, "Chat").unwrap();
        assert_eq!(method.timeout, Duration::from_secs(5));
        assert!(method.retry.is_none());

        let settings: CallSettings<(), ()> = method.into();
        assert!(settings.retry.is_none());
        assert!(settings.is_bundling);
    }

    #[test]
    fn test_lookup_errors() {
        let config = ClientConfig::from_json(CONFIG).unwrap();
        assert!(matches!(
            config.method_settings("nope", "Echo"),
            Err(ConfigError::UnknownInterface(_))
        ));
        assert!(matches!(
            config.method_settings(ECHO, "Nope"),
            Err(ConfigError::UnknownMethod { .. })
        ));
        assert!(matches!(
            config.method_settings(ECHO, "Broken"),
            Err(ConfigError::UnknownRetryCodes(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            ClientConfig::from_json("{\"interfaces\": 3}"),
            Err(ConfigError::Parse(_))
        ));
    }
}
