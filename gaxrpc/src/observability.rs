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

//! Diagnostics and structured logging.
//!
//! - **[`Diagnostics`]**: sink for non-fatal warnings, such as a retry policy
//!   that sets both retry codes and a predicate. Each warning code is
//!   reported once per sink.
//! - **[`log_error`]**: logs a [`GaxError`] through `tracing` at a level
//!   matching its kind.
//!
//! # Examples
//!
//! ```rust
//! use gaxrpc::observability::Diagnostics;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! let diagnostics = Diagnostics::new();
//! let counter = Arc::new(AtomicU64::new(0));
//! let counter_clone = counter.clone();
//!
//! diagnostics.on_warning(move |_warning| {
//!     counter_clone.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! diagnostics.warn("deprecated_option", "option is deprecated");
//! diagnostics.warn("deprecated_option", "option is deprecated");
//!
//! assert_eq!(counter.load(Ordering::Relaxed), 1);
//! ```

use crate::error::GaxError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// A non-fatal configuration warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Stable identifier used for deduplication.
    pub code: String,
    /// Human readable description.
    pub message: String,
}

type WarningCallback = Box<dyn Fn(&Warning) + Send + Sync>;

/// Injected sink for warnings raised while preparing calls.
///
/// Every warning is logged with `tracing::warn!` and handed to the
/// registered callbacks. A given warning code is only reported once; later
/// warnings with the same code are dropped. Clones share callbacks and the
/// set of reported codes.
#[derive(Clone)]
pub struct Diagnostics {
    callbacks: Arc<Mutex<Vec<Arc<WarningCallback>>>>,
    emitted: Arc<Mutex<HashSet<String>>>,
}

impl Diagnostics {
    /// Creates a sink with no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: Arc::new(Mutex::new(Vec::new())),
            emitted: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Registers a callback invoked for every reported warning.
    pub fn on_warning<F>(&self, callback: F)
    where
        F: Fn(&Warning) + Send + Sync + 'static,
    {
        self.callbacks.lock().push(Arc::new(Box::new(callback)));
    }

    /// Reports a warning unless one with the same code was reported before.
    ///
    /// Returns `true` if the warning was reported.
    pub fn warn(&self, code: &str, message: &str) -> bool {
        if !self.emitted.lock().insert(code.to_string()) {
            return false;
        }

        tracing::warn!(warning = code, "{}", message);

        let warning = Warning {
            code: code.to_string(),
            message: message.to_string(),
        };
        // Callbacks run outside the lock so they may register more callbacks.
        let callbacks: Vec<_> = self.callbacks.lock().iter().cloned().collect();
        for callback in callbacks {
            callback(&warning);
        }
        true
    }

    /// Forgets which warnings were reported.
    pub fn reset(&self) {
        self.emitted.lock().clear();
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("callback_count", &self.callbacks.lock().len())
            .field("emitted", &self.emitted.lock().len())
            .finish()
    }
}

/// Logs an error with structured context.
///
/// - Configuration errors: ERROR level (a programming error in the client)
/// - Deadline and RPC errors: WARN level
/// - Cancellations: DEBUG level (the caller asked for it)
pub fn log_error(error: &GaxError) {
    match error {
        GaxError::Configuration { reason } => {
            tracing::error!(reason = %reason, "Invalid call configuration");
        }
        GaxError::Rpc(status) => {
            tracing::warn!(
                code = %status.code,
                message = %status.message,
                note = ?status.note,
                "RPC failed"
            );
        }
        GaxError::DeadlineExceeded { timeout, message } => {
            tracing::warn!(timeout = ?timeout, "Deadline exceeded: {}", message);
        }
        GaxError::Cancelled => {
            tracing::debug!("Call cancelled");
        }
    }
}
