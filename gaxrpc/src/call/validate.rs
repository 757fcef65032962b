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

//! Consistency checks of retry options against the method kind.

use super::descriptor::StreamDescriptor;
use crate::error::GaxError;
use crate::observability::Diagnostics;
use crate::retry::check_backoff_limits;
use crate::settings::RetryOptions;

/// Warning code raised when both retry codes and a predicate are set.
pub const RETRY_CODES_AND_PREDICATE: &str = "either_retrycodes_or_shouldretryfn";

/// Validates the effective retry options of one invocation.
///
/// Streaming methods may use a predicate; if retry codes are set as well they
/// are dropped with a warning. A resumption builder requires advanced
/// streaming retries. Non-streaming methods accept neither.
pub(crate) fn validate_retry<Req, Resp>(
    retry: Option<RetryOptions<Req, Resp>>,
    streaming: Option<StreamDescriptor>,
    diagnostics: &Diagnostics,
) -> Result<Option<RetryOptions<Req, Resp>>, GaxError> {
    let Some(mut retry) = retry else {
        return Ok(None);
    };

    match streaming {
        Some(descriptor) => {
            if !retry.retry_codes.is_empty() && retry.should_retry.is_some() {
                diagnostics.warn(
                    RETRY_CODES_AND_PREDICATE,
                    "Only one of retry_codes or should_retry may be set; ignoring retry_codes",
                );
                retry.retry_codes.clear();
            }
            if !descriptor.gax_streaming_retries && retry.resumption.is_some() {
                return Err(GaxError::configuration(
                    "A resumption request builder can only be used when gax_streaming_retries is enabled",
                ));
            }
        }
        None => {
            if retry.should_retry.is_some() {
                return Err(GaxError::configuration(
                    "Using a function to determine retry eligibility is only supported with server streaming calls",
                ));
            }
            if retry.resumption.is_some() {
                return Err(GaxError::configuration(
                    "Resumption strategy can only be used with server streaming retries",
                ));
            }
        }
    }

    check_backoff_limits(&retry.backoff)?;
    Ok(Some(retry))
}
