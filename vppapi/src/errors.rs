// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Failures of dataplane API calls.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{op} got no reply within {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("{op} failed with retval {retval}")]
    Retval { op: &'static str, retval: i32 },

    #[error("{op} could not be delivered: {reason}")]
    Transport { op: &'static str, reason: String },
}

impl ApiError {
    /// The name of the API call that failed.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            ApiError::Timeout { op, .. }
            | ApiError::Retval { op, .. }
            | ApiError::Transport { op, .. } => op,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
