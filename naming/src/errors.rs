// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The error results of mapping operations.

use store::StoreError;
use thiserror::Error;
use vppapi::{ApiError, ApiResult};

#[derive(Error, Debug, PartialEq)]
pub enum MappingError {
    /// A name or index had to be mapped and is not.
    #[error("No mapping for '{key}' in context {context}")]
    NotFound { context: String, key: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{op}: dataplane did not reply in time")]
    ReadTimeout { op: String, source: ApiError },

    #[error("{op}: read failed")]
    ReadFailed { op: String, source: ApiError },

    #[error("{op}: write failed")]
    WriteFailed { op: String, source: ApiError },

    /// Mappings are inconsistent. The transaction should be aborted.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MappingError {
    pub fn not_found(context: &str, key: impl ToString) -> Self {
        MappingError::NotFound {
            context: context.to_owned(),
            key: key.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, MappingError::NotFound { .. })
    }
}

pub type MappingResult<T> = Result<T, MappingError>;

/// Classify the failure of a dataplane call issued to read state.
///
/// # Errors
///
/// [`MappingError::ReadTimeout`] if the call timed out, [`MappingError::ReadFailed`] otherwise.
pub fn reply_for_read<T>(reply: ApiResult<T>, op: &str) -> MappingResult<T> {
    reply.map_err(|source| {
        if source.is_timeout() {
            MappingError::ReadTimeout {
                op: op.to_owned(),
                source,
            }
        } else {
            MappingError::ReadFailed {
                op: op.to_owned(),
                source,
            }
        }
    })
}

/// Classify the failure of a dataplane call issued to change state.
///
/// # Errors
///
/// [`MappingError::WriteFailed`], whatever the failure.
pub fn reply_for_write<T>(reply: ApiResult<T>, op: &str) -> MappingResult<T> {
    reply.map_err(|source| MappingError::WriteFailed {
        op: op.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timeouts_are_only_special_on_reads() {
        let timeout = || -> ApiResult<()> {
            Err(ApiError::Timeout {
                op: "acl_dump",
                after: Duration::from_secs(30),
            })
        };
        assert!(matches!(
            reply_for_read(timeout(), "read acls"),
            Err(MappingError::ReadTimeout { .. })
        ));
        assert!(matches!(
            reply_for_write(timeout(), "write acl"),
            Err(MappingError::WriteFailed { .. })
        ));
        let rejected: ApiResult<()> = Err(ApiError::Retval {
            op: "acl_dump",
            retval: -1,
        });
        assert!(matches!(
            reply_for_read(rejected, "read acls"),
            Err(MappingError::ReadFailed { .. })
        ));
    }
}
