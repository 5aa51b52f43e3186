#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the discovery crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::path::{Path, PathBuf};

/// Unified error type returned by the API client, the discovery cycle and the
/// CLI.
///
/// Transport failures are split into [`Error::Transport`] for network-level
/// problems and [`Error::HttpStatus`] for non-success responses; use
/// [`Error::is_transport`] when the distinction does not matter. Signed URLs
/// and credentials are never captured in any variant.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Network-level failure while calling a CloudStack command.
    #[error("request for {command} command failed: {source}")]
    Transport {
        /// CloudStack command being executed.
        command: String,
        /// Underlying HTTP client error.
        source:  reqwest::Error
    },
    /// CloudStack answered with a non-success status code.
    #[error("unexpected response code for {command} command {status}: {body}")]
    HttpStatus {
        /// CloudStack command being executed.
        command: String,
        /// HTTP status code returned by the API.
        status:  u16,
        /// Raw response body kept for diagnostics.
        body:    String
    },
    /// Response body did not match the expected envelope.
    #[error("unexpected result data for {command} command: {source} - body: {body}")]
    Decode {
        /// CloudStack command being executed.
        command: String,
        /// JSON decoding error.
        source:  serde_json::Error,
        /// Raw response body kept for diagnostics.
        body:    String
    },
    /// Request signature could not be computed.
    #[error("failed to sign {command} command: {message}")]
    Signing {
        /// CloudStack command being signed.
        command: String,
        /// Human readable description of the failure.
        message: String
    },
    /// Wraps I/O errors raised while reading configuration or writing the
    /// discovery file.
    #[error("I/O failure at {path:?}: {source}")]
    Io {
        /// Location of the file being accessed.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps serialization errors when writing target groups.
    #[error("failed to serialize target groups: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps YAML decoding errors from the configuration file.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when the configuration violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Returns `true` for network-level and HTTP status failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
