use std::ffi::OsString;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::descriptor::ArgKind;
use crate::shared::Annotation;

/// Failure of a decode call, or the help signal.
///
/// Variants before [`Error::NotEnoughRequiredArgs`] are schema errors caused
/// by the record's annotations. They are reported before any token is read.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing `{}` annotation for field `{field}`", Annotation::Primary)]
    MissingPrimaryAnnotation { field: &'static str },

    #[error("annotation `{annotation}` is empty for field `{field}`")]
    EmptyAnnotation { field: &'static str, annotation: Annotation },

    #[error("field `{field}` has unknown argument kind `{kind}`")]
    UnknownKind { field: &'static str, kind: String },

    #[error("field `{field}` has invalid `{annotation}` annotation: {reason}")]
    InvalidAnnotation { field: &'static str, annotation: Annotation, reason: String },

    #[error("not enough arguments, expected at least {expected}, got {actual}")]
    NotEnoughRequiredArgs { expected: usize, actual: usize },

    #[error("required {kind} argument `{description}` was not passed")]
    ArgNotFound { kind: ArgKind, description: String },

    #[error("wrong value for argument `{arg}`: {source}")]
    WrongArgValue {
        arg: String,
        #[source]
        source: ValueError,
    },

    /// Help was requested. Not a failure; the payload is the rendered help.
    #[error("{0}")]
    Help(String),
}

impl Error {
    #[must_use]
    pub fn is_help(&self) -> bool {
        matches!(self, Self::Help(_))
    }

    /// Get the help message if this is [`Error::Help`], or give back the error.
    pub fn try_into_help(self) -> Result<String, Self> {
        match self {
            Self::Help(msg) => Ok(msg),
            err => Err(err),
        }
    }
}

/// Failure converting a raw string or a JSON document into a typed value.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("invalid integer `{input}`: {source}")]
    InvalidInt {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid float `{input}`: {source}")]
    InvalidFloat {
        input: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("invalid boolean `{input}`")]
    InvalidBool { input: String },

    #[error("value `{input}` overflows {expected}")]
    Overflow { input: String, expected: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("value type differs from expected: {expected} != {actual}")]
    WrongValueType { expected: String, actual: String },

    #[error("invalid UTF-8 {0:?}")]
    InvalidUtf8(OsString),

    #[error("missing value after `{flag}`")]
    MissingValue { flag: String },

    #[error("not enough option values, required: {required}, passed: {passed}")]
    NotEnoughValues { required: usize, passed: usize },
}
