// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Error types.
//!
//! Each stage of a call has its own error kind. The dispatcher normalizes
//! all of them into a single outward-facing [`DispatchError`] that also
//! carries the diagnostic bundle (failing method, statements executed so far).
//!
//! | Kind | Raised by |
//! |------|-----------|
//! | [`LookupError`] | Method table resolution |
//! | [`ClassificationError`] | Decision table, descriptor validation |
//! | [`TranslationError`] | Templates, conditions, bean translator |
//! | [`ExecutionError`] | Query-execution collaborator |
//! | [`HookError`] | Before/after filters |
//! | [`DescriptorError`] | Method table construction |
//! | [`ConfigError`] | Configuration loading |

use std::error::Error as StdError;

use thiserror::Error;

use crate::dispatch::DispatchState;

/// Boxed error source from a collaborator.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Unresolvable interface or method identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No repository interface registered under this name.
    #[error("unknown repository interface '{0}'")]
    UnknownInterface(String),

    /// The interface exists but declares no such method.
    #[error("interface '{interface}' declares no method {method}{signature}")]
    UnknownMethod {
        /// Interface name.
        interface: String,
        /// Method name.
        method:    String,
        /// Method signature.
        signature: String
    }
}

/// A method matches no classification rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    /// Modifying marker without any query template or named query.
    #[error("method '{0}' is marked modifying but declares no query")]
    ModifyingWithoutQuery(String)
}

/// Template, condition or bean metadata cannot be translated.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// `?n` refers to a parameter position the method does not have.
    #[error("placeholder ?{index} in '{template}' references a missing parameter")]
    UnknownParameter {
        /// Template text.
        template: String,
        /// 1-based parameter position.
        index:    usize
    },

    /// `:name` refers to a parameter name the method does not have.
    #[error("placeholder :{name} in '{template}' references a missing parameter")]
    UnknownNamedParameter {
        /// Template text.
        template: String,
        /// Parameter name.
        name:     String
    },

    /// `:name` in a custom update predicate is not a bean field.
    #[error("predicate token :{field} is not a field of '{table}'")]
    UnknownField {
        /// Table name.
        table: String,
        /// Token name.
        field: String
    },

    /// Key-based statement requested for a bean without primary key.
    #[error("bean '{0}' declares no primary key")]
    MissingPrimaryKey(String),

    /// Key-based update requested while the key value is null.
    #[error("primary key of '{0}' is null")]
    NullPrimaryKey(String),

    /// Bean with no eligible field and the reject policy is active.
    #[error("bean '{0}' has no eligible fields")]
    EmptyBean(String),

    /// Allow/ignore pattern is not a valid regular expression.
    #[error("invalid condition pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Regex compile error.
        #[source]
        source:  regex::Error
    },

    /// Wrong number of runtime arguments for the method.
    #[error("method '{method}' expects {expected} arguments, got {found}")]
    ArgumentCount {
        /// Method name.
        method:   String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        found:    usize
    },

    /// Named query id is unknown to the renderer.
    #[error("named query '{id}' is not registered for '{interface}'")]
    UnknownNamedQuery {
        /// Interface name.
        interface: String,
        /// Named query id.
        id:        String
    },

    /// A count statement was requested but none is declared.
    #[error("no count query declared for '{0}'")]
    MissingCountQuery(String)
}

/// A method descriptor or method table failed validation.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The method matches no classification rule.
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// A template or condition references a missing parameter.
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// Two methods registered under the same interface, name and signature.
    #[error("method {interface}::{method}{signature} registered twice")]
    Duplicate {
        /// Interface name.
        interface: String,
        /// Method name.
        method:    String,
        /// Method signature.
        signature: String
    }
}

/// Failure reported by the query-execution collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecutionError {
    message:   String,
    cancelled: bool,
    #[source]
    source:    Option<BoxError>
}

impl ExecutionError {
    /// Create an execution error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message:   message.into(),
            cancelled: false,
            source:    None
        }
    }

    /// Wrap an underlying driver error.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message:   message.into(),
            cancelled: false,
            source:    Some(source.into())
        }
    }

    /// The collaborator observed a cancellation or timeout.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            message:   message.into(),
            cancelled: true,
            source:    None
        }
    }

    /// Check if this failure stems from cancellation.
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Failure raised inside a before/after filter.
#[derive(Debug, Error)]
#[error("filter '{filter}' failed: {message}")]
pub struct HookError {
    /// Filter name.
    pub filter:  String,
    /// Failure message.
    pub message: String
}

impl HookError {
    /// Create a hook error.
    pub fn new(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filter:  filter.into(),
            message: message.into()
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed JSON or unknown enum value.
    #[error("invalid engine configuration: {0}")]
    Json(#[from] serde_json::Error)
}

/// Union of every failure a call can hit.
#[derive(Debug, Error)]
pub enum FailureKind {
    /// Method resolution failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Method could not be classified.
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// SQL could not be produced.
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// The execution collaborator failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A filter failed.
    #[error(transparent)]
    Hook(#[from] HookError)
}

/// The dispatcher's sole failure type.
///
/// Carries the original failure plus the diagnostic bundle captured from the
/// invocation context at the moment of failure.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct DispatchError {
    #[source]
    kind:       FailureKind,
    method:     Option<String>,
    statements: Vec<String>,
    state:      DispatchState
}

impl DispatchError {
    pub(crate) const fn new(
        kind: FailureKind,
        method: Option<String>,
        statements: Vec<String>,
        state: DispatchState
    ) -> Self {
        Self {
            kind,
            method,
            statements,
            state
        }
    }

    /// Underlying failure.
    pub const fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Consume into the underlying failure.
    pub fn into_kind(self) -> FailureKind {
        self.kind
    }

    /// Method active when the failure occurred, if one was resolved.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Statements recorded in this call before the failure.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Dispatcher state in which the failure occurred.
    pub const fn state(&self) -> DispatchState {
        self.state
    }

    /// Multi-line diagnostic report: message, method, executed SQL.
    pub fn report(&self) -> String {
        let mut out = self.kind.to_string();
        out.push('\n');
        out.push_str("method: ");
        out.push_str(self.method.as_deref().unwrap_or("<unresolved>"));
        out.push('\n');
        out.push_str("executed sql:");
        for sql in &self.statements {
            out.push('\n');
            out.push_str(sql);
        }
        out
    }
}
