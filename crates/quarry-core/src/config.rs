// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Engine configuration.
//!
//! Loaded from JSON (every key optional) or assembled in code with the
//! chained setters.
//!
//! ```json
//! {
//!   "debug": true,
//!   "identifierQuote": "backtick",
//!   "emptyBean": "reject",
//!   "schemaPlaceholder": "${dbpre}"
//! }
//! ```

use serde::Deserialize;

use crate::error::ConfigError;

/// Default token prefixed to table names when a schema prefix is requested.
///
/// Resolved later by the execution collaborator.
pub const DEFAULT_SCHEMA_PLACEHOLDER: &str = "${dbpre}";

/// How identifiers (tables, columns) are quoted in generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierQuote {
    /// Bare identifiers: `name`.
    #[default]
    None,

    /// ANSI double quotes: `"name"`.
    Ansi,

    /// MySQL backticks: `` `name` ``.
    Backtick
}

impl IdentifierQuote {
    /// Quote one identifier.
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Self::None => ident.to_string(),
            Self::Ansi => format!("\"{ident}\""),
            Self::Backtick => format!("`{ident}`")
        }
    }
}

/// What to do when a bean has no eligible field to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyBeanPolicy {
    /// Render the degenerate statement, e.g. `INSERT INTO T() VALUES()`.
    #[default]
    Allow,

    /// Fail with [`TranslationError::EmptyBean`](crate::TranslationError::EmptyBean).
    Reject
}

/// Engine-wide settings shared by the translator and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Debug mode: reset the query pool of the interface before every call.
    pub debug: bool,

    /// Identifier quoting style.
    pub identifier_quote: IdentifierQuote,

    /// Empty-bean translation policy.
    pub empty_bean: EmptyBeanPolicy,

    /// Token used by `insert(.., use_schema_prefix = true)`.
    pub schema_placeholder: String
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug:              false,
            identifier_quote:   IdentifierQuote::None,
            empty_bean:         EmptyBeanPolicy::Allow,
            schema_placeholder: DEFAULT_SCHEMA_PLACEHOLDER.to_string()
        }
    }
}

impl EngineConfig {
    /// Parse from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input or unknown keys.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set debug mode.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set identifier quoting.
    pub fn identifier_quote(mut self, quote: IdentifierQuote) -> Self {
        self.identifier_quote = quote;
        self
    }

    /// Set the empty-bean policy.
    pub fn empty_bean(mut self, policy: EmptyBeanPolicy) -> Self {
        self.empty_bean = policy;
        self
    }

    /// Set the schema placeholder token.
    pub fn schema_placeholder(mut self, token: impl Into<String>) -> Self {
        self.schema_placeholder = token.into();
        self
    }
}
