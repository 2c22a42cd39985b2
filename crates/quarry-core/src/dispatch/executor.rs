// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Collaborators that run statements and render named queries.
//!
//! The dispatcher never talks to a database. It hands one request per call
//! to a [`QueryExecutor`]:
//!
//! | Strategy | Request | SQL |
//! |----------|---------|-----|
//! | Modifying | [`ModifyRequest`] | rendered, one per template |
//! | Named page | [`PageRequest`] with [`PageSource::Rendered`] | rendered data + count |
//! | Template page | [`PageRequest`] with [`PageSource::Templates`] | raw templates |
//! | Single query | [`QueryRequest`] | rendered |
//! | Method query | [`MethodQueryRequest`] | none, derived by the executor |
//!
//! Named queries come from a [`QueryRenderer`]. [`NamedQueryPool`] is the
//! bundled implementation: sources are registered per interface, parsed
//! into [`QueryTemplate`]s on first use and cached until
//! [`QueryPool::reset`].

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    condition::ConditionClause,
    error::{ExecutionError, TranslationError},
    method::{MethodDescriptor, Modifying},
    template::{QueryTemplate, SqlValue},
    value::Value
};

/// Modifying statements for one call.
#[derive(Debug, Clone)]
pub struct ModifyRequest {
    /// Executed method.
    pub method:      Arc<MethodDescriptor>,
    /// Statements in declaration order.
    pub statements:  Vec<SqlValue>,
    /// Re-read hints.
    pub modifying:   Modifying,
    /// Data source named by a source parameter.
    pub data_source: Option<String>
}

/// One rendered query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Executed method.
    pub method:      Arc<MethodDescriptor>,
    /// Rendered statement.
    pub statement:   SqlValue,
    /// Data source named by a source parameter.
    pub data_source: Option<String>
}

/// What a paged query is built from.
#[derive(Debug, Clone)]
pub enum PageSource {
    /// Already rendered data and count statements.
    Rendered {
        /// Data statement.
        query: SqlValue,
        /// Count statement, when declared.
        count: Option<SqlValue>
    },

    /// Raw templates, rendered by the executor with its own paging clause.
    Templates {
        /// Declared templates.
        templates: Vec<QueryTemplate>,
        /// Runtime arguments.
        args:      Vec<Value>
    }
}

/// One paged query.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Executed method.
    pub method:      Arc<MethodDescriptor>,
    /// Statement source.
    pub source:      PageSource,
    /// Data source named by a source parameter.
    pub data_source: Option<String>
}

/// A query derived from the method name.
#[derive(Debug, Clone)]
pub struct MethodQueryRequest {
    /// Executed method.
    pub method:      Arc<MethodDescriptor>,
    /// Runtime arguments.
    pub args:        Vec<Value>,
    /// Data source named by a source parameter.
    pub data_source: Option<String>
}

/// Runs statements and maps results.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute modifying statements.
    async fn modify(&self, request: ModifyRequest) -> Result<Value, ExecutionError>;

    /// Execute one query.
    async fn query(&self, request: QueryRequest) -> Result<Value, ExecutionError>;

    /// Execute a paged query.
    async fn query_page(&self, request: PageRequest) -> Result<Value, ExecutionError>;

    /// Execute a query derived from the method name.
    async fn method_query(&self, request: MethodQueryRequest) -> Result<Value, ExecutionError>;
}

/// Renders named queries.
pub trait QueryRenderer: Send + Sync {
    /// Render the data (`wants_data_query`) or count statement.
    ///
    /// # Errors
    ///
    /// Unknown ids and dangling placeholders.
    fn render(
        &self,
        interface: &str,
        method: &MethodDescriptor,
        wants_data_query: bool,
        args: &[Value]
    ) -> Result<SqlValue, TranslationError>;
}

/// Cache of parsed named queries.
pub trait QueryPool: Send + Sync {
    /// Drop everything cached for `interface`.
    fn reset(&self, interface: &str);
}

/// Source text of one named query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    id:         String,
    query:      String,
    count:      Option<String>,
    conditions: Vec<String>
}

impl NamedQuery {
    /// Create a named query.
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id:         id.into(),
            query:      query.into(),
            count:      None,
            conditions: Vec::new()
        }
    }

    /// Attach a count statement.
    pub fn count(mut self, sql: impl Into<String>) -> Self {
        self.count = Some(sql.into());
        self
    }

    /// Append a condition with default null/empty handling.
    pub fn condition(mut self, sql: impl Into<String>) -> Self {
        self.conditions.push(sql.into());
        self
    }

    /// Query id.
    pub fn id(&self) -> &str {
        &self.id
    }

    fn parse(&self) -> QueryTemplate {
        let mut template = QueryTemplate::new(&self.query);
        if let Some(count) = &self.count {
            template = template.count(count);
        }
        self.conditions
            .iter()
            .fold(template, |t, c| t.condition(ConditionClause::new(c)))
    }
}

type Cache = HashMap<String, HashMap<String, Arc<QueryTemplate>>>;

/// In-memory [`QueryRenderer`] and [`QueryPool`].
#[derive(Debug, Default)]
pub struct NamedQueryPool {
    sources: HashMap<String, HashMap<String, NamedQuery>>,
    cache:   RwLock<Cache>
}

impl NamedQueryPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named query under `interface`.
    pub fn with_query(mut self, interface: impl Into<String>, query: NamedQuery) -> Self {
        self.sources
            .entry(interface.into())
            .or_default()
            .insert(query.id.clone(), query);
        self
    }

    /// Number of parsed queries currently cached for `interface`.
    pub fn cached(&self, interface: &str) -> usize {
        self.cache.read().get(interface).map_or(0, HashMap::len)
    }

    fn template(&self, interface: &str, id: &str) -> Result<Arc<QueryTemplate>, TranslationError> {
        if let Some(hit) = self.cache.read().get(interface).and_then(|m| m.get(id)) {
            return Ok(Arc::clone(hit));
        }

        let source = self
            .sources
            .get(interface)
            .and_then(|m| m.get(id))
            .ok_or_else(|| TranslationError::UnknownNamedQuery {
                interface: interface.to_string(),
                id:        id.to_string()
            })?;
        debug!(interface, id, "parsing named query");

        let parsed = Arc::new(source.parse());
        self.cache
            .write()
            .entry(interface.to_string())
            .or_default()
            .insert(id.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }
}

impl QueryRenderer for NamedQueryPool {
    fn render(
        &self,
        interface: &str,
        method: &MethodDescriptor,
        wants_data_query: bool,
        args: &[Value]
    ) -> Result<SqlValue, TranslationError> {
        let id = method.named_query().unwrap_or_else(|| method.name());
        let template = self.template(interface, id)?;
        template.validate(method.params())?;
        let args = method.arguments(args)?;
        if wants_data_query {
            template.render(&args)
        } else {
            template.render_count(&args)
        }
    }
}

impl QueryPool for NamedQueryPool {
    fn reset(&self, interface: &str) {
        if self.cache.write().remove(interface).is_some() {
            debug!(interface, "named query cache reset");
        }
    }
}
