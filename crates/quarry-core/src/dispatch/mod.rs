// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository method dispatcher.
//!
//! Turns one [`Invocation`] into one collaborator call:
//!
//! ```text
//!  Resolving ──► BeforeHooks ──► Classifying ──► Executing ──► AfterHooks ──► Done
//!      │             │  Return(v) ─────────────────────────────────────────►  │
//!      └─────────────┴───────────────┴───────────────┴─────────────┴──► Failed
//! ```
//!
//! Every call runs in its own [`InvocationContext`] scope. The context is
//! torn down exactly once when the call leaves the scope, whether it
//! succeeded, failed, was short-circuited by a filter, or was dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::builder(table, executor)
//!     .renderer(pool)
//!     .filters(FilterChain::new().before_filter(Auth))
//!     .config(EngineConfig::default())
//!     .build();
//!
//! let value = dispatcher
//!     .dispatch(Invocation::new("StudentDBService", "findOne", "(String)").arg("9921101"))
//!     .await?;
//! ```

mod classify;
mod executor;
mod filter;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering}
};

pub use classify::{Strategy, classify, decide};
pub use executor::{
    MethodQueryRequest, ModifyRequest, NamedQuery, NamedQueryPool, PageRequest, PageSource,
    QueryExecutor, QueryPool, QueryRenderer, QueryRequest
};
pub use filter::{AfterFilter, BeforeFilter, BeforeOutcome, FilterCall, FilterChain};
use tracing::{Instrument, debug, error, info, info_span};

use crate::{
    config::EngineConfig,
    context::{self, InvocationContext},
    error::{DispatchError, FailureKind, TranslationError},
    method::{MethodDescriptor, MethodTable},
    template::SqlValue,
    value::Value
};

/// Dispatcher state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Looking up the method.
    Resolving,
    /// Running before filters.
    BeforeHooks,
    /// Selecting the execution strategy.
    Classifying,
    /// Waiting on the executor.
    Executing,
    /// Running after filters.
    AfterHooks,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed
}

/// Caller-supplied identifiers and arguments of one call.
#[derive(Debug, Clone)]
pub struct Invocation {
    interface: String,
    method:    String,
    signature: String,
    args:      Vec<Value>,
    locale:    Option<String>
}

impl Invocation {
    /// Start an invocation of `interface::method signature`.
    pub fn new(
        interface: impl Into<String>,
        method: impl Into<String>,
        signature: impl Into<String>
    ) -> Self {
        Self {
            interface: interface.into(),
            method:    method.into(),
            signature: signature.into(),
            args:      Vec::new(),
            locale:    None
        }
    }

    /// Append one argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Replace all arguments.
    pub fn args(mut self, values: Vec<Value>) -> Self {
        self.args = values;
        self
    }

    /// Locale tag for this call.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Interface name.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Method name.
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Call counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    calls:          AtomicU64,
    failures:       AtomicU64,
    short_circuits: AtomicU64,
    teardowns:      AtomicU64
}

impl DispatchStats {
    /// Calls started.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Calls that ended in an error.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Calls answered by a before filter.
    pub fn short_circuits(&self) -> u64 {
        self.short_circuits.load(Ordering::Relaxed)
    }

    /// Context teardowns.
    pub fn teardowns(&self) -> u64 {
        self.teardowns.load(Ordering::Relaxed)
    }
}

struct Teardown<'a> {
    stats: &'a DispatchStats
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        context::clear();
        self.stats.teardowns.fetch_add(1, Ordering::Relaxed);
    }
}

/// Routes repository method calls to the executor.
pub struct Dispatcher {
    table:    Arc<MethodTable>,
    executor: Arc<dyn QueryExecutor>,
    renderer: Arc<dyn QueryRenderer>,
    pool:     Arc<dyn QueryPool>,
    filters:  FilterChain,
    config:   EngineConfig,
    stats:    DispatchStats
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.table.len())
            .field("filters", &self.filters)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    table:    Arc<MethodTable>,
    executor: Arc<dyn QueryExecutor>,
    renderer: Option<Arc<dyn QueryRenderer>>,
    pool:     Option<Arc<dyn QueryPool>>,
    filters:  FilterChain,
    config:   EngineConfig
}

impl DispatcherBuilder {
    /// Use `pool` both to render named queries and as the resettable pool.
    pub fn renderer<P>(mut self, pool: Arc<P>) -> Self
    where
        P: QueryRenderer + QueryPool + 'static
    {
        self.renderer = Some(pool.clone());
        self.pool = Some(pool);
        self
    }

    /// Override the pool reset on debug calls.
    pub fn pool(mut self, pool: Arc<dyn QueryPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the filter chain.
    pub fn filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Set the engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish. Missing renderer and pool default to an empty
    /// [`NamedQueryPool`].
    pub fn build(self) -> Dispatcher {
        let fallback = Arc::new(NamedQueryPool::new());
        let renderer: Arc<dyn QueryRenderer> = match self.renderer {
            Some(renderer) => renderer,
            None => fallback.clone()
        };
        let pool: Arc<dyn QueryPool> = match self.pool {
            Some(pool) => pool,
            None => fallback
        };
        Dispatcher {
            table: self.table,
            executor: self.executor,
            renderer,
            pool,
            filters: self.filters,
            config: self.config,
            stats: DispatchStats::default()
        }
    }
}

impl Dispatcher {
    /// Start building a dispatcher over `table` and `executor`.
    pub fn builder(table: Arc<MethodTable>, executor: Arc<dyn QueryExecutor>) -> DispatcherBuilder {
        DispatcherBuilder {
            table,
            executor,
            renderer: None,
            pool: None,
            filters: FilterChain::default(),
            config: EngineConfig::default()
        }
    }

    /// Call counters.
    pub const fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Dispatch one call.
    ///
    /// # Errors
    ///
    /// [`DispatchError`] wrapping the first failure, with the method and the
    /// statements recorded up to that point.
    pub async fn dispatch(&self, invocation: Invocation) -> Result<Value, DispatchError> {
        self.stats.calls.fetch_add(1, Ordering::Relaxed);
        let span = info_span!(
            "dispatch",
            interface = %invocation.interface,
            method = %invocation.method
        );
        let ctx = InvocationContext::new(self.config.debug).with_locale(invocation.locale.clone());

        ctx.scope(async {
            let _teardown = Teardown {
                stats: &self.stats
            };
            let mut state = DispatchState::Resolving;
            match self.run(&invocation, &mut state).await {
                Ok(value) => Ok(value),
                Err(kind) => Err(self.fail(kind, &mut state))
            }
        })
        .instrument(span)
        .await
    }

    fn fail(&self, kind: FailureKind, state: &mut DispatchState) -> DispatchError {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        let failed_in = *state;
        transition(state, DispatchState::Failed);
        let err = DispatchError::new(
            kind,
            context::method().map(|m| m.to_string()),
            context::statements(),
            failed_in
        );
        error!(state = ?failed_in, report = %err.report(), "dispatch failed");
        err
    }

    async fn run(
        &self,
        invocation: &Invocation,
        state: &mut DispatchState
    ) -> Result<Value, FailureKind> {
        let table = context::active_method_table().unwrap_or_else(|| Arc::clone(&self.table));
        let method = table.resolve(&invocation.interface, &invocation.method, &invocation.signature)?;
        context::set_method(Arc::clone(&method));

        if context::debug() {
            debug!(interface = %invocation.interface, "debug mode: resetting query pool");
            self.pool.reset(&invocation.interface);
        }

        transition(state, DispatchState::BeforeHooks);
        let call = FilterCall::new(
            invocation.interface.clone(),
            Arc::clone(&method),
            invocation.args.clone()
        );
        let target = match self.filters.before(&call).await? {
            BeforeOutcome::Proceed => method,
            BeforeOutcome::Redirect(replacement) => {
                context::set_method(Arc::clone(&replacement));
                replacement
            }
            BeforeOutcome::Return(value) => {
                self.stats.short_circuits.fetch_add(1, Ordering::Relaxed);
                transition(state, DispatchState::Done);
                return Ok(value);
            }
        };

        transition(state, DispatchState::Classifying);
        let strategy = classify(&target)?;

        transition(state, DispatchState::Executing);
        let result = self
            .execute(&invocation.interface, strategy, &target, &invocation.args)
            .await?;

        transition(state, DispatchState::AfterHooks);
        let result = self.filters.after(&call, result).await?;

        transition(state, DispatchState::Done);
        Ok(result)
    }

    async fn execute(
        &self,
        interface: &str,
        strategy: Strategy,
        method: &Arc<MethodDescriptor>,
        values: &[Value]
    ) -> Result<Value, FailureKind> {
        let args = method.arguments(values)?;
        let data_source = args.data_source();
        info!(method = %method, ?strategy, "executing");

        let value = match strategy {
            Strategy::Modifying => {
                let statements = if method.queries().is_empty() {
                    vec![self.renderer.render(interface, method, true, values)?]
                } else {
                    method
                        .queries()
                        .iter()
                        .map(|q| q.render(&args))
                        .collect::<Result<Vec<_>, _>>()?
                };
                statements.iter().for_each(record);
                self.executor
                    .modify(ModifyRequest {
                        method: Arc::clone(method),
                        statements,
                        modifying: method.modifying().cloned().unwrap_or_default(),
                        data_source
                    })
                    .await?
            }
            Strategy::NamedPage => {
                let query = self.renderer.render(interface, method, true, values)?;
                let count = match self.renderer.render(interface, method, false, values) {
                    Ok(count) => Some(count),
                    Err(TranslationError::MissingCountQuery(_)) => None,
                    Err(e) => return Err(e.into())
                };
                record(&query);
                count.iter().for_each(record);
                self.executor
                    .query_page(PageRequest {
                        method: Arc::clone(method),
                        source: PageSource::Rendered {
                            query,
                            count
                        },
                        data_source
                    })
                    .await?
            }
            Strategy::TemplatePage => {
                self.executor
                    .query_page(PageRequest {
                        method: Arc::clone(method),
                        source: PageSource::Templates {
                            templates: method.queries().to_vec(),
                            args:      values.to_vec()
                        },
                        data_source
                    })
                    .await?
            }
            Strategy::SingleQuery => {
                let statement = match method.queries().first() {
                    Some(template) => template.render(&args)?,
                    None => self.renderer.render(interface, method, true, values)?
                };
                record(&statement);
                self.executor
                    .query(QueryRequest {
                        method: Arc::clone(method),
                        statement,
                        data_source
                    })
                    .await?
            }
            Strategy::MethodQuery => {
                self.executor
                    .method_query(MethodQueryRequest {
                        method: Arc::clone(method),
                        args: values.to_vec(),
                        data_source
                    })
                    .await?
            }
        };
        Ok(value)
    }
}

fn transition(state: &mut DispatchState, next: DispatchState) {
    debug!(from = ?*state, to = ?next, "dispatch state");
    *state = next;
}

fn record(statement: &SqlValue) {
    context::record_statement(statement.sql.clone());
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        condition::ConditionClause,
        error::{ExecutionError, HookError, LookupError},
        method::{Modifying, ReturnShape},
        template::QueryTemplate
    };

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail:  bool
    }

    impl Recorder {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn answer(&self, label: String) -> Result<Value, ExecutionError> {
            self.calls.lock().push(label);
            if self.fail {
                Err(ExecutionError::new("connection refused"))
            } else {
                Ok(Value::from(1))
            }
        }
    }

    #[async_trait::async_trait]
    impl QueryExecutor for Recorder {
        async fn modify(&self, request: ModifyRequest) -> Result<Value, ExecutionError> {
            self.answer(format!("modify {}", request.statements.len()))
        }

        async fn query(&self, request: QueryRequest) -> Result<Value, ExecutionError> {
            self.answer(format!("query {}", request.statement.sql))
        }

        async fn query_page(&self, request: PageRequest) -> Result<Value, ExecutionError> {
            match request.source {
                PageSource::Rendered { .. } => self.answer("page rendered".into()),
                PageSource::Templates { .. } => self.answer("page templates".into())
            }
        }

        async fn method_query(&self, request: MethodQueryRequest) -> Result<Value, ExecutionError> {
            self.answer(format!("method {}", request.method.name()))
        }
    }

    fn table() -> Arc<MethodTable> {
        let find = MethodDescriptor::builder("find")
            .param("name", "String")
            .returns(ReturnShape::Rows)
            .query(
                QueryTemplate::new("select * from student #{#where}")
                    .condition(ConditionClause::new("name = ?1"))
            )
            .build()
            .unwrap();
        let update = MethodDescriptor::builder("update")
            .param("no", "String")
            .returns(ReturnShape::Affected)
            .query(QueryTemplate::new("update student set age = age + 1 where no = ?1"))
            .query(QueryTemplate::new("delete from log where no = ?1"))
            .modifying(Modifying::default())
            .build()
            .unwrap();
        let page = MethodDescriptor::builder("page")
            .returns(ReturnShape::Page)
            .query(QueryTemplate::new("select * from student"))
            .build()
            .unwrap();
        let derived = MethodDescriptor::builder("findByName")
            .param("name", "String")
            .build()
            .unwrap();
        Arc::new(
            MethodTable::builder()
                .register("Students", find)
                .unwrap()
                .register("Students", update)
                .unwrap()
                .register("Students", page)
                .unwrap()
                .register("Students", derived)
                .unwrap()
                .build()
        )
    }

    fn dispatcher(executor: Arc<Recorder>) -> Dispatcher {
        Dispatcher::builder(table(), executor).build()
    }

    #[tokio::test]
    async fn routes_each_strategy() {
        let executor = Arc::new(Recorder::default());
        let d = dispatcher(executor.clone());

        d.dispatch(Invocation::new("Students", "find", "(String)").arg("Lily"))
            .await
            .unwrap();
        d.dispatch(Invocation::new("Students", "update", "(String)").arg("1"))
            .await
            .unwrap();
        d.dispatch(Invocation::new("Students", "page", "()")).await.unwrap();
        d.dispatch(Invocation::new("Students", "findByName", "(String)").arg("x"))
            .await
            .unwrap();

        assert_eq!(
            *executor.calls.lock(),
            vec![
                "query select * from student WHERE name = ?".to_string(),
                "modify 2".to_string(),
                "page templates".to_string(),
                "method findByName".to_string()
            ]
        );
        assert_eq!(d.stats().calls(), 4);
        assert_eq!(d.stats().teardowns(), 4);
    }

    #[tokio::test]
    async fn unknown_method_fails_while_resolving() {
        let d = dispatcher(Arc::new(Recorder::default()));
        let err = d
            .dispatch(Invocation::new("Students", "missing", "()"))
            .await
            .unwrap_err();
        assert_eq!(err.state(), DispatchState::Resolving);
        assert!(err.method().is_none());
        assert!(matches!(err.kind(), FailureKind::Lookup(LookupError::UnknownMethod { .. })));
        assert_eq!(d.stats().failures(), 1);
        assert_eq!(d.stats().teardowns(), 1);
    }

    #[tokio::test]
    async fn execution_failure_carries_statements() {
        let d = dispatcher(Arc::new(Recorder::failing()));
        let err = d
            .dispatch(Invocation::new("Students", "update", "(String)").arg("1"))
            .await
            .unwrap_err();
        assert_eq!(err.state(), DispatchState::Executing);
        assert_eq!(err.method(), Some("Students::update(String)"));
        assert_eq!(
            err.statements(),
            &[
                "update student set age = age + 1 where no = ?".to_string(),
                "delete from log where no = ?".to_string()
            ]
        );
        assert_eq!(d.stats().teardowns(), 1);
    }

    #[tokio::test]
    async fn argument_count_mismatch() {
        let d = dispatcher(Arc::new(Recorder::default()));
        let err = d
            .dispatch(Invocation::new("Students", "find", "(String)"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            FailureKind::Translation(TranslationError::ArgumentCount { expected: 1, found: 0, .. })
        ));
    }

    struct Deny;

    #[async_trait::async_trait]
    impl BeforeFilter for Deny {
        async fn before(&self, _call: &FilterCall) -> Result<BeforeOutcome, HookError> {
            Err(HookError::new("deny", "not allowed"))
        }
    }

    #[tokio::test]
    async fn hook_failure_before_execution() {
        let executor = Arc::new(Recorder::default());
        let d = Dispatcher::builder(table(), executor.clone())
            .filters(FilterChain::new().before_filter(Deny))
            .build();
        let err = d
            .dispatch(Invocation::new("Students", "page", "()"))
            .await
            .unwrap_err();
        assert_eq!(err.state(), DispatchState::BeforeHooks);
        assert!(matches!(err.kind(), FailureKind::Hook(_)));
        assert!(executor.calls.lock().is_empty());
        assert_eq!(d.stats().failures(), 1);
        assert_eq!(d.stats().teardowns(), 1);
    }

    struct Gate {
        seen: Arc<Mutex<Vec<(String, String, Vec<Value>)>>>
    }

    #[async_trait::async_trait]
    impl BeforeFilter for Gate {
        async fn before(&self, call: &FilterCall) -> Result<BeforeOutcome, HookError> {
            self.seen.lock().push((
                call.interface().to_string(),
                call.method().name().to_string(),
                call.args().to_vec()
            ));
            Ok(BeforeOutcome::Proceed)
        }
    }

    #[tokio::test]
    async fn filters_see_target_interface() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let d = Dispatcher::builder(table(), Arc::new(Recorder::default()))
            .filters(FilterChain::new().before_filter(Gate {
                seen: seen.clone()
            }))
            .build();
        d.dispatch(Invocation::new("Students", "find", "(String)").arg("Lily"))
            .await
            .unwrap();
        assert_eq!(
            *seen.lock(),
            vec![("Students".to_string(), "find".to_string(), vec![Value::from("Lily")])]
        );
    }

    struct Reject;

    #[async_trait::async_trait]
    impl AfterFilter for Reject {
        async fn after(&self, _call: &FilterCall, _result: Value) -> Result<Value, HookError> {
            Err(HookError::new("reject", "result refused"))
        }
    }

    #[tokio::test]
    async fn hook_failure_after_execution() {
        let executor = Arc::new(Recorder::default());
        let d = Dispatcher::builder(table(), executor.clone())
            .filters(FilterChain::new().after_filter(Reject))
            .build();
        let err = d
            .dispatch(Invocation::new("Students", "find", "(String)").arg("Lily"))
            .await
            .unwrap_err();
        assert_eq!(err.state(), DispatchState::AfterHooks);
        assert!(matches!(err.kind(), FailureKind::Hook(_)));
        assert_eq!(err.method(), Some("Students::find(String)"));
        assert_eq!(err.statements(), &["select * from student WHERE name = ?".to_string()]);
        assert_eq!(executor.calls.lock().len(), 1);
        assert_eq!(d.stats().failures(), 1);
        assert_eq!(d.stats().teardowns(), 1);
    }
}
