// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Call-scoped invocation context.
//!
//! Every dispatched call runs inside its own task-local scope holding an
//! [`InvocationContext`]: the active method, the statements executed so far,
//! the locale and the debug flag. Code anywhere below the dispatcher (the
//! executor, filters, renderers) reaches it through the free functions of this
//! module without threading a parameter through every call.
//!
//! ```text
//! Dispatcher::dispatch ──► InvocationContext::scope(ctx, async { .. })
//!                                   │
//!             record_statement(..)  │  statements() / method() / locale()
//!                                   ▼
//!                          scope ends: context dropped
//! ```
//!
//! Outside a scope reads see an empty context and writes are ignored.
//! Concurrent calls on different tasks never share a context.
//!
//! A second task-local carries the active [`MethodTable`], letting a caller
//! swap the table for the duration of a future (see [`with_method_table`]).

use std::{cell::RefCell, future::Future, sync::Arc};

use tracing::trace;

use crate::method::{MethodDescriptor, MethodTable};

tokio::task_local! {
    static CONTEXT: RefCell<InvocationContext>;
    static METHOD_TABLE: Arc<MethodTable>;
}

/// Per-call diagnostic and configuration state.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    method:     Option<Arc<MethodDescriptor>>,
    statements: Vec<String>,
    locale:     Option<String>,
    debug:      bool
}

impl InvocationContext {
    /// Create an empty context.
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    /// Set the initial locale tag.
    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    /// Run `fut` with this context installed.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CONTEXT.scope(RefCell::new(self), fut).await
    }

    /// Run `f` synchronously with this context installed.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CONTEXT.sync_scope(RefCell::new(self), f)
    }

    /// Active method.
    pub fn method(&self) -> Option<&Arc<MethodDescriptor>> {
        self.method.as_ref()
    }

    /// Executed statements in order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Locale tag.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Debug flag.
    pub const fn debug(&self) -> bool {
        self.debug
    }
}

fn read<R>(f: impl FnOnce(&InvocationContext) -> R) -> Option<R> {
    CONTEXT.try_with(|ctx| f(&ctx.borrow())).ok()
}

fn write(op: &'static str, f: impl FnOnce(&mut InvocationContext)) {
    if CONTEXT.try_with(|ctx| f(&mut ctx.borrow_mut())).is_err() {
        trace!(op, "no invocation context in scope, write dropped");
    }
}

/// Check if the current task runs inside a scope.
pub fn is_active() -> bool {
    CONTEXT.try_with(|_| ()).is_ok()
}

/// Copy of the current context.
pub fn snapshot() -> InvocationContext {
    read(InvocationContext::clone).unwrap_or_default()
}

/// Record the method being executed.
pub fn set_method(method: Arc<MethodDescriptor>) {
    write("set_method", |ctx| ctx.method = Some(method));
}

/// Method recorded for this call.
pub fn method() -> Option<Arc<MethodDescriptor>> {
    read(|ctx| ctx.method.clone()).flatten()
}

/// Append an executed statement to the log.
pub fn record_statement(sql: impl Into<String>) {
    let sql = sql.into();
    write("record_statement", |ctx| ctx.statements.push(sql));
}

/// Statements recorded for this call.
pub fn statements() -> Vec<String> {
    read(|ctx| ctx.statements.clone()).unwrap_or_default()
}

/// Locale tag for this call.
pub fn locale() -> Option<String> {
    read(|ctx| ctx.locale.clone()).flatten()
}

/// Change the locale tag for the rest of this call.
pub fn set_locale(locale: impl Into<String>) {
    let locale = locale.into();
    write("set_locale", |ctx| ctx.locale = Some(locale));
}

/// Debug flag for this call.
pub fn debug() -> bool {
    read(InvocationContext::debug).unwrap_or(false)
}

/// Reset the context to its empty state.
pub fn clear() {
    write("clear", |ctx| *ctx = InvocationContext::default());
}

/// Run `fut` with `table` as the active method table.
pub async fn with_method_table<F: Future>(table: Arc<MethodTable>, fut: F) -> F::Output {
    METHOD_TABLE.scope(table, fut).await
}

/// Method table installed by [`with_method_table`], if any.
pub fn active_method_table() -> Option<Arc<MethodTable>> {
    METHOD_TABLE.try_with(Arc::clone).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_scope_is_inert() {
        assert!(!is_active());
        record_statement("SELECT 1");
        set_locale("zh_CN");
        assert!(statements().is_empty());
        assert_eq!(locale(), None);
        assert!(!debug());
        assert!(method().is_none());
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn dropped_write_is_traced() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            record_statement("SELECT 1");
            InvocationContext::default().sync_scope(|| record_statement("SELECT 2"));
        });

        let log = String::from_utf8_lossy(&capture.0.lock()).into_owned();
        assert_eq!(log.matches("write dropped").count(), 1);
        assert!(log.contains("record_statement"));
    }

    #[test]
    fn sync_scope_records() {
        let seen = InvocationContext::new(true).sync_scope(|| {
            record_statement("SELECT 1");
            record_statement("SELECT 2");
            assert!(debug());
            statements()
        });
        assert_eq!(seen, vec!["SELECT 1".to_string(), "SELECT 2".to_string()]);
        assert!(statements().is_empty());
    }

    #[test]
    fn clear_resets_everything() {
        let method = Arc::new(MethodDescriptor::builder("find").build().unwrap());
        InvocationContext::new(true)
            .with_locale(Some("en".into()))
            .sync_scope(|| {
                set_method(method);
                record_statement("SELECT 1");
                clear();
                let ctx = snapshot();
                assert!(ctx.method().is_none());
                assert!(ctx.statements().is_empty());
                assert_eq!(ctx.locale(), None);
                assert!(!ctx.debug());
            });
    }

    #[tokio::test]
    async fn async_scope_spans_awaits() {
        let out = InvocationContext::default()
            .scope(async {
                set_locale("zh_CN");
                tokio::task::yield_now().await;
                record_statement("UPDATE t SET a = ?");
                (locale(), statements())
            })
            .await;
        assert_eq!(out.0.as_deref(), Some("zh_CN"));
        assert_eq!(out.1, vec!["UPDATE t SET a = ?".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_scopes_are_isolated() {
        let handles: Vec<_> = (0..16)
            .map(|n| {
                tokio::spawn(InvocationContext::default().scope(async move {
                    for i in 0..8 {
                        record_statement(format!("task {n} stmt {i}"));
                        tokio::task::yield_now().await;
                    }
                    statements()
                }))
            })
            .collect();

        for (n, handle) in handles.into_iter().enumerate() {
            let log = handle.await.unwrap();
            assert_eq!(log.len(), 8);
            assert!(log.iter().all(|s| s.starts_with(&format!("task {n} "))));
        }
    }

    #[tokio::test]
    async fn method_table_override() {
        assert!(active_method_table().is_none());
        let table = Arc::new(MethodTable::builder().build());
        let seen = with_method_table(table.clone(), async { active_method_table() }).await;
        assert!(seen.is_some_and(|t| Arc::ptr_eq(&t, &table)));
    }
}
