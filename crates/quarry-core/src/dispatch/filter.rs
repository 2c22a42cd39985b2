// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Before/after filters around business execution.
//!
//! Before filters run in registration order until one returns something
//! other than [`BeforeOutcome::Proceed`]. After filters run in registration
//! order, each receiving the previous filter's result.
//!
//! ```rust,ignore
//! struct Audit;
//!
//! #[async_trait]
//! impl AfterFilter for Audit {
//!     async fn after(&self, call: &FilterCall, result: Value) -> Result<Value, HookError> {
//!         tracing::info!(method = %call.method(), "completed");
//!         Ok(result)
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::{error::HookError, method::MethodDescriptor, value::Value};

/// The call as seen by filters.
///
/// Repositories are plain [`Repository`](crate::Repository) handles with no
/// state beyond their dispatcher, so the target of a call is identified by
/// its interface name. Filters that need per-repository behavior key it on
/// [`FilterCall::interface`].
#[derive(Debug, Clone)]
pub struct FilterCall {
    interface: String,
    method:    Arc<MethodDescriptor>,
    args:      Vec<Value>
}

impl FilterCall {
    /// Create a call view.
    pub fn new(interface: impl Into<String>, method: Arc<MethodDescriptor>, args: Vec<Value>) -> Self {
        Self {
            interface: interface.into(),
            method,
            args
        }
    }

    /// Repository interface name, identifying the call's target.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Resolved method (before any redirect).
    pub fn method(&self) -> &Arc<MethodDescriptor> {
        &self.method
    }

    /// Runtime arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// Result of the before phase.
#[derive(Debug, Clone)]
pub enum BeforeOutcome {
    /// Continue with the resolved method.
    Proceed,

    /// Execute this method instead.
    Redirect(Arc<MethodDescriptor>),

    /// Skip execution and after filters, return this value.
    Return(Value)
}

/// Runs before classification.
#[async_trait]
pub trait BeforeFilter: Send + Sync {
    /// Filter name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Inspect the call.
    ///
    /// # Errors
    ///
    /// [`HookError`] aborts the call.
    async fn before(&self, call: &FilterCall) -> Result<BeforeOutcome, HookError>;
}

/// Runs after business execution.
#[async_trait]
pub trait AfterFilter: Send + Sync {
    /// Filter name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Inspect or replace the result.
    ///
    /// # Errors
    ///
    /// [`HookError`] aborts the call.
    async fn after(&self, call: &FilterCall, result: Value) -> Result<Value, HookError>;
}

/// Ordered before and after filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    before: Vec<Arc<dyn BeforeFilter>>,
    after:  Vec<Arc<dyn AfterFilter>>
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("before", &self.before.iter().map(|b| b.name()).collect::<Vec<_>>())
            .field("after", &self.after.iter().map(|a| a.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl FilterChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a before filter.
    pub fn before_filter(mut self, filter: impl BeforeFilter + 'static) -> Self {
        self.before.push(Arc::new(filter));
        self
    }

    /// Append an after filter.
    pub fn after_filter(mut self, filter: impl AfterFilter + 'static) -> Self {
        self.after.push(Arc::new(filter));
        self
    }

    /// Run before filters.
    ///
    /// # Errors
    ///
    /// The first [`HookError`].
    pub async fn before(&self, call: &FilterCall) -> Result<BeforeOutcome, HookError> {
        for filter in &self.before {
            match filter.before(call).await? {
                BeforeOutcome::Proceed => {}
                outcome => {
                    tracing::debug!(filter = filter.name(), ?outcome, "before filter diverted call");
                    return Ok(outcome);
                }
            }
        }
        Ok(BeforeOutcome::Proceed)
    }

    /// Run after filters, threading the result through each.
    ///
    /// # Errors
    ///
    /// The first [`HookError`].
    pub async fn after(&self, call: &FilterCall, mut result: Value) -> Result<Value, HookError> {
        for filter in &self.after {
            result = filter.after(call, result).await?;
        }
        Ok(result)
    }

    /// Check if no filter is registered.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}
