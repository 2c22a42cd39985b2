// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime engine for quarry.
//!
//! Repository methods are declared as metadata (SQL templates, conditional
//! WHERE fragments, modifying markers) and dispatched at call time. This
//! crate holds everything that happens between a call and the collaborator
//! that talks to the database.
//!
//! # Overview
//!
//! | Module | Role |
//! |--------|------|
//! | [`condition`] | Decide which WHERE fragments take part in a call |
//! | [`template`] | Render declared SQL with the assembled WHERE clause |
//! | [`bean`] | INSERT / SELECT / UPDATE statements from records |
//! | [`method`] | Method descriptors and the method table |
//! | [`context`] | Call-scoped diagnostic state |
//! | [`dispatch`] | Classify a method and route it to the executor |
//! | [`config`] | Engine settings |
//!
//! # Usage
//!
//! Most users depend on `quarry`, which re-exports this crate together with
//! `#[derive(Bean)]`:
//!
//! ```rust,ignore
//! use quarry::prelude::*;
//!
//! struct Students {
//!     dispatcher: Dispatcher
//! }
//!
//! impl Repository for Students {
//!     const INTERFACE: &'static str = "StudentDBService";
//!
//!     fn dispatcher(&self) -> &Dispatcher {
//!         &self.dispatcher
//!     }
//! }
//!
//! let rows = students.invoke("find", "(String)", vec!["Lily".into()]).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bean;
pub mod condition;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod method;
pub mod placeholder;
pub mod prelude;
pub mod template;
pub mod value;

/// Re-export async_trait for collaborator implementations.
pub use async_trait::async_trait;
pub use bean::{Bean, BeanDescriptor, BeanTranslator, FieldDescriptor, UpdateStatement};
pub use condition::{ClauseSpec, ConditionClause, Evaluation, Pattern};
pub use config::{EmptyBeanPolicy, EngineConfig, IdentifierQuote};
pub use context::InvocationContext;
pub use dispatch::{
    AfterFilter, BeforeFilter, BeforeOutcome, DispatchState, DispatchStats, Dispatcher,
    DispatcherBuilder, FilterCall, FilterChain, Invocation, MethodQueryRequest, ModifyRequest,
    NamedQuery, NamedQueryPool, PageRequest, PageSource, QueryExecutor, QueryPool, QueryRenderer,
    QueryRequest, Strategy
};
pub use error::{
    BoxError, ClassificationError, ConfigError, DescriptorError, DispatchError, ExecutionError,
    FailureKind, HookError, LookupError, TranslationError
};
pub use method::{
    Arguments, MethodDescriptor, MethodDescriptorBuilder, MethodFeatures, MethodKey, MethodTable,
    MethodTableBuilder, Modifying, ParamDescriptor, ReturnShape
};
pub use template::{QueryTemplate, SqlValue, WHERE_TOKEN};
pub use value::Value;

/// A repository interface backed by a [`Dispatcher`].
///
/// Implementors name their interface and hand out the dispatcher; every
/// method call becomes an [`Invocation`] of that interface.
///
/// # Example
///
/// ```rust,ignore
/// impl Repository for StudentDBService {
///     const INTERFACE: &'static str = "StudentDBService";
///
///     fn dispatcher(&self) -> &Dispatcher {
///         &self.dispatcher
///     }
/// }
///
/// let affected = service
///     .invoke("update", "(String,String,Integer)", vec!["9512101".into(), "Tom".into(), 17.into()])
///     .await?;
/// ```
#[async_trait]
pub trait Repository: Send + Sync {
    /// Interface name used to resolve methods.
    const INTERFACE: &'static str;

    /// Dispatcher serving this interface.
    fn dispatcher(&self) -> &Dispatcher;

    /// Call `method` with `signature` and positional arguments.
    ///
    /// # Errors
    ///
    /// Whatever [`Dispatcher::dispatch`] reports.
    async fn invoke(
        &self,
        method: &str,
        signature: &str,
        args: Vec<Value>
    ) -> Result<Value, DispatchError> {
        self.dispatcher()
            .dispatch(Invocation::new(Self::INTERFACE, method, signature).args(args))
            .await
    }
}
