// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Convenient re-exports for common usage.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quarry_core::prelude::*;
//! ```

pub use crate::{
    AfterFilter, Bean, BeanTranslator, BeforeFilter, BeforeOutcome, ConditionClause,
    DispatchError, Dispatcher, EngineConfig, ExecutionError, FilterCall, FilterChain, HookError,
    Invocation, MethodDescriptor, MethodTable, Modifying, NamedQuery, NamedQueryPool,
    QueryExecutor, QueryTemplate, Repository, ReturnShape, SqlValue, Value, async_trait,
    context
};
