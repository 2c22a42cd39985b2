// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! # quarry
//!
//! Repository methods translated into parameterized SQL. Re-exports:
//! - [`Bean`](macro@Bean) derive macro from `quarry-derive-impl`
//! - All types from `quarry-core` ([`Dispatcher`], [`QueryTemplate`],
//!   [`ConditionClause`], [`BeanTranslator`], [`Repository`])
//!
//! # Quick Start
//!
//! ```rust
//! use quarry::{Bean, BeanTranslator};
//!
//! #[derive(Bean, Clone)]
//! pub struct UserInfo {
//!     #[id]
//!     pub id: Option<i32>,
//!     pub name: Option<String>,
//!     pub age: Option<i32>,
//! }
//!
//! let user = UserInfo { id: None, name: Some("A".into()), age: Some(1) };
//! let sql = BeanTranslator::default().insert(&user, false).unwrap();
//! assert_eq!(sql, "INSERT INTO UserInfo(name,age) VALUES('A','1')");
//! ```
//!
//! # Conditional Queries
//!
//! ```rust
//! use quarry::{ConditionClause, MethodDescriptor, QueryTemplate, Value};
//!
//! let method = MethodDescriptor::builder("find")
//!     .param("name", "String")
//!     .param("age", "Integer")
//!     .query(
//!         QueryTemplate::new("select * from student #{#where}")
//!             .condition(ConditionClause::new("name like ?1"))
//!             .condition(ConditionClause::new("and age > ?2"))
//!     )
//!     .build()
//!     .unwrap();
//!
//! let values = [Value::Null, Value::from(18)];
//! let args = method.arguments(&values).unwrap();
//! let sql = method.queries()[0].render(&args).unwrap();
//! assert_eq!(sql.sql, "select * from student WHERE age > ?");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub use quarry_core::*;
pub use quarry_derive_impl::Bean;

/// Core prelude plus the `Bean` derive.
pub mod prelude {
    pub use quarry_core::prelude::*;
    pub use quarry_derive_impl::Bean;
}
