// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Proc-macro implementation for quarry. Use the `quarry` crate instead.
//!
//! # Attribute Quick Reference
//!
//! ```rust,ignore
//! #[derive(Bean)]
//! #[bean(
//!     table = "user_info",      // Optional: table name (default: struct name)
//!     rename_all = "camelCase"  // Optional: column naming rule (default: "none")
//! )]
//! pub struct UserInfo {
//!     #[id]                           // Primary key, omitted from INSERT when null
//!     pub id: Option<i64>,
//!
//!     #[field(column = "user_name")]  // Explicit column name
//!     pub name: Option<String>,
//!
//!     #[field(skip)]                  // Never persisted
//!     pub cache: String,
//! }
//! ```
//!
//! Every persisted field type must be `Clone` and convertible into
//! `quarry::Value`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

mod bean;

use proc_macro::TokenStream;

/// Derive `quarry::Bean` for a struct with named fields.
///
/// Generates a static table/field descriptor and `field_values`, which
/// converts every persisted field into a `quarry::Value` in declaration
/// order.
///
/// # Example
///
/// ```rust,ignore
/// use quarry::{Bean, BeanTranslator};
///
/// #[derive(Bean, Clone)]
/// pub struct Student {
///     #[id]
///     pub no: String,
///     pub name: Option<String>,
///     pub age: Option<i32>,
/// }
///
/// let sql = BeanTranslator::default().insert(&student, false)?;
/// ```
#[proc_macro_derive(Bean, attributes(bean, id, field))]
pub fn derive_bean(input: TokenStream) -> TokenStream {
    bean::derive(input)
}
