// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Field-level attribute parsing.
//!
//! | Attribute | Effect |
//! |-----------|--------|
//! | `#[id]` | Primary key: left out of INSERT when null |
//! | `#[field(column = "user_name")]` | Explicit column name |
//! | `#[field(skip)]` | Not persisted |

use darling::FromMeta;
use syn::{Field, Ident, Type};

use super::RenameRule;

/// Options of one `#[field(...)]` attribute.
#[derive(Debug, Default, FromMeta)]
pub struct FieldAttr {
    /// Explicit column name.
    #[darling(default)]
    pub column: Option<String>,

    /// Exclude from every statement.
    #[darling(default)]
    pub skip: bool
}

/// Parsed bean field.
#[derive(Debug)]
pub struct FieldDef {
    /// Field identifier.
    pub ident:       Ident,
    /// Field type, spelled out in the generated conversion.
    pub ty:          Type,
    /// Column name after renaming.
    pub column:      String,
    /// Marked with `#[id]`.
    pub primary_key: bool,
    /// Marked with `#[field(skip)]`.
    pub skip:        bool
}

impl FieldDef {
    /// Parse a named field.
    ///
    /// # Errors
    ///
    /// - unnamed (tuple) field
    /// - malformed `#[field(...)]`
    /// - `#[id]` combined with `#[field(skip)]`
    pub fn from_field(field: &Field, rename: RenameRule) -> darling::Result<Self> {
        let ident = field.ident.clone().ok_or_else(|| {
            darling::Error::custom("Bean fields must be named").with_span(field)
        })?;

        let mut primary_key = false;
        let mut options = FieldAttr::default();

        for attr in &field.attrs {
            if attr.path().is_ident("id") {
                primary_key = true;
            } else if attr.path().is_ident("field") {
                options = FieldAttr::from_meta(&attr.meta)?;
            }
        }

        if primary_key && options.skip {
            return Err(
                darling::Error::custom("#[id] field cannot be #[field(skip)]").with_span(&ident)
            );
        }

        let name = ident.to_string();
        let name = name.strip_prefix("r#").unwrap_or(&name);
        let column = options.column.unwrap_or_else(|| rename.apply(name));

        Ok(Self {
            ident,
            ty: field.ty.clone(),
            column,
            primary_key,
            skip: options.skip
        })
    }

    /// Field name as seen by `:name` predicate tokens.
    pub fn name(&self) -> String {
        let name = self.ident.to_string();
        name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
    }
}
