// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Bean definition parsing.
//!
//! [`BeanDef`] combines the struct-level `#[bean(...)]` options with the
//! parsed fields.
//!
//! # Supported Attributes
//!
//! | Attribute | Required | Default | Description |
//! |-----------|----------|---------|-------------|
//! | `table` | No | struct name | Table name |
//! | `rename_all` | No | `"none"` | Column naming rule |

mod field;
mod rename;


use darling::FromDeriveInput;
pub use field::FieldDef;
pub use rename::RenameRule;
use syn::{DeriveInput, Generics, Ident};

/// Struct-level attributes parsed from `#[bean(...)]`.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(bean), supports(struct_named))]
struct BeanAttrs {
    ident: Ident,

    generics: Generics,

    #[darling(default)]
    table: Option<String>,

    #[darling(default)]
    rename_all: RenameRule
}

/// Complete bean definition.
#[derive(Debug)]
pub struct BeanDef {
    /// Struct identifier.
    pub ident:    Ident,
    /// Struct generics.
    pub generics: Generics,
    /// Table name.
    pub table:    String,
    /// Persisted fields in declaration order.
    pub fields:   Vec<FieldDef>
}

impl BeanDef {
    /// Parse from derive input.
    ///
    /// # Errors
    ///
    /// - not a struct with named fields
    /// - more than one `#[id]` field
    /// - invalid `#[bean(...)]` or `#[field(...)]` options
    pub fn from_derive_input(input: &DeriveInput) -> darling::Result<Self> {
        let attrs = BeanAttrs::from_derive_input(input)?;

        let fields: Vec<FieldDef> = match &input.data {
            syn::Data::Struct(data) => match &data.fields {
                syn::Fields::Named(named) => named
                    .named
                    .iter()
                    .map(|f| FieldDef::from_field(f, attrs.rename_all))
                    .collect::<darling::Result<Vec<_>>>()?,
                _ => {
                    return Err(darling::Error::custom("Bean requires named fields")
                        .with_span(&input.ident));
                }
            },
            _ => {
                return Err(darling::Error::custom("Bean can only be derived for structs")
                    .with_span(&input.ident));
            }
        };

        if fields.iter().filter(|f| f.primary_key).count() > 1 {
            return Err(
                darling::Error::custom("Bean may have at most one field with #[id] attribute")
                    .with_span(&input.ident)
            );
        }

        let table = attrs.table.unwrap_or_else(|| attrs.ident.to_string());

        Ok(Self {
            ident: attrs.ident,
            generics: attrs.generics,
            table,
            fields: fields.into_iter().filter(|f| !f.skip).collect()
        })
    }

    /// Primary key field, if declared.
    #[cfg(test)]
    pub fn primary_key(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.primary_key)
    }
}
