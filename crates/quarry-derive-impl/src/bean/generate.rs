// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `Bean` trait implementation generation.
//!
//! # Generated Code
//!
//! For a bean `UserInfo { #[id] id, name, age }`:
//!
//! ```rust,ignore
//! impl ::quarry::Bean for UserInfo {
//!     const DESCRIPTOR: ::quarry::BeanDescriptor = ::quarry::BeanDescriptor::new(
//!         "UserInfo",
//!         &[
//!             ::quarry::FieldDescriptor::new("id", "id", true),
//!             ::quarry::FieldDescriptor::new("name", "name", false),
//!             ::quarry::FieldDescriptor::new("age", "age", false),
//!         ]
//!     );
//!
//!     fn field_values(&self) -> Vec<::quarry::Value> {
//!         vec![
//!             <::quarry::Value as From<Option<i32>>>::from(Clone::clone(&self.id)),
//!             <::quarry::Value as From<Option<String>>>::from(Clone::clone(&self.name)),
//!             <::quarry::Value as From<Option<i32>>>::from(Clone::clone(&self.age)),
//!         ]
//!     }
//! }
//! ```

use proc_macro2::TokenStream;
use quote::quote;

use super::parse::BeanDef;

/// Generate the `Bean` impl.
pub fn generate(bean: &BeanDef) -> TokenStream {
    let ident = &bean.ident;
    let table = &bean.table;
    let (impl_generics, ty_generics, where_clause) = bean.generics.split_for_impl();

    let descriptors = bean.fields.iter().map(|f| {
        let name = f.name();
        let column = &f.column;
        let primary_key = f.primary_key;
        quote! { ::quarry::FieldDescriptor::new(#name, #column, #primary_key) }
    });

    let values = bean.fields.iter().map(|f| {
        let field = &f.ident;
        let ty = &f.ty;
        quote! {
            <::quarry::Value as ::core::convert::From<#ty>>::from(
                ::core::clone::Clone::clone(&self.#field)
            )
        }
    });

    quote! {
        impl #impl_generics ::quarry::Bean for #ident #ty_generics #where_clause {
            const DESCRIPTOR: ::quarry::BeanDescriptor = ::quarry::BeanDescriptor::new(
                #table,
                &[#(#descriptors),*]
            );

            fn field_values(&self) -> ::std::vec::Vec<::quarry::Value> {
                ::std::vec![#(#values),*]
            }
        }
    }
}
