// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Bean derive macro implementation.
//!
//! # Architecture
//!
//! ```text
//! bean.rs (entry point)
//! ├── parse.rs     - #[bean(...)] and field attributes → BeanDef
//! └── generate.rs  - BeanDef → impl ::quarry::Bean
//! ```

mod generate;
pub mod parse;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

use self::parse::BeanDef;

/// Main entry point for the Bean derive macro.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match BeanDef::from_derive_input(&input) {
        Ok(bean) => generate::generate(&bean).into(),
        Err(err) => err.write_errors().into()
    }
}
