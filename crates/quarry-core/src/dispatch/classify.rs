// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Execution strategy selection.
//!
//! | Query declared | Modifying | Page | Named | Strategy |
//! |----------------|-----------|------|-------|----------|
//! | yes | yes | any | any | [`Strategy::Modifying`] |
//! | yes | no | yes | yes | [`Strategy::NamedPage`] |
//! | yes | no | yes | no | [`Strategy::TemplatePage`] |
//! | yes | no | no | any | [`Strategy::SingleQuery`] |
//! | no | no | any | no | [`Strategy::MethodQuery`] |
//! | no | yes | any | no | error |
//!
//! "Query declared" means a template or a named-query reference.

use crate::{
    error::ClassificationError,
    method::{MethodDescriptor, MethodFeatures}
};

/// How a method is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// INSERT/UPDATE/DELETE through the modify collaborator.
    Modifying,
    /// Paged query rendered from a named query.
    NamedPage,
    /// Paged query over the raw declared templates.
    TemplatePage,
    /// One query, rendered up front.
    SingleQuery,
    /// Query derived from the method name.
    MethodQuery
}

/// Pure decision table over method features.
///
/// Returns `None` for a modifying method without any query.
pub const fn decide(features: MethodFeatures) -> Option<Strategy> {
    let has_query = features.has_template || features.has_named_query;
    match (has_query, features.modifying) {
        (true, true) => Some(Strategy::Modifying),
        (false, true) => None,
        (false, false) => Some(Strategy::MethodQuery),
        (true, false) if features.returns_page && features.has_named_query => {
            Some(Strategy::NamedPage)
        }
        (true, false) if features.returns_page => Some(Strategy::TemplatePage),
        (true, false) => Some(Strategy::SingleQuery)
    }
}

/// Classify a method.
///
/// # Errors
///
/// [`ClassificationError::ModifyingWithoutQuery`] when the method is
/// modifying but declares no query.
pub fn classify(method: &MethodDescriptor) -> Result<Strategy, ClassificationError> {
    decide(method.features())
        .ok_or_else(|| ClassificationError::ModifyingWithoutQuery(method.to_string()))
}
