// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Column naming rule.
//!
//! This module defines [`RenameRule`], which derives column names from field
//! names when no explicit `#[field(column = "...")]` is given.

use convert_case::{Case, Casing};
use darling::FromMeta;

/// Column naming rule from `#[bean(rename_all = "...")]`.
///
/// | Value | `user_name` becomes |
/// |-------|---------------------|
/// | `"none"` (default) | `user_name` |
/// | `"camelCase"` | `userName` |
/// | `"PascalCase"` | `UserName` |
/// | `"snake_case"` | `user_name` |
/// | `"SCREAMING_SNAKE_CASE"` | `USER_NAME` |
/// | `"kebab-case"` | `user-name` |
/// | `"lowercase"` | `username` |
/// | `"UPPERCASE"` | `USERNAME` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameRule {
    /// Field name verbatim.
    #[default]
    None,
    /// `userName`.
    Camel,
    /// `UserName`.
    Pascal,
    /// `user_name`.
    Snake,
    /// `USER_NAME`.
    ScreamingSnake,
    /// `user-name`.
    Kebab,
    /// `username`.
    Lower,
    /// `USERNAME`.
    Upper
}

impl RenameRule {
    /// Apply the rule to a field name.
    pub fn apply(self, field: &str) -> String {
        match self {
            Self::None => field.to_string(),
            Self::Camel => field.to_case(Case::Camel),
            Self::Pascal => field.to_case(Case::Pascal),
            Self::Snake => field.to_case(Case::Snake),
            Self::ScreamingSnake => field.to_case(Case::Constant),
            Self::Kebab => field.to_case(Case::Kebab),
            Self::Lower => field.to_case(Case::Flat),
            Self::Upper => field.to_case(Case::UpperFlat)
        }
    }
}

impl FromMeta for RenameRule {
    fn from_string(value: &str) -> darling::Result<Self> {
        match value {
            "none" => Ok(Self::None),
            "camelCase" => Ok(Self::Camel),
            "PascalCase" => Ok(Self::Pascal),
            "snake_case" => Ok(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            "kebab-case" => Ok(Self::Kebab),
            "lowercase" => Ok(Self::Lower),
            "UPPERCASE" => Ok(Self::Upper),
            _ => Err(darling::Error::unknown_value(value))
        }
    }
}
