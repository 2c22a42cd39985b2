// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Declared query templates.
//!
//! A [`QueryTemplate`] is the SQL text attached to a repository method plus
//! its ordered WHERE declarations. The `#{#where}` token marks where the
//! assembled clause goes:
//!
//! ```rust
//! use quarry_core::{Arguments, ConditionClause, ParamDescriptor, QueryTemplate, Value};
//!
//! let template = QueryTemplate::new("select no, name from student #{#where} order by age desc")
//!     .condition(ConditionClause::new("name like ?1"))
//!     .condition(ConditionClause::new("and age > ?2"));
//!
//! let params = [ParamDescriptor::new("name", "String"), ParamDescriptor::new("age", "Integer")];
//! let args = [Value::Null, Value::from(16)];
//! let rendered = template.render(&Arguments::new(&params, &args)).unwrap();
//!
//! assert_eq!(rendered.sql, "select no, name from student WHERE age > ? order by age desc");
//! assert_eq!(rendered.values, vec![Value::from(16)]);
//! ```
//!
//! Without the token, an assembled clause is appended at the end. A
//! statement that already ends in its own WHERE is continued with the
//! clause's connective (`AND` when it has none) instead of a second WHERE.

use crate::{
    condition::{ClauseSpec, ConditionClause, build_where, extend_where, validate_tokens},
    error::TranslationError,
    method::{Arguments, ParamDescriptor},
    placeholder::ParsedSql
};

/// Token replaced by the assembled WHERE clause.
pub const WHERE_TOKEN: &str = "#{#where}";

/// Rendered SQL text with its ordered bind values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlValue {
    /// SQL with `?` bind markers.
    pub sql:    String,
    /// Values for the markers, in order.
    pub values: Vec<crate::Value>
}

impl SqlValue {
    /// Create from text and values.
    pub fn new(sql: impl Into<String>, values: Vec<crate::Value>) -> Self {
        Self {
            sql: sql.into(),
            values
        }
    }
}

/// Keywords that open a top-level clause.
const CLAUSE_KEYWORDS: [&str; 9] =
    ["select", "from", "where", "group", "having", "order", "limit", "union", "set"];

/// Check if the last top-level clause of `sql` is an open WHERE.
///
/// Quoted literals and parenthesized subqueries are skipped.
fn where_is_open(sql: &str) -> bool {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut word = String::new();
    let mut last: Option<String> = None;

    for c in sql.chars().chain(std::iter::once(' ')) {
        if quoted {
            quoted = c != '\'';
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            word.push(c.to_ascii_lowercase());
            continue;
        }
        if depth == 0 && CLAUSE_KEYWORDS.contains(&word.as_str()) {
            last = Some(std::mem::take(&mut word));
        } else {
            word.clear();
        }
        match c {
            '\'' => quoted = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    last.as_deref() == Some("where")
}

#[derive(Debug, Clone)]
struct Split {
    head:      ParsedSql,
    tail:      Option<ParsedSql>,
    continues: bool
}

impl Split {
    fn parse(sql: &str) -> Self {
        let (head, tail) = match sql.split_once(WHERE_TOKEN) {
            Some((head, tail)) => (head, Some(ParsedSql::parse(tail))),
            None => (sql, None)
        };
        Self {
            head: ParsedSql::parse(head),
            tail,
            continues: where_is_open(head)
        }
    }

    fn validate(&self, params: &[ParamDescriptor]) -> Result<(), TranslationError> {
        validate_tokens(&self.head, params)?;
        if let Some(tail) = &self.tail {
            validate_tokens(tail, params)?;
        }
        Ok(())
    }

    fn render(
        &self,
        clauses: &[ClauseSpec],
        args: &Arguments<'_>
    ) -> Result<SqlValue, TranslationError> {
        let (mut sql, mut values) = self
            .head
            .render(|t| args.resolve(t, self.head.source()).cloned())?;
        let where_clause = if self.continues {
            extend_where(clauses, args)?
        } else {
            build_where(clauses, args)?
        };

        if let Some(w) = where_clause {
            if self.tail.is_some() && !self.continues && sql.ends_with(char::is_whitespace) {
                sql.push_str("WHERE ");
            } else {
                let trimmed = sql.trim_end().len();
                sql.truncate(trimmed);
                sql.push_str(if self.continues { " " } else { " WHERE " });
            }
            sql.push_str(&w.sql);
            values.extend(w.values);
        }

        if let Some(tail) = &self.tail {
            let (tail_sql, tail_values) = tail.render(|t| args.resolve(t, tail.source()).cloned())?;
            sql.push_str(&tail_sql);
            values.extend(tail_values);
        }

        Ok(SqlValue::new(sql, values))
    }
}

/// SQL template declared on a repository method.
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    query:   Split,
    count:   Option<Split>,
    clauses: Vec<ClauseSpec>,
    text:    String
}

impl QueryTemplate {
    /// Create a template from SQL text.
    pub fn new(sql: &str) -> Self {
        Self {
            query:   Split::parse(sql),
            count:   None,
            clauses: Vec::new(),
            text:    sql.to_string()
        }
    }

    /// Attach the count statement used by paged execution.
    pub fn count(mut self, sql: &str) -> Self {
        self.count = Some(Split::parse(sql));
        self
    }

    /// Append a WHERE declaration.
    pub fn clause(mut self, clause: impl Into<ClauseSpec>) -> Self {
        self.clauses.push(clause.into());
        self
    }

    /// Append a conditional fragment.
    pub fn condition(self, clause: ConditionClause) -> Self {
        self.clause(clause)
    }

    /// Declared text of the data statement.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ordered WHERE declarations.
    pub fn clauses(&self) -> &[ClauseSpec] {
        &self.clauses
    }

    /// Check if a count statement is declared.
    pub const fn has_count(&self) -> bool {
        self.count.is_some()
    }

    /// Check every placeholder against `params`.
    ///
    /// # Errors
    ///
    /// Dangling placeholder references.
    pub fn validate(&self, params: &[ParamDescriptor]) -> Result<(), TranslationError> {
        self.query.validate(params)?;
        if let Some(count) = &self.count {
            count.validate(params)?;
        }
        self.clauses.iter().try_for_each(|c| c.validate(params))
    }

    /// Render the data statement for the given arguments.
    ///
    /// # Errors
    ///
    /// Dangling placeholder references.
    pub fn render(&self, args: &Arguments<'_>) -> Result<SqlValue, TranslationError> {
        self.query.render(&self.clauses, args)
    }

    /// Render the count statement for the given arguments.
    ///
    /// # Errors
    ///
    /// [`TranslationError::MissingCountQuery`] when none is declared.
    pub fn render_count(&self, args: &Arguments<'_>) -> Result<SqlValue, TranslationError> {
        match &self.count {
            Some(count) => count.render(&self.clauses, args),
            None => Err(TranslationError::MissingCountQuery(self.text.clone()))
        }
    }
}
