// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Conditional WHERE-clause fragments.
//!
//! A [`ConditionClause`] is a fragment such as `AND age > ?3` that takes part
//! in the final SQL only when the runtime values of the parameters it
//! references qualify. Methods declare an ordered list of [`ClauseSpec`]s;
//! declaration order is the order of the fragments in the generated WHERE
//! clause.
//!
//! # Evaluation
//!
//! ```text
//! for each referenced value v (appearance order):
//!     ignore_null  && v is null        -> excluded
//!     ignore_empty && v is ""          -> excluded
//! allow  non-empty && no v matches any -> excluded
//! ignore non-empty && some v matches   -> excluded
//! otherwise                            -> included, ?n -> ?
//! ```
//!
//! Patterns are regular expressions matched against the whole textual form
//! of the value.

use regex::Regex;
use tracing::debug;

use crate::{
    error::TranslationError,
    method::{Arguments, ParamDescriptor},
    placeholder::ParsedSql,
    template::SqlValue,
    value::Value
};

/// Allow/ignore pattern anchored to the whole value.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex:  Regex
}

impl Pattern {
    /// Compile `pattern` as a full-match regular expression.
    ///
    /// # Errors
    ///
    /// [`TranslationError::InvalidPattern`] when the regex does not compile.
    pub fn new(pattern: &str) -> Result<Self, TranslationError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            TranslationError::InvalidPattern {
                pattern: pattern.to_string(),
                source
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex
        })
    }

    /// Pattern as declared.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether the whole text matches.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// One declarative, conditionally-included fragment.
#[derive(Debug, Clone)]
pub struct ConditionClause {
    sql:          ParsedSql,
    allow:        Vec<Pattern>,
    ignore:       Vec<Pattern>,
    ignore_null:  bool,
    ignore_empty: bool
}

/// Outcome of evaluating one clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Clause participates with this rendered text and bind values.
    Included(SqlValue),

    /// Clause contributes nothing.
    Excluded
}

impl ConditionClause {
    /// Create a clause with `ignore_null` and `ignore_empty` enabled.
    pub fn new(template: &str) -> Self {
        Self {
            sql:          ParsedSql::parse(template),
            allow:        Vec::new(),
            ignore:       Vec::new(),
            ignore_null:  true,
            ignore_empty: true
        }
    }

    /// Add an allow pattern.
    ///
    /// # Errors
    ///
    /// [`TranslationError::InvalidPattern`] when the pattern does not compile.
    pub fn allow(mut self, pattern: &str) -> Result<Self, TranslationError> {
        self.allow.push(Pattern::new(pattern)?);
        Ok(self)
    }

    /// Add an ignore pattern.
    ///
    /// # Errors
    ///
    /// [`TranslationError::InvalidPattern`] when the pattern does not compile.
    pub fn ignore(mut self, pattern: &str) -> Result<Self, TranslationError> {
        self.ignore.push(Pattern::new(pattern)?);
        Ok(self)
    }

    /// Set whether a null value excludes the clause.
    pub fn ignore_null(mut self, flag: bool) -> Self {
        self.ignore_null = flag;
        self
    }

    /// Set whether an empty string excludes the clause.
    pub fn ignore_empty(mut self, flag: bool) -> Self {
        self.ignore_empty = flag;
        self
    }

    /// Declared template text.
    pub fn template(&self) -> &str {
        self.sql.source()
    }

    /// Check that every placeholder names an existing parameter.
    ///
    /// # Errors
    ///
    /// [`TranslationError::UnknownParameter`] or
    /// [`TranslationError::UnknownNamedParameter`] for dangling references.
    pub fn validate(&self, params: &[ParamDescriptor]) -> Result<(), TranslationError> {
        validate_tokens(&self.sql, params)
    }

    /// Decide inclusion against the live arguments.
    ///
    /// # Errors
    ///
    /// Dangling placeholder references (normally caught by [`validate`]).
    ///
    /// [`validate`]: Self::validate
    pub fn evaluate(&self, args: &Arguments<'_>) -> Result<Evaluation, TranslationError> {
        let mut referenced = Vec::new();
        for token in self.sql.tokens() {
            referenced.push(args.resolve(token, self.template())?);
        }

        for value in &referenced {
            if self.ignore_null && value.is_null() {
                debug!(clause = self.template(), "condition excluded: null value");
                return Ok(Evaluation::Excluded);
            }
            if self.ignore_empty && value.is_empty_text() {
                debug!(clause = self.template(), "condition excluded: empty value");
                return Ok(Evaluation::Excluded);
            }
        }

        if !self.allow.is_empty() && !any_match(&referenced, &self.allow) {
            debug!(clause = self.template(), "condition excluded: no allow match");
            return Ok(Evaluation::Excluded);
        }

        if !self.ignore.is_empty() && any_match(&referenced, &self.ignore) {
            debug!(clause = self.template(), "condition excluded: ignore match");
            return Ok(Evaluation::Excluded);
        }

        let (sql, values) = self.sql.render(|token| {
            args.resolve(token, self.template()).map(Clone::clone)
        })?;
        Ok(Evaluation::Included(SqlValue::new(sql, values)))
    }
}

fn any_match(values: &[&Value], patterns: &[Pattern]) -> bool {
    values.iter().any(|v| {
        let text = v.to_string();
        patterns.iter().any(|p| p.matches(&text))
    })
}

pub(crate) fn validate_tokens(
    sql: &ParsedSql,
    params: &[ParamDescriptor]
) -> Result<(), TranslationError> {
    let empty: Vec<Value> = params.iter().map(|_| Value::Null).collect();
    let args = Arguments::new(params, &empty);
    for token in sql.tokens() {
        args.resolve(token, sql.source())?;
    }
    Ok(())
}

/// One entry of a method's ordered WHERE declaration.
#[derive(Debug, Clone)]
pub enum ClauseSpec {
    /// Free text, always included (placeholders bound unconditionally).
    Fragment(ParsedSql),

    /// Included per [`ConditionClause::evaluate`].
    Condition(ConditionClause)
}

impl ClauseSpec {
    /// Free-text fragment.
    pub fn fragment(text: &str) -> Self {
        Self::Fragment(ParsedSql::parse(text))
    }

    /// Validate placeholders against the method parameters.
    ///
    /// # Errors
    ///
    /// Dangling placeholder references.
    pub fn validate(&self, params: &[ParamDescriptor]) -> Result<(), TranslationError> {
        match self {
            Self::Fragment(sql) => validate_tokens(sql, params),
            Self::Condition(c) => c.validate(params)
        }
    }

    /// Evaluate this entry.
    ///
    /// # Errors
    ///
    /// Dangling placeholder references.
    pub fn evaluate(&self, args: &Arguments<'_>) -> Result<Evaluation, TranslationError> {
        match self {
            Self::Fragment(sql) => {
                let (text, values) =
                    sql.render(|token| args.resolve(token, sql.source()).map(Clone::clone))?;
                Ok(Evaluation::Included(SqlValue::new(text, values)))
            }
            Self::Condition(c) => c.evaluate(args)
        }
    }
}

impl From<ConditionClause> for ClauseSpec {
    fn from(c: ConditionClause) -> Self {
        Self::Condition(c)
    }
}

/// Evaluate clauses in declaration order and join the included ones.
///
/// Returns `None` when nothing is included.
///
/// # Errors
///
/// Dangling placeholder references.
pub fn build_where(
    clauses: &[ClauseSpec],
    args: &Arguments<'_>
) -> Result<Option<SqlValue>, TranslationError> {
    Ok(join_clauses(included(clauses, args)?))
}

/// Like [`build_where`], for a statement whose own WHERE is still open.
///
/// The first included fragment keeps its connective, or gets `AND`, so the
/// result can follow an existing predicate directly.
///
/// # Errors
///
/// Dangling placeholder references.
pub fn extend_where(
    clauses: &[ClauseSpec],
    args: &Arguments<'_>
) -> Result<Option<SqlValue>, TranslationError> {
    Ok(join(included(clauses, args)?, true))
}

fn included(clauses: &[ClauseSpec], args: &Arguments<'_>) -> Result<Vec<SqlValue>, TranslationError> {
    let mut parts = Vec::new();
    for clause in clauses {
        if let Evaluation::Included(part) = clause.evaluate(args)? {
            parts.push(part);
        }
    }
    Ok(parts)
}

/// Join fragments with their connectives.
///
/// A fragment starting with `AND`/`OR` keeps its own connective, any other
/// fragment is joined with `AND`. The first fragment loses its connective.
pub fn join_clauses(parts: Vec<SqlValue>) -> Option<SqlValue> {
    join(parts, false)
}

fn join(parts: Vec<SqlValue>, keep_leading: bool) -> Option<SqlValue> {
    let mut sql = String::new();
    let mut values = Vec::new();

    for part in parts {
        let text = part.sql.trim();
        if text.is_empty() {
            continue;
        }
        let (connective, body) = split_connective(text);
        if sql.is_empty() && !keep_leading {
            sql.push_str(body);
        } else {
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(connective.unwrap_or("AND"));
            sql.push(' ');
            sql.push_str(body);
        }
        values.extend(part.values);
    }

    if sql.is_empty() {
        None
    } else {
        Some(SqlValue::new(sql, values))
    }
}

fn split_connective(text: &str) -> (Option<&str>, &str) {
    let word_end = text.find(char::is_whitespace).unwrap_or(text.len());
    let word = &text[..word_end];
    if word.eq_ignore_ascii_case("and") || word.eq_ignore_ascii_case("or") {
        (Some(word), text[word_end..].trim_start())
    } else {
        (None, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<ParamDescriptor> {
        names.iter().map(|n| ParamDescriptor::new(*n, "String")).collect()
    }

    fn eval(clause: &ConditionClause, names: &[&str], values: Vec<Value>) -> Evaluation {
        let params = params(names);
        clause.evaluate(&Arguments::new(&params, &values)).unwrap()
    }

    #[test]
    fn null_excludes_when_ignore_null() {
        let clause = ConditionClause::new("age > ?1");
        assert_eq!(eval(&clause, &["age"], vec![Value::Null]), Evaluation::Excluded);
    }

    #[test]
    fn null_excludes_regardless_of_other_values() {
        let clause = ConditionClause::new("age between ?1 and ?2");
        assert_eq!(
            eval(&clause, &["from", "to"], vec![Value::from(1), Value::Null]),
            Evaluation::Excluded
        );
        assert_eq!(
            eval(&clause, &["from", "to"], vec![Value::Null, Value::from(9)]),
            Evaluation::Excluded
        );
    }

    #[test]
    fn null_included_when_not_ignored() {
        let clause = ConditionClause::new("dept is ?1").ignore_null(false);
        assert_eq!(
            eval(&clause, &["dept"], vec![Value::Null]),
            Evaluation::Included(SqlValue::new("dept is ?", vec![Value::Null]))
        );
    }

    #[test]
    fn empty_string_excludes() {
        let clause = ConditionClause::new("name like ?1");
        assert_eq!(eval(&clause, &["name"], vec![Value::from("")]), Evaluation::Excluded);
        let kept = ConditionClause::new("name like ?1").ignore_empty(false);
        assert!(matches!(
            eval(&kept, &["name"], vec![Value::from("")]),
            Evaluation::Included(_)
        ));
    }

    #[test]
    fn allow_requires_a_match() {
        let clause = ConditionClause::new("age > ?1").allow("\\d{2}").unwrap();
        assert!(matches!(
            eval(&clause, &["age"], vec![Value::from(18)]),
            Evaluation::Included(_)
        ));
        assert_eq!(eval(&clause, &["age"], vec![Value::from(7)]), Evaluation::Excluded);
    }

    #[test]
    fn allow_is_full_match() {
        let clause = ConditionClause::new("name = ?1").allow("ab").unwrap();
        assert_eq!(eval(&clause, &["name"], vec![Value::from("abc")]), Evaluation::Excluded);
    }

    #[test]
    fn allow_any_referenced_value() {
        let clause = ConditionClause::new("a = ?1 or b = ?2")
            .allow("yes")
            .unwrap();
        assert!(matches!(
            eval(&clause, &["a", "b"], vec![Value::from("no"), Value::from("yes")]),
            Evaluation::Included(_)
        ));
        assert_eq!(
            eval(&clause, &["a", "b"], vec![Value::from("no"), Value::from("nah")]),
            Evaluation::Excluded
        );
    }

    #[test]
    fn ignore_pattern_excludes() {
        let clause = ConditionClause::new("dept = ?1").ignore("无.*").unwrap();
        assert_eq!(eval(&clause, &["dept"], vec![Value::from("无派系")]), Evaluation::Excluded);
        assert!(matches!(
            eval(&clause, &["dept"], vec![Value::from("数学系")]),
            Evaluation::Included(_)
        ));
    }

    #[test]
    fn allow_checked_before_ignore() {
        let clause = ConditionClause::new("x = ?1")
            .allow("a.*")
            .unwrap()
            .ignore("ab")
            .unwrap();
        assert_eq!(eval(&clause, &["x"], vec![Value::from("ab")]), Evaluation::Excluded);
        assert!(matches!(
            eval(&clause, &["x"], vec![Value::from("ac")]),
            Evaluation::Included(_)
        ));
    }

    #[test]
    fn invalid_pattern_rejected() {
        let err = ConditionClause::new("x = ?1").allow("(").unwrap_err();
        assert!(matches!(err, TranslationError::InvalidPattern { .. }));
    }

    #[test]
    fn values_follow_template_order() {
        let clause = ConditionClause::new("b = ?2 and a = ?1");
        assert_eq!(
            eval(&clause, &["a", "b"], vec![Value::from("A"), Value::from("B")]),
            Evaluation::Included(SqlValue::new(
                "b = ? and a = ?",
                vec![Value::from("B"), Value::from("A")]
            ))
        );
    }

    #[test]
    fn clause_without_placeholders_always_included() {
        let clause = ConditionClause::new("deleted = 0");
        assert_eq!(
            eval(&clause, &[], vec![]),
            Evaluation::Included(SqlValue::new("deleted = 0", vec![]))
        );
    }

    #[test]
    fn validate_catches_dangling_reference() {
        let clause = ConditionClause::new("x = ?2");
        assert!(matches!(
            clause.validate(&params(&["x"])),
            Err(TranslationError::UnknownParameter { index: 2, .. })
        ));
        let named = ConditionClause::new("x = :y");
        assert!(matches!(
            named.validate(&params(&["x"])),
            Err(TranslationError::UnknownNamedParameter { .. })
        ));
    }

    #[test]
    fn join_strips_first_connective() {
        let joined = join_clauses(vec![
            SqlValue::new("AND a = ?", vec![Value::from(1)]),
            SqlValue::new("OR b = ?", vec![Value::from(2)]),
            SqlValue::new("c = ?", vec![Value::from(3)]),
        ])
        .unwrap();
        assert_eq!(joined.sql, "a = ? OR b = ? AND c = ?");
        assert_eq!(joined.values, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }

    #[test]
    fn join_of_nothing_is_none() {
        assert!(join_clauses(vec![]).is_none());
    }

    #[test]
    fn connective_must_be_a_whole_word() {
        let joined = join_clauses(vec![
            SqlValue::new("a = 1", vec![]),
            SqlValue::new("order_no = 2", vec![]),
        ])
        .unwrap();
        assert_eq!(joined.sql, "a = 1 AND order_no = 2");
    }

    #[test]
    fn build_where_preserves_declaration_order() {
        let params = params(&["name", "age"]);
        let args = vec![Value::from("Lily"), Value::from(16)];
        let args = Arguments::new(&params, &args);

        let forward = [
            ClauseSpec::from(ConditionClause::new("name like ?1")),
            ClauseSpec::from(ConditionClause::new("and age > ?2")),
        ];
        let backward = [
            ClauseSpec::from(ConditionClause::new("and age > ?2")),
            ClauseSpec::from(ConditionClause::new("name like ?1")),
        ];

        let a = build_where(&forward, &args).unwrap().unwrap();
        let b = build_where(&backward, &args).unwrap().unwrap();
        assert_eq!(a.sql, "name like ? and age > ?");
        assert_eq!(b.sql, "age > ? AND name like ?");
        assert_ne!(a.sql, b.sql);
        assert_eq!(b.values, vec![Value::from(16), Value::from("Lily")]);
    }

    #[test]
    fn extend_where_keeps_leading_connective() {
        let params = params(&["name", "age"]);
        let args = vec![Value::from("Lily"), Value::from(16)];
        let args = Arguments::new(&params, &args);

        let own = [
            ClauseSpec::from(ConditionClause::new("or name = ?1")),
            ClauseSpec::from(ConditionClause::new("and age > ?2")),
        ];
        let bare = [ClauseSpec::from(ConditionClause::new("age > ?2"))];

        assert_eq!(
            extend_where(&own, &args).unwrap().unwrap().sql,
            "or name = ? and age > ?"
        );
        assert_eq!(extend_where(&bare, &args).unwrap().unwrap().sql, "AND age > ?");
    }

    #[test]
    fn fragment_always_included() {
        let params = params(&["name"]);
        let args = vec![Value::Null];
        let where_clause = build_where(
            &[ClauseSpec::fragment("deleted = 0"), ConditionClause::new("and name = ?1").into()],
            &Arguments::new(&params, &args)
        )
        .unwrap()
        .unwrap();
        assert_eq!(where_clause.sql, "deleted = 0");
    }
}
