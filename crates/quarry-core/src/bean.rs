// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Bean-to-SQL translation.
//!
//! A bean is any record implementing [`Bean`], usually through
//! `#[derive(Bean)]`. Its [`BeanDescriptor`] is static, so translation only
//! walks the field values of the instance at hand.
//!
//! # Statements
//!
//! | Method | Output |
//! |--------|--------|
//! | [`BeanTranslator::insert`] | `INSERT INTO T(a,b) VALUES('1',NULL)` |
//! | [`BeanTranslator::batch_insert`] | `INSERT INTO T(a,b) VALUES(..),(..)` or `None` |
//! | [`BeanTranslator::select_by_key`] | `SELECT * FROM T WHERE id = 7` |
//! | [`BeanTranslator::update_by_key`] | `UPDATE T SET a = ?, b = ? WHERE id = ?` |
//! | [`BeanTranslator::update_where`] | `UPDATE T SET a = ? WHERE <predicate>` |
//!
//! # Null Handling
//!
//! A null primary key is left out of INSERT column lists and out of the SET
//! list of a predicate update, so the database can generate it. Every other
//! null field is kept and rendered as `NULL` (or bound as a null value).
//!
//! Literal values are single-quoted with `'` doubled; nothing else is
//! escaped.

use tracing::debug;

use crate::{
    config::{EmptyBeanPolicy, EngineConfig, IdentifierQuote},
    error::TranslationError,
    placeholder::{ParsedSql, Token},
    template::SqlValue,
    value::Value
};

/// Static metadata of one bean field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, matched by `:name` predicate tokens.
    pub name:        &'static str,
    /// Column name.
    pub column:      &'static str,
    /// This field is the primary key.
    pub primary_key: bool
}

impl FieldDescriptor {
    /// Create a field descriptor.
    pub const fn new(name: &'static str, column: &'static str, primary_key: bool) -> Self {
        Self {
            name,
            column,
            primary_key
        }
    }
}

/// Static metadata of a bean: table plus fields in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeanDescriptor {
    /// Table name.
    pub table:  &'static str,
    /// Persisted fields in declaration order.
    pub fields: &'static [FieldDescriptor]
}

impl BeanDescriptor {
    /// Create a bean descriptor.
    pub const fn new(table: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            table,
            fields
        }
    }

    /// Index and descriptor of the primary key, if declared.
    pub fn primary_key(&self) -> Option<(usize, &'static FieldDescriptor)> {
        self.fields.iter().enumerate().find(|(_, f)| f.primary_key)
    }

    /// Index of the field called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Record that can be translated into SQL.
pub trait Bean {
    /// Table and field metadata.
    const DESCRIPTOR: BeanDescriptor;

    /// Field values in the order of [`BeanDescriptor::fields`].
    fn field_values(&self) -> Vec<Value>;
}

/// UPDATE produced by [`BeanTranslator::update_by_key`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// UPDATE text with `?` markers.
    pub sql:    String,
    /// Bind values: SET values, then the key.
    pub values: Vec<Value>,
    /// Companion SELECT-by-key to re-read the row.
    pub select: Option<String>
}

/// Derives INSERT, SELECT and UPDATE statements from beans.
#[derive(Debug, Clone)]
pub struct BeanTranslator {
    quote:              IdentifierQuote,
    empty_bean:         EmptyBeanPolicy,
    schema_placeholder: String
}

impl Default for BeanTranslator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl BeanTranslator {
    /// Create a translator from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            quote:              config.identifier_quote,
            empty_bean:         config.empty_bean,
            schema_placeholder: config.schema_placeholder.clone()
        }
    }

    /// Build an INSERT for one bean.
    ///
    /// With `use_schema_prefix` the table is qualified by the configured
    /// schema placeholder, resolved later by the executor.
    ///
    /// # Errors
    ///
    /// [`TranslationError::EmptyBean`] under [`EmptyBeanPolicy::Reject`].
    pub fn insert<B: Bean>(
        &self,
        bean: &B,
        use_schema_prefix: bool
    ) -> Result<String, TranslationError> {
        let descriptor = B::DESCRIPTOR;
        let values = bean.field_values();
        let columns = insert_columns(&descriptor, &values);
        self.check_empty(&descriptor, columns.len())?;

        let sql = format!(
            "INSERT INTO {}{} VALUES{}",
            self.table(&descriptor, self.prefix(use_schema_prefix)),
            self.column_list(&descriptor, &columns),
            tuple(&columns, &values)
        );
        debug!(table = descriptor.table, %sql, "bean insert");
        Ok(sql)
    }

    /// Build one multi-row INSERT for a slice of beans.
    ///
    /// Columns come from the first bean. When its key is present, every
    /// later bean renders its own key (or `NULL`) in that column.
    ///
    /// # Errors
    ///
    /// [`TranslationError::EmptyBean`] under [`EmptyBeanPolicy::Reject`].
    pub fn batch_insert<B: Bean>(
        &self,
        beans: &[B],
        use_schema_prefix: bool
    ) -> Result<Option<String>, TranslationError> {
        let Some(first) = beans.first() else {
            return Ok(None);
        };
        let descriptor = B::DESCRIPTOR;
        let columns = insert_columns(&descriptor, &first.field_values());
        self.check_empty(&descriptor, columns.len())?;

        let tuples: Vec<String> = beans
            .iter()
            .map(|b| tuple(&columns, &b.field_values()))
            .collect();

        let sql = format!(
            "INSERT INTO {}{} VALUES{}",
            self.table(&descriptor, self.prefix(use_schema_prefix)),
            self.column_list(&descriptor, &columns),
            tuples.join(",")
        );
        debug!(table = descriptor.table, rows = beans.len(), "bean batch insert");
        Ok(Some(sql))
    }

    /// Build `SELECT * FROM <table> WHERE <pk> = <key>`.
    ///
    /// The key is rendered in its textual form, unquoted.
    ///
    /// # Errors
    ///
    /// - [`TranslationError::MissingPrimaryKey`]
    /// - [`TranslationError::NullPrimaryKey`] for a null key
    pub fn select_by_key<B: Bean>(
        &self,
        key: &Value,
        schema: Option<&str>
    ) -> Result<String, TranslationError> {
        let descriptor = B::DESCRIPTOR;
        let (_, pk) = primary_key(&descriptor)?;
        if key.is_null() {
            return Err(TranslationError::NullPrimaryKey(descriptor.table.to_string()));
        }
        Ok(self.select_sql(&descriptor, pk, key, schema))
    }

    /// Build an UPDATE addressed by the primary key.
    ///
    /// SET lists every non-key field in declaration order, null or not. The
    /// key value is bound last.
    ///
    /// # Errors
    ///
    /// - [`TranslationError::MissingPrimaryKey`]
    /// - [`TranslationError::NullPrimaryKey`]
    /// - [`TranslationError::EmptyBean`] when there is nothing to set
    pub fn update_by_key<B: Bean>(
        &self,
        bean: &B,
        schema: Option<&str>,
        return_select: bool
    ) -> Result<UpdateStatement, TranslationError> {
        let descriptor = B::DESCRIPTOR;
        let (pk_index, pk) = primary_key(&descriptor)?;
        let mut values = bean.field_values();
        let key = values.get(pk_index).cloned().unwrap_or_default();
        if key.is_null() {
            return Err(TranslationError::NullPrimaryKey(descriptor.table.to_string()));
        }

        let set: Vec<usize> = (0..descriptor.fields.len())
            .filter(|&i| i != pk_index)
            .collect();
        if set.is_empty() {
            return Err(TranslationError::EmptyBean(descriptor.table.to_string()));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table(&descriptor, schema),
            self.set_list(&descriptor, &set),
            self.quote.quote(pk.column)
        );
        let select = return_select.then(|| self.select_sql(&descriptor, pk, &key, schema));

        let mut binds: Vec<Value> = set.iter().map(|&i| take(&mut values, i)).collect();
        binds.push(key);

        Ok(UpdateStatement {
            sql,
            values: binds,
            select
        })
    }

    /// Build an UPDATE with a caller-supplied WHERE predicate.
    ///
    /// Every `:field` token of `predicate` is bound to that field's value.
    /// Fields named in the predicate are left out of SET; the key is part
    /// of SET only when non-null. Bind order: SET values, then predicate
    /// tokens in appearance order.
    ///
    /// # Errors
    ///
    /// - [`TranslationError::UnknownField`] for a token naming no field
    /// - [`TranslationError::EmptyBean`] when there is nothing to set
    pub fn update_where<B: Bean>(
        &self,
        bean: &B,
        schema: Option<&str>,
        predicate: &str
    ) -> Result<SqlValue, TranslationError> {
        let descriptor = B::DESCRIPTOR;
        let values = bean.field_values();
        let parsed = ParsedSql::parse(predicate);

        let mut referenced = Vec::new();
        for token in parsed.tokens() {
            referenced.push(field_index(&descriptor, token)?);
        }

        let set: Vec<usize> = descriptor
            .fields
            .iter()
            .enumerate()
            .filter(|(i, f)| !referenced.contains(i) && !(f.primary_key && is_null_at(&values, *i)))
            .map(|(i, _)| i)
            .collect();
        if set.is_empty() {
            return Err(TranslationError::EmptyBean(descriptor.table.to_string()));
        }

        let (where_sql, where_values) = parsed.render(|token| {
            field_index(&descriptor, token).map(|i| values.get(i).cloned().unwrap_or_default())
        })?;

        let mut binds: Vec<Value> = set
            .iter()
            .map(|&i| values.get(i).cloned().unwrap_or_default())
            .collect();
        binds.extend(where_values);

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(&descriptor, schema),
            self.set_list(&descriptor, &set),
            where_sql
        );
        Ok(SqlValue::new(sql, binds))
    }

    fn prefix(&self, use_schema_prefix: bool) -> Option<&str> {
        use_schema_prefix.then_some(self.schema_placeholder.as_str())
    }

    fn check_empty(
        &self,
        descriptor: &BeanDescriptor,
        columns: usize
    ) -> Result<(), TranslationError> {
        if columns == 0 && self.empty_bean == EmptyBeanPolicy::Reject {
            return Err(TranslationError::EmptyBean(descriptor.table.to_string()));
        }
        Ok(())
    }

    fn table(&self, descriptor: &BeanDescriptor, schema: Option<&str>) -> String {
        match schema {
            Some(schema) => format!(
                "{}.{}",
                self.quote.quote(schema),
                self.quote.quote(descriptor.table)
            ),
            None => self.quote.quote(descriptor.table)
        }
    }

    fn column_list(&self, descriptor: &BeanDescriptor, columns: &[usize]) -> String {
        let names: Vec<String> = columns
            .iter()
            .map(|&i| self.quote.quote(descriptor.fields[i].column))
            .collect();
        format!("({})", names.join(","))
    }

    fn set_list(&self, descriptor: &BeanDescriptor, fields: &[usize]) -> String {
        let assignments: Vec<String> = fields
            .iter()
            .map(|&i| format!("{} = ?", self.quote.quote(descriptor.fields[i].column)))
            .collect();
        assignments.join(", ")
    }

    fn select_sql(
        &self,
        descriptor: &BeanDescriptor,
        pk: &FieldDescriptor,
        key: &Value,
        schema: Option<&str>
    ) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = {}",
            self.table(descriptor, schema),
            self.quote.quote(pk.column),
            key
        )
    }
}

fn primary_key(
    descriptor: &BeanDescriptor
) -> Result<(usize, &'static FieldDescriptor), TranslationError> {
    descriptor
        .primary_key()
        .ok_or_else(|| TranslationError::MissingPrimaryKey(descriptor.table.to_string()))
}

fn field_index(descriptor: &BeanDescriptor, token: &Token) -> Result<usize, TranslationError> {
    let unknown = || TranslationError::UnknownField {
        table: descriptor.table.to_string(),
        field: token.to_string()
    };
    match token {
        Token::Named(name) => descriptor.position(name).ok_or_else(unknown),
        Token::Positional(_) => Err(unknown())
    }
}

fn is_null_at(values: &[Value], index: usize) -> bool {
    values.get(index).is_none_or(Value::is_null)
}

fn insert_columns(descriptor: &BeanDescriptor, values: &[Value]) -> Vec<usize> {
    descriptor
        .fields
        .iter()
        .enumerate()
        .filter(|(i, f)| !(f.primary_key && is_null_at(values, *i)))
        .map(|(i, _)| i)
        .collect()
}

fn tuple(columns: &[usize], values: &[Value]) -> String {
    let literals: Vec<String> = columns
        .iter()
        .map(|&i| values.get(i).map_or_else(|| "NULL".to_string(), Value::sql_literal))
        .collect();
    format!("({})", literals.join(","))
}

fn take(values: &mut [Value], index: usize) -> Value {
    values.get_mut(index).map(std::mem::take).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UserInfo {
        id:   Option<i32>,
        name: Option<String>,
        age:  Option<i32>
    }

    impl UserInfo {
        fn new(id: Option<i32>, name: Option<&str>, age: Option<i32>) -> Self {
            Self {
                id,
                name: name.map(String::from),
                age
            }
        }
    }

    impl Bean for UserInfo {
        const DESCRIPTOR: BeanDescriptor = BeanDescriptor::new(
            "UserInfo",
            &[
                FieldDescriptor::new("id", "id", true),
                FieldDescriptor::new("name", "name", false),
                FieldDescriptor::new("age", "age", false)
            ]
        );

        fn field_values(&self) -> Vec<Value> {
            vec![
                Value::from(self.id),
                Value::from(self.name.clone()),
                Value::from(self.age),
            ]
        }
    }

    struct T {
        key: Option<String>
    }

    impl Bean for T {
        const DESCRIPTOR: BeanDescriptor =
            BeanDescriptor::new("T", &[FieldDescriptor::new("key", "key", false)]);

        fn field_values(&self) -> Vec<Value> {
            vec![Value::from(self.key.clone())]
        }
    }

    struct Empty;

    impl Bean for Empty {
        const DESCRIPTOR: BeanDescriptor = BeanDescriptor::new("Empty", &[]);

        fn field_values(&self) -> Vec<Value> {
            Vec::new()
        }
    }

    fn translator() -> BeanTranslator {
        BeanTranslator::default()
    }

    #[test]
    fn insert_skips_null_key() {
        let t = translator();
        let sql = t
            .insert(&UserInfo::new(None, Some("A"), Some(1)), false)
            .unwrap();
        assert_eq!(sql, "INSERT INTO UserInfo(name,age) VALUES('A','1')");
    }

    #[test]
    fn insert_keeps_present_key_and_null_fields() {
        let t = translator();
        let sql = t.insert(&UserInfo::new(Some(33), None, Some(18)), false).unwrap();
        assert_eq!(sql, "INSERT INTO UserInfo(id,name,age) VALUES('33',NULL,'18')");
        let sql = t.insert(&UserInfo::new(None, None, None), false).unwrap();
        assert_eq!(sql, "INSERT INTO UserInfo(name,age) VALUES(NULL,NULL)");
    }

    #[test]
    fn insert_without_key_field() {
        let sql = translator().insert(&T { key: None }, false).unwrap();
        assert_eq!(sql, "INSERT INTO T(key) VALUES(NULL)");
    }

    #[test]
    fn insert_with_schema_prefix() {
        let sql = translator()
            .insert(&UserInfo::new(Some(33), Some("想向公主"), Some(18)), true)
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO ${dbpre}.UserInfo(id,name,age) VALUES('33','想向公主','18')"
        );
    }

    #[test]
    fn insert_escapes_quotes_only() {
        let sql = translator()
            .insert(&UserInfo::new(None, Some("松'鼠\\"), None), false)
            .unwrap();
        assert_eq!(sql, "INSERT INTO UserInfo(name,age) VALUES('松''鼠\\',NULL)");
    }

    #[test]
    fn backtick_quoting() {
        let t = BeanTranslator::new(
            &EngineConfig::default().identifier_quote(IdentifierQuote::Backtick)
        );
        let sql = t.insert(&UserInfo::new(Some(33), Some("x"), Some(18)), true).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `${dbpre}`.`UserInfo`(`id`,`name`,`age`) VALUES('33','x','18')"
        );
    }

    #[test]
    fn empty_bean_policy() {
        assert_eq!(translator().insert(&Empty, false).unwrap(), "INSERT INTO Empty() VALUES()");
        let strict = BeanTranslator::new(&EngineConfig::default().empty_bean(EmptyBeanPolicy::Reject));
        assert!(matches!(
            strict.insert(&Empty, false),
            Err(TranslationError::EmptyBean(_))
        ));
    }

    #[test]
    fn batch_insert_empty_is_none() {
        let beans: Vec<UserInfo> = Vec::new();
        assert_eq!(translator().batch_insert(&beans, false).unwrap(), None);
    }

    #[test]
    fn batch_insert_aligns_with_first_bean() {
        let t = translator();
        let beans = [
            UserInfo::new(None, Some("牵牛花"), Some(3)),
            UserInfo::new(Some(10), Some("松'鼠"), Some(5))
        ];
        assert_eq!(
            t.batch_insert(&beans, false).unwrap().unwrap(),
            "INSERT INTO UserInfo(name,age) VALUES('牵牛花','3'),('松''鼠','5')"
        );

        let beans = [
            UserInfo::new(Some(1), Some("a"), Some(3)),
            UserInfo::new(None, Some("b"), None)
        ];
        assert_eq!(
            t.batch_insert(&beans, false).unwrap().unwrap(),
            "INSERT INTO UserInfo(id,name,age) VALUES('1','a','3'),(NULL,'b',NULL)"
        );
    }

    #[test]
    fn select_by_key_unquoted() {
        let sql = translator()
            .select_by_key::<UserInfo>(&Value::from(36), Some("xk"))
            .unwrap();
        assert_eq!(sql, "SELECT * FROM xk.UserInfo WHERE id = 36");
    }

    #[test]
    fn key_operations_need_primary_key() {
        let t = translator();
        assert!(matches!(
            t.select_by_key::<T>(&Value::from(1), None),
            Err(TranslationError::MissingPrimaryKey(_))
        ));
        assert!(matches!(
            t.update_by_key(&T { key: None }, None, false),
            Err(TranslationError::MissingPrimaryKey(_))
        ));
    }

    #[test]
    fn update_by_key_binds_key_last() {
        let stmt = translator()
            .update_by_key(&UserInfo::new(Some(33), Some("想向公主"), None), Some("xk"), true)
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE xk.UserInfo SET name = ?, age = ? WHERE id = ?");
        assert_eq!(
            stmt.values,
            vec![Value::from("想向公主"), Value::Null, Value::from(33)]
        );
        assert_eq!(
            stmt.select.as_deref(),
            Some("SELECT * FROM xk.UserInfo WHERE id = 33")
        );
    }

    #[test]
    fn update_by_key_without_select() {
        let stmt = translator()
            .update_by_key(&UserInfo::new(Some(38), Some("向公主"), Some(23)), None, false)
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE UserInfo SET name = ?, age = ? WHERE id = ?");
        assert_eq!(stmt.select, None);
    }

    #[test]
    fn update_by_null_key_rejected() {
        assert!(matches!(
            translator().update_by_key(&UserInfo::new(None, Some("x"), None), None, false),
            Err(TranslationError::NullPrimaryKey(_))
        ));
    }

    #[test]
    fn update_where_binds_set_then_predicate() {
        let stmt = translator()
            .update_where(&UserInfo::new(Some(33), Some("想向公主"), Some(18)), Some("xk"), "name = :name")
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE xk.UserInfo SET id = ?, age = ? WHERE name = ?");
        assert_eq!(
            stmt.values,
            vec![Value::from(33), Value::from(18), Value::from("想向公主")]
        );
    }

    #[test]
    fn update_where_skips_null_key() {
        let stmt = translator()
            .update_where(&UserInfo::new(None, Some("a"), Some(2)), None, "age > :age")
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE UserInfo SET name = ? WHERE age > ?");
        assert_eq!(stmt.values, vec![Value::from("a"), Value::from(2)]);
    }

    #[test]
    fn update_where_literal_predicate() {
        let stmt = translator()
            .update_where(&UserInfo::new(Some(1), None, Some(2)), None, "name = '张三'")
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE UserInfo SET id = ?, name = ?, age = ? WHERE name = '张三'");
        assert_eq!(stmt.values, vec![Value::from(1), Value::Null, Value::from(2)]);
    }

    #[test]
    fn update_where_unknown_field() {
        let err = translator()
            .update_where(&UserInfo::new(Some(1), None, None), None, "nick = :nick")
            .unwrap_err();
        assert!(matches!(
            err,
            TranslationError::UnknownField { ref field, .. } if field == ":nick"
        ));
    }
}
