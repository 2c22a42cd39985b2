// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository method descriptors and the method table.
//!
//! Method metadata is built once, validated, and then shared read-only:
//!
//! ```text
//! MethodDescriptor::builder("update")   ──build()──►  MethodDescriptor
//!     .param("no", "String")                               │
//!     .query(QueryTemplate::new(..))                       ▼
//!     .modifying(Modifying::default())     MethodTable::builder().register(..)
//!                                                          │
//!                                                          ▼
//!                                   resolve(interface, method, signature)
//! ```
//!
//! Validation happens in [`MethodDescriptorBuilder::build`]:
//!
//! - a modifying method must declare a query template or a named query;
//! - every placeholder of every template and clause must name a parameter.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    error::{ClassificationError, DescriptorError, LookupError, TranslationError},
    placeholder::Token,
    template::QueryTemplate,
    value::Value
};

static NULL: Value = Value::Null;

/// Formal parameter of a repository method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// Parameter name, matched by `:name` placeholders.
    pub name:   String,
    /// Declared type name, part of the method signature.
    pub ty:     String,
    /// This argument names the data source to run against.
    pub source: bool
}

impl ParamDescriptor {
    /// Create a plain parameter.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            ty:     ty.into(),
            source: false
        }
    }

    /// Create a data-source parameter.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            ty:     "String".into(),
            source: true
        }
    }
}

/// Runtime arguments paired with the formal parameters.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    params: &'a [ParamDescriptor],
    values: &'a [Value]
}

impl<'a> Arguments<'a> {
    /// Pair parameters with values (same order).
    pub const fn new(params: &'a [ParamDescriptor], values: &'a [Value]) -> Self {
        Self {
            params,
            values
        }
    }

    /// Supplied values.
    pub const fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Resolve a placeholder to its bound value.
    ///
    /// # Errors
    ///
    /// Dangling references, reported against `template`.
    pub fn resolve(&self, token: &Token, template: &str) -> Result<&'a Value, TranslationError> {
        let index = match token {
            Token::Positional(n) => (1..=self.params.len())
                .contains(n)
                .then(|| n - 1)
                .ok_or_else(|| TranslationError::UnknownParameter {
                    template: template.to_string(),
                    index:    *n
                })?,
            Token::Named(name) => self
                .params
                .iter()
                .position(|p| &p.name == name)
                .ok_or_else(|| TranslationError::UnknownNamedParameter {
                    template: template.to_string(),
                    name:     name.clone()
                })?
        };
        Ok(self.values.get(index).unwrap_or(&NULL))
    }

    /// Data-source name taken from the first source-flagged parameter.
    pub fn data_source(&self) -> Option<String> {
        self.params
            .iter()
            .zip(self.values)
            .find(|(p, v)| p.source && !v.is_null())
            .map(|(_, v)| v.to_string())
    }
}

/// Declared return shape of a repository method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReturnShape {
    /// Nothing.
    #[default]
    Unit,
    /// Number of affected rows.
    Affected,
    /// `true` when at least one row was affected / found.
    Boolean,
    /// Single column of a single row.
    Scalar,
    /// One row as a map.
    Row,
    /// All rows as maps.
    Rows,
    /// One row mapped to the named bean.
    Bean(String),
    /// All rows mapped to the named bean.
    Beans(String),
    /// Generated primary key.
    PrimaryKey,
    /// One page of rows plus paging metadata.
    Page
}

impl ReturnShape {
    /// Check if this is the page type.
    pub const fn is_page(&self) -> bool {
        matches!(self, Self::Page)
    }
}

/// Modifying marker with optional re-read hints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Modifying {
    /// Table to re-read the modified row from.
    pub table: Option<String>,
    /// Key column used for the re-read.
    pub id:    Option<String>
}

impl Modifying {
    /// Marker that re-reads the modified row from `table` by `id`.
    pub fn returning(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            id:    Some(id.into())
        }
    }
}

/// Classification inputs derived from a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodFeatures {
    /// At least one query template declared.
    pub has_template:    bool,
    /// A named-query reference declared.
    pub has_named_query: bool,
    /// Modifying marker present.
    pub modifying:       bool,
    /// Return shape is the page type.
    pub returns_page:    bool
}

/// Immutable description of one repository method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    interface:    String,
    name:         String,
    signature:    String,
    return_shape: ReturnShape,
    queries:      Vec<QueryTemplate>,
    modifying:    Option<Modifying>,
    named_query:  Option<String>,
    params:       Vec<ParamDescriptor>
}

impl MethodDescriptor {
    /// Start building a descriptor.
    pub fn builder(name: impl Into<String>) -> MethodDescriptorBuilder {
        MethodDescriptorBuilder {
            name:         name.into(),
            signature:    None,
            return_shape: ReturnShape::Unit,
            queries:      Vec::new(),
            modifying:    None,
            named_query:  None,
            params:       Vec::new()
        }
    }

    /// Owning interface (empty until registered in a table).
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method signature, e.g. `(String,Integer)`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Declared return shape.
    pub const fn return_shape(&self) -> &ReturnShape {
        &self.return_shape
    }

    /// Declared query templates in declaration order.
    pub fn queries(&self) -> &[QueryTemplate] {
        &self.queries
    }

    /// Modifying marker.
    pub const fn modifying(&self) -> Option<&Modifying> {
        self.modifying.as_ref()
    }

    /// Named-query reference.
    pub fn named_query(&self) -> Option<&str> {
        self.named_query.as_deref()
    }

    /// Formal parameters.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Pair the formal parameters with runtime values.
    ///
    /// # Errors
    ///
    /// [`TranslationError::ArgumentCount`] on arity mismatch.
    pub fn arguments<'a>(&'a self, values: &'a [Value]) -> Result<Arguments<'a>, TranslationError> {
        if values.len() != self.params.len() {
            return Err(TranslationError::ArgumentCount {
                method:   self.to_string(),
                expected: self.params.len(),
                found:    values.len()
            });
        }
        Ok(Arguments::new(&self.params, values))
    }

    /// Features used by the classification decision table.
    pub fn features(&self) -> MethodFeatures {
        MethodFeatures {
            has_template:    !self.queries.is_empty(),
            has_named_query: self.named_query.is_some(),
            modifying:       self.modifying.is_some(),
            returns_page:    self.return_shape.is_page()
        }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interface.is_empty() {
            write!(f, "{}{}", self.name, self.signature)
        } else {
            write!(f, "{}::{}{}", self.interface, self.name, self.signature)
        }
    }
}

/// Builder for [`MethodDescriptor`].
#[derive(Debug)]
pub struct MethodDescriptorBuilder {
    name:         String,
    signature:    Option<String>,
    return_shape: ReturnShape,
    queries:      Vec<QueryTemplate>,
    modifying:    Option<Modifying>,
    named_query:  Option<String>,
    params:       Vec<ParamDescriptor>
}

impl MethodDescriptorBuilder {
    /// Add a formal parameter.
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(ParamDescriptor::new(name, ty));
        self
    }

    /// Add a prepared parameter descriptor.
    pub fn param_descriptor(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Override the signature derived from the parameter types.
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Set the return shape.
    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.return_shape = shape;
        self
    }

    /// Append a query template.
    pub fn query(mut self, template: QueryTemplate) -> Self {
        self.queries.push(template);
        self
    }

    /// Mark as modifying.
    pub fn modifying(mut self, marker: Modifying) -> Self {
        self.modifying = Some(marker);
        self
    }

    /// Reference a named query.
    pub fn named_query(mut self, id: impl Into<String>) -> Self {
        self.named_query = Some(id.into());
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// - [`ClassificationError::ModifyingWithoutQuery`]
    /// - dangling placeholder references ([`TranslationError`])
    pub fn build(self) -> Result<MethodDescriptor, DescriptorError> {
        let signature = self.signature.unwrap_or_else(|| {
            let types: Vec<&str> = self.params.iter().map(|p| p.ty.as_str()).collect();
            format!("({})", types.join(","))
        });

        if self.modifying.is_some() && self.queries.is_empty() && self.named_query.is_none() {
            return Err(ClassificationError::ModifyingWithoutQuery(format!(
                "{}{}",
                self.name, signature
            ))
            .into());
        }

        for query in &self.queries {
            query.validate(&self.params)?;
        }

        Ok(MethodDescriptor {
            interface: String::new(),
            name: self.name,
            signature,
            return_shape: self.return_shape,
            queries: self.queries,
            modifying: self.modifying,
            named_query: self.named_query,
            params: self.params
        })
    }
}

/// Lookup key: method name plus signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    /// Method name.
    pub name:      String,
    /// Method signature.
    pub signature: String
}

/// Immutable registry of repository methods per interface.
#[derive(Debug, Default)]
pub struct MethodTable {
    interfaces: HashMap<String, HashMap<MethodKey, Arc<MethodDescriptor>>>
}

impl MethodTable {
    /// Start building a table.
    pub fn builder() -> MethodTableBuilder {
        MethodTableBuilder {
            table: Self::default()
        }
    }

    /// Resolve a method from caller-supplied identifiers.
    ///
    /// # Errors
    ///
    /// [`LookupError`] for unknown interfaces or methods.
    pub fn resolve(
        &self,
        interface: &str,
        method: &str,
        signature: &str
    ) -> Result<Arc<MethodDescriptor>, LookupError> {
        let methods = self
            .interfaces
            .get(interface)
            .ok_or_else(|| LookupError::UnknownInterface(interface.to_string()))?;
        let key = MethodKey {
            name:      method.to_string(),
            signature: signature.to_string()
        };
        methods
            .get(&key)
            .cloned()
            .ok_or_else(|| LookupError::UnknownMethod {
                interface: interface.to_string(),
                method:    method.to_string(),
                signature: signature.to_string()
            })
    }

    /// Check if an interface is registered.
    pub fn contains_interface(&self, interface: &str) -> bool {
        self.interfaces.contains_key(interface)
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.interfaces.values().map(HashMap::len).sum()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for [`MethodTable`].
#[derive(Debug)]
pub struct MethodTableBuilder {
    table: MethodTable
}

impl MethodTableBuilder {
    /// Register a method under `interface`.
    ///
    /// # Errors
    ///
    /// [`DescriptorError::Duplicate`] when the name and signature are taken.
    pub fn register(
        mut self,
        interface: &str,
        mut descriptor: MethodDescriptor
    ) -> Result<Self, DescriptorError> {
        descriptor.interface = interface.to_string();
        let key = MethodKey {
            name:      descriptor.name.clone(),
            signature: descriptor.signature.clone()
        };
        let methods = self.table.interfaces.entry(interface.to_string()).or_default();
        if methods.contains_key(&key) {
            return Err(DescriptorError::Duplicate {
                interface: interface.to_string(),
                method:    key.name,
                signature: key.signature
            });
        }
        methods.insert(key, Arc::new(descriptor));
        Ok(self)
    }

    /// Finish the table.
    pub fn build(self) -> MethodTable {
        self.table
    }
}
