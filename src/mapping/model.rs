//! Document models
//!
//! A [`DocumentModel`] is the explicit registration of a domain type: its
//! properties in declaration order, how each is read and written, and the
//! per-field configuration that overrides schema defaults.
//!
//! # Field configuration priority
//!
//! 1. Custom marshaller
//! 2. Native boolean override
//! 3. Conversion schema default

use std::fmt;
use std::sync::Arc;

use crate::convert::CustomMarshaller;

use super::attribute::Attribute;
use super::declared::DeclaredType;
use super::errors::ValueError;
use super::value::Value;

/// A domain type convertible to and from an item.
///
/// Implementing this trait is what marks a type as a document: it can be
/// stored at the top level and nested inside other documents.
pub trait Document: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    fn model() -> DocumentModel<Self>;
}

type Getter<T> = Box<dyn Fn(&T) -> Option<Value> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), ValueError> + Send + Sync>;
type Factory<T> = Box<dyn Fn() -> Result<T, String> + Send + Sync>;

/// Per-field overrides attached at registration time.
#[derive(Clone, Default)]
pub struct FieldConfig {
    /// Wire attribute name; defaults to the property name
    pub attribute_name: Option<String>,
    /// Custom marshaller, always used when present
    pub custom: Option<Arc<dyn CustomMarshaller>>,
    /// Store booleans as native BOOL regardless of schema
    pub native_bool: bool,
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = Some(name.into());
        self
    }

    pub fn custom(mut self, marshaller: Arc<dyn CustomMarshaller>) -> Self {
        self.custom = Some(marshaller);
        self
    }

    pub fn native_bool(mut self) -> Self {
        self.native_bool = true;
        self
    }
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("attribute_name", &self.attribute_name)
            .field("custom", &self.custom.is_some())
            .field("native_bool", &self.native_bool)
            .finish()
    }
}

/// One registered property of a document type.
pub struct PropertyDef<T> {
    name: String,
    declared: DeclaredType,
    config: FieldConfig,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> PropertyDef<T> {
    /// Creates a property from raw accessors and an explicit declared type.
    pub fn new<G, S>(name: impl Into<String>, declared: DeclaredType, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<Value> + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<(), ValueError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declared,
            config: FieldConfig::default(),
            get: Box::new(get),
            set: Box::new(set),
        }
    }

    /// Creates a property from field accessors; the declared type comes from `F`.
    pub fn field<F, G, M>(name: impl Into<String>, get: G, get_mut: M) -> Self
    where
        F: Attribute,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        Self::new(
            name,
            F::declared_type(),
            move |object| get(object).to_value(),
            move |object, value| {
                *get_mut(object) = F::from_value(value)?;
                Ok(())
            },
        )
    }

    pub fn with_config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire attribute name
    pub fn attribute_name(&self) -> &str {
        self.config.attribute_name.as_deref().unwrap_or(&self.name)
    }

    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn get(&self, object: &T) -> Option<Value> {
        (self.get)(object)
    }

    pub fn set(&self, object: &mut T, value: Value) -> Result<(), ValueError> {
        (self.set)(object, value)
    }
}

impl<T> fmt::Debug for PropertyDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("config", &self.config)
            .finish()
    }
}

/// Registration of a document type.
pub struct DocumentModel<T> {
    type_name: &'static str,
    table: Option<String>,
    hash_key: Option<String>,
    range_key: Option<String>,
    factory: Factory<T>,
    properties: Vec<PropertyDef<T>>,
}

impl<T: 'static> DocumentModel<T> {
    /// Starts a model whose instances are created with `Default`.
    pub fn builder(type_name: &'static str) -> ModelBuilder<T>
    where
        T: Default,
    {
        Self::builder_with_factory(type_name, || Ok(T::default()))
    }

    /// Starts a model with a fallible factory.
    pub fn builder_with_factory<F>(type_name: &'static str, factory: F) -> ModelBuilder<T>
    where
        F: Fn() -> Result<T, String> + Send + Sync + 'static,
    {
        ModelBuilder {
            model: DocumentModel {
                type_name,
                table: None,
                hash_key: None,
                range_key: None,
                factory: Box::new(factory),
                properties: Vec::new(),
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Table the type is stored in, if it is a top-level item
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn hash_key(&self) -> Option<&PropertyDef<T>> {
        self.hash_key.as_deref().and_then(|name| self.property(name))
    }

    pub fn range_key(&self) -> Option<&PropertyDef<T>> {
        self.range_key.as_deref().and_then(|name| self.property(name))
    }

    /// Properties in declaration order
    pub fn properties(&self) -> &[PropertyDef<T>] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef<T>> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_attribute(&self, attribute: &str) -> Option<&PropertyDef<T>> {
        self.properties
            .iter()
            .find(|p| p.attribute_name() == attribute)
    }

    /// Creates a fresh default instance.
    pub fn instantiate(&self) -> Result<T, String> {
        (self.factory)()
    }
}

impl<T> fmt::Debug for DocumentModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentModel")
            .field("type_name", &self.type_name)
            .field("table", &self.table)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Builder for [`DocumentModel`].
pub struct ModelBuilder<T> {
    model: DocumentModel<T>,
}

impl<T: 'static> ModelBuilder<T> {
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.model.table = Some(name.into());
        self
    }

    /// Registers a property with default configuration.
    pub fn field<F, G, M>(self, name: &str, get: G, get_mut: M) -> Self
    where
        F: Attribute,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.property(PropertyDef::field(name, get, get_mut))
    }

    /// Registers a property with explicit configuration.
    pub fn field_with<F, G, M>(self, name: &str, config: FieldConfig, get: G, get_mut: M) -> Self
    where
        F: Attribute,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.property(PropertyDef::field(name, get, get_mut).with_config(config))
    }

    /// Registers the partition key property.
    pub fn hash_key<F, G, M>(mut self, name: &str, get: G, get_mut: M) -> Self
    where
        F: Attribute,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.model.hash_key = Some(name.to_string());
        self.field(name, get, get_mut)
    }

    /// Registers the sort key property.
    pub fn range_key<F, G, M>(mut self, name: &str, get: G, get_mut: M) -> Self
    where
        F: Attribute,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.model.range_key = Some(name.to_string());
        self.field(name, get, get_mut)
    }

    pub fn property(mut self, property: PropertyDef<T>) -> Self {
        self.model.properties.push(property);
        self
    }

    pub fn build(self) -> DocumentModel<T> {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ScalarKind;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Account {
        id: String,
        balance: i64,
        nickname: Option<String>,
    }

    fn account_model() -> DocumentModel<Account> {
        DocumentModel::builder("Account")
            .table("accounts")
            .hash_key("id", |a: &Account| &a.id, |a: &mut Account| &mut a.id)
            .field("balance", |a: &Account| &a.balance, |a: &mut Account| &mut a.balance)
            .field_with(
                "nickname",
                FieldConfig::new().attribute("nick"),
                |a: &Account| &a.nickname,
                |a: &mut Account| &mut a.nickname,
            )
            .build()
    }

    #[test]
    fn test_properties_in_declaration_order() {
        let model = account_model();
        let names: Vec<_> = model.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["id", "balance", "nickname"]);
        assert_eq!(model.table(), Some("accounts"));
        assert_eq!(model.hash_key().unwrap().name(), "id");
        assert!(model.range_key().is_none());
    }

    #[test]
    fn test_attribute_name_override() {
        let model = account_model();
        assert_eq!(model.property("nickname").unwrap().attribute_name(), "nick");
        assert_eq!(model.property_by_attribute("nick").unwrap().name(), "nickname");
        assert_eq!(model.property("balance").unwrap().attribute_name(), "balance");
    }

    #[test]
    fn test_accessors() {
        let model = account_model();
        let mut account = model.instantiate().unwrap();
        let balance = model.property("balance").unwrap();

        balance.set(&mut account, Value::Int(250)).unwrap();
        assert_eq!(account.balance, 250);
        assert_eq!(balance.get(&account), Some(Value::Int(250)));
        assert_eq!(
            balance.declared_type(),
            &DeclaredType::scalar(ScalarKind::I64)
        );

        let nickname = model.property("nickname").unwrap();
        assert_eq!(nickname.get(&account), None);
    }

    #[test]
    fn test_failing_factory() {
        let model: DocumentModel<Account> =
            DocumentModel::builder_with_factory("Account", || Err("no context".into())).build();
        assert_eq!(model.instantiate().unwrap_err(), "no context");
    }
}
