//! Resolved field models and their cache
//!
//! # Invariants
//!
//! - A field model is resolved at most once per converter and then shared
//! - Concurrent first resolutions may both run; the first inserted wins, so
//!   every caller observes the same `Arc`
//! - No lock is held while resolving (resolution recurses into the cache)

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::attribute::{AttributeType, AttributeValue};
use crate::mapping::{DeclaredType, MappingResult, Value};
use crate::observability::MetricsRegistry;

use super::converter::ItemConverter;
use super::marshaller::{unmarshall_checked, Marshaller, Unmarshaller};

/// How one property is stored: its attribute name and both converters.
pub struct FieldModel {
    attribute_name: String,
    attribute_type: AttributeType,
    marshaller: Arc<dyn Marshaller>,
    unmarshaller: Arc<dyn Unmarshaller>,
}

impl FieldModel {
    pub fn new(
        attribute_name: impl Into<String>,
        marshaller: Arc<dyn Marshaller>,
        unmarshaller: Arc<dyn Unmarshaller>,
    ) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            attribute_type: marshaller.attribute_type(),
            marshaller,
            unmarshaller,
        }
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Wire type written for this field
    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn marshaller(&self) -> &Arc<dyn Marshaller> {
        &self.marshaller
    }

    pub fn unmarshaller(&self) -> &Arc<dyn Unmarshaller> {
        &self.unmarshaller
    }

    pub fn marshall(&self, value: &Value, converter: &ItemConverter) -> MappingResult<AttributeValue> {
        self.marshaller.marshall(value, converter)
    }

    /// Checks the wire type before unmarshalling.
    pub fn unmarshall(&self, value: &AttributeValue, converter: &ItemConverter) -> MappingResult<Value> {
        unmarshall_checked(self.unmarshaller.as_ref(), value, converter)
    }
}

impl fmt::Debug for FieldModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldModel")
            .field("attribute_name", &self.attribute_name)
            .field("attribute_type", &self.attribute_type)
            .finish()
    }
}

/// Converter pair for a declared type, independent of any property.
#[derive(Debug)]
pub(crate) struct MemberConverters {
    pub(crate) marshaller: Arc<dyn Marshaller>,
    pub(crate) unmarshaller: Arc<dyn Unmarshaller>,
}

#[derive(Default)]
struct CacheState {
    models: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    fields: HashMap<TypeId, HashMap<String, Arc<FieldModel>>>,
    members: HashMap<DeclaredType, Arc<MemberConverters>>,
}

/// Cache of document models, field models and member converters.
///
/// Owned by one [`ItemConverter`]; never shared across schemas.
pub struct FieldModelCache {
    state: Mutex<CacheState>,
    metrics: Arc<MetricsRegistry>,
}

impl FieldModelCache {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            metrics,
        }
    }

    /// Number of cached field models
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.fields.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Document models are keyed by their own type.
    pub(crate) fn model_or_insert_with<M, F>(&self, build: F) -> Arc<M>
    where
        M: Any + Send + Sync,
        F: FnOnce() -> M,
    {
        let type_id = TypeId::of::<M>();
        let cached = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.models.get(&type_id).cloned()
        };
        if let Some(model) = cached.and_then(|m| m.downcast::<M>().ok()) {
            return model;
        }

        let built = Arc::new(build());
        let erased: Arc<dyn Any + Send + Sync> = built.clone();
        let stored = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(state.models.entry(type_id).or_insert(erased))
        };
        stored.downcast::<M>().unwrap_or(built)
    }

    pub(crate) fn field_or_insert_with<F>(
        &self,
        type_id: TypeId,
        property: &str,
        resolve: F,
    ) -> MappingResult<Arc<FieldModel>>
    where
        F: FnOnce() -> MappingResult<FieldModel>,
    {
        let cached = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state
                .fields
                .get(&type_id)
                .and_then(|fields| fields.get(property))
                .cloned()
        };
        if let Some(field) = cached {
            self.metrics.increment_cache_hits();
            return Ok(field);
        }

        self.metrics.increment_cache_misses();
        let resolved = Arc::new(resolve()?);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let field = state
            .fields
            .entry(type_id)
            .or_default()
            .entry(property.to_string())
            .or_insert(resolved);
        Ok(Arc::clone(field))
    }

    pub(crate) fn member_or_insert_with<F>(
        &self,
        declared: &DeclaredType,
        resolve: F,
    ) -> MappingResult<Arc<MemberConverters>>
    where
        F: FnOnce() -> MappingResult<MemberConverters>,
    {
        let cached = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.members.get(declared).cloned()
        };
        if let Some(member) = cached {
            self.metrics.increment_cache_hits();
            return Ok(member);
        }

        self.metrics.increment_cache_misses();
        let resolved = Arc::new(resolve()?);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let member = state
            .members
            .entry(declared.clone())
            .or_insert(resolved);
        Ok(Arc::clone(member))
    }
}

impl fmt::Debug for FieldModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldModelCache")
            .field("fields", &self.len())
            .finish()
    }
}
