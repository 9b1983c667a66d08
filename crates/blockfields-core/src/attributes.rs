//! The parent block's attribute bag.
//!
//! ## Learning: Shared Ownership on One Thread
//!
//! Several fields of one block write into the same attribute bag.
//! All of them run on the UI dispatch thread, so `Rc<RefCell<_>>` is
//! enough: `Rc` shares ownership, `RefCell` checks borrows at runtime.
//! Neither type is `Send`, which keeps the store on its thread.

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::event::{EventBus, FieldEvent};
use crate::{CoreError, CoreResult};

/// Shared handle to a block's attributes.
pub type SharedAttributes = Rc<RefCell<AttributeStore>>;

/// Key/value store of a block's persisted attributes.
#[derive(Debug, Default)]
pub struct AttributeStore {
    values: BTreeMap<String, Value>,
    events: Option<EventBus>,
}

impl AttributeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from a JSON object.
    ///
    /// Non-object values produce an empty store.
    pub fn from_value(value: Value) -> Self {
        let values = match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Self {
            values,
            events: None,
        }
    }

    /// Attaches an event bus; every write is announced on it.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Wraps the store in a shared handle.
    pub fn shared(self) -> SharedAttributes {
        Rc::new(RefCell::new(self))
    }

    /// Returns an attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns an attribute as a string slice, if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Returns true if the attribute is set.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Writes one attribute.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        tracing::trace!(key = %key, "attribute set");
        self.values.insert(key.clone(), value);
        self.emit(FieldEvent::AttributeChanged { key });
    }

    /// Merges several attributes at once, like a block's `setAttributes`.
    pub fn set_many<I, K>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in updates {
            self.set(key, value);
        }
    }

    /// Sets one field inside an object-valued attribute.
    ///
    /// A missing attribute is created as an empty object first.
    pub fn set_nested(&mut self, key: &str, field: &str, value: Value) -> CoreResult<()> {
        let entry = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let object = entry
            .as_object_mut()
            .ok_or_else(|| CoreError::NotAnObject(key.to_string()))?;
        object.insert(field.to_string(), value);
        self.emit(FieldEvent::AttributeChanged {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.emit(FieldEvent::AttributeRemoved {
                key: key.to_string(),
            });
        }
        removed
    }

    /// Iterates over all attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Snapshot of the whole bag as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    fn emit(&self, event: FieldEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

/// The parent block's props as seen by its fields.
#[derive(Debug, Clone)]
pub struct BlockProps {
    /// The block's attribute bag
    pub attributes: SharedAttributes,

    /// Whether the block is selected in the editor
    pub is_selected: bool,

    /// Key of the rich-text attribute that currently holds focus
    pub editable: Option<String>,
}

impl BlockProps {
    pub fn new(attributes: SharedAttributes) -> Self {
        Self {
            attributes,
            is_selected: false,
            editable: None,
        }
    }

    pub fn selected(mut self, is_selected: bool) -> Self {
        self.is_selected = is_selected;
        self
    }

    pub fn editing(mut self, key: impl Into<String>) -> Self {
        self.editable = Some(key.into());
        self
    }

    /// Reads an attribute, cloned out of the store. Null counts as unset.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes
            .borrow()
            .get(key)
            .filter(|value| !value.is_null())
            .cloned()
    }

    /// Writes attributes through to the parent's store.
    pub fn set_attributes<I, K>(&self, updates: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.attributes.borrow_mut().set_many(updates);
    }
}
