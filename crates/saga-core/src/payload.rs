use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

use crate::error::PayloadError;
use crate::key::PayloadKey;

struct Entry {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

/// Mutable state carried through one saga run.
///
/// Properties are stored under the id of their [`PayloadKey`], so keys that
/// share an id overwrite each other regardless of their declared type. The
/// `result` slot holds the value a successful run returns; until it is set it
/// holds `R::default()`.
///
/// A payload is owned by exactly one run at a time and is not synchronized.
pub struct Payload<R> {
    properties: HashMap<String, Entry>,
    result: R,
}

impl<R: Default> Payload<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_result(R::default())
    }
}

impl<R: Default> Default for Payload<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Payload<R> {
    /// Create a payload whose result slot starts at `result`.
    pub fn with_result(result: R) -> Self {
        Self {
            properties: HashMap::new(),
            result,
        }
    }

    pub fn set_result(&mut self, value: R) {
        self.result = value;
    }

    pub fn result(&self) -> &R {
        &self.result
    }

    pub fn into_result(self) -> R {
        self.result
    }

    /// Insert `value` under the key's id, replacing any previous entry with
    /// that id whatever its type.
    pub fn add_property<T: Send + 'static>(&mut self, key: &PayloadKey<T>, value: T) {
        self.properties.insert(
            key.id().to_string(),
            Entry {
                value: Box::new(value),
                type_name: type_name::<T>(),
            },
        );
    }

    /// Read the entry stored under the key's id.
    ///
    /// Returns `Ok(None)` when no entry exists for the id.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::TypeMismatch`] when the entry was stored through
    /// a key with the same id but a different type.
    pub fn get_property<T: 'static>(&self, key: &PayloadKey<T>) -> Result<Option<&T>, PayloadError> {
        let Some(entry) = self.properties.get(key.id()) else {
            return Ok(None);
        };
        entry
            .value
            .downcast_ref::<T>()
            .map(Some)
            .ok_or_else(|| mismatch::<T>(key, entry))
    }

    /// Mutable variant of [`get_property`](Self::get_property).
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::TypeMismatch`] on a type collision.
    pub fn get_property_mut<T: 'static>(
        &mut self,
        key: &PayloadKey<T>,
    ) -> Result<Option<&mut T>, PayloadError> {
        let Some(entry) = self.properties.get_mut(key.id()) else {
            return Ok(None);
        };
        let found = entry.type_name;
        entry
            .value
            .downcast_mut::<T>()
            .map(Some)
            .ok_or_else(|| PayloadError::TypeMismatch {
                key: key.id().to_string(),
                expected: type_name::<T>(),
                found,
            })
    }

    /// Remove and return the entry stored under the key's id.
    ///
    /// A colliding entry of another type is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::TypeMismatch`] on a type collision.
    pub fn remove_property<T: 'static>(
        &mut self,
        key: &PayloadKey<T>,
    ) -> Result<Option<T>, PayloadError> {
        match self.properties.get(key.id()) {
            None => return Ok(None),
            Some(entry) if !entry.value.is::<T>() => return Err(mismatch::<T>(key, entry)),
            Some(_) => {}
        }
        Ok(self
            .properties
            .remove(key.id())
            .and_then(|entry| entry.value.downcast::<T>().ok())
            .map(|value| *value))
    }

    /// Whether an entry exists under the key's id, of any type.
    pub fn has_property<T>(&self, key: &PayloadKey<T>) -> bool {
        self.properties.contains_key(key.id())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn mismatch<T>(key: &PayloadKey<T>, entry: &Entry) -> PayloadError {
    PayloadError::TypeMismatch {
        key: key.id().to_string(),
        expected: type_name::<T>(),
        found: entry.type_name,
    }
}

impl<R: fmt::Debug> fmt::Debug for Payload<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties: HashMap<&str, &str> = self
            .properties
            .iter()
            .map(|(id, entry)| (id.as_str(), entry.type_name))
            .collect();
        f.debug_struct("Payload")
            .field("properties", &properties)
            .field("result", &self.result)
            .finish()
    }
}
