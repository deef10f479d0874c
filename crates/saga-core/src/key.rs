use std::any::type_name;
use std::borrow::{Borrow, Cow};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Identifier of a step type, used to resolve the step instance at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(Cow<'static, str>);

impl StepId {
    /// Create an id from a static string without allocating.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for StepId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Typed handle to a [`Payload`](crate::Payload) property.
///
/// The type parameter is only used to cast the stored value on retrieval.
/// Identity is the id alone: two keys with the same id are equal whatever
/// types they declare, so they address the same payload entry. Reading an
/// entry through a key whose type differs from the stored value yields
/// [`PayloadError::TypeMismatch`](crate::PayloadError::TypeMismatch).
///
/// ```
/// use saga_core::PayloadKey;
///
/// const ORDER_ID: PayloadKey<u64> = PayloadKey::new("order-id");
/// let alias: PayloadKey<String> = PayloadKey::new("order-id");
///
/// assert!(ORDER_ID == alias);
/// ```
pub struct PayloadKey<T> {
    id: Cow<'static, str>,
    _type: PhantomData<fn() -> T>,
}

impl<T> PayloadKey<T> {
    #[must_use]
    pub const fn new(id: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            _type: PhantomData,
        }
    }

    /// Create a key from a runtime string.
    pub fn owned(id: impl Into<String>) -> Self {
        Self {
            id: Cow::Owned(id.into()),
            _type: PhantomData,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the declared value type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

impl<T> Clone for PayloadKey<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for PayloadKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadKey")
            .field("id", &self.id)
            .field("type", &type_name::<T>())
            .finish()
    }
}

impl<T, U> PartialEq<PayloadKey<U>> for PayloadKey<T> {
    fn eq(&self, other: &PayloadKey<U>) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for PayloadKey<T> {}

impl<T> Hash for PayloadKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
