//! The persistable-object contract.

use std::sync::{Arc, PoisonError, RwLock};

use recordgraph_state::{Session, Value};

use crate::schema::{FieldKind, TypeSchema};

/// Shared reference to a persistable object. Identity is pointer identity.
pub type ObjectRef = Arc<dyn Persistable>;

/// An application type that can be saved as a record.
///
/// Implementors expose a static field table, read their fields by name and
/// carry the backend session used by [`crate::PersistableExt::save`].
///
/// ```ignore
/// impl Persistable for Author {
///     fn schema(&self) -> &'static TypeSchema {
///         &AUTHOR_SCHEMA
///     }
///
///     fn read_field(&self, name: &str) -> Option<FieldValue> {
///         match name {
///             "Name" => Some(FieldValue::scalar(self.name.clone())),
///             "BestFriend" => Some(FieldValue::nested(self.best_friend())),
///             _ => None,
///         }
///     }
///
///     fn session(&self) -> Option<Session> {
///         self.session.get()
///     }
///
///     fn attach_session(&self, session: Session) {
///         self.session.attach(session)
///     }
/// }
/// ```
pub trait Persistable: Send + Sync + 'static {
    /// Field table of the concrete type.
    fn schema(&self) -> &'static TypeSchema;

    /// Current value of the field called `name`, or `None` if the type has
    /// no such field.
    fn read_field(&self, name: &str) -> Option<FieldValue>;

    /// Session attached to this object, if any.
    fn session(&self) -> Option<Session>;

    /// Attach a backend session.
    fn attach_session(&self, session: Session);
}

/// Enumerations persisted as their integer representation.
pub trait PersistEnum {
    fn to_int(&self) -> i64;
}

/// Value read from a field, classified the same way as [`FieldKind`].
#[derive(Clone)]
pub enum FieldValue {
    Scalar(Value),
    Enum(i64),
    Nested(Option<ObjectRef>),
    Collection(Vec<ObjectRef>),
}

impl FieldValue {
    pub fn scalar(value: impl Into<Value>) -> Self {
        FieldValue::Scalar(value.into())
    }

    pub fn enumeration<E: PersistEnum>(value: &E) -> Self {
        FieldValue::Enum(value.to_int())
    }

    pub fn nested<T: Persistable>(value: Option<Arc<T>>) -> Self {
        FieldValue::Nested(value.map(|v| v as ObjectRef))
    }

    pub fn collection<T: Persistable>(items: &[Arc<T>]) -> Self {
        FieldValue::Collection(items.iter().map(|v| v.clone() as ObjectRef).collect())
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Scalar(_) => FieldKind::Scalar,
            FieldValue::Enum(_) => FieldKind::Enum,
            FieldValue::Nested(_) => FieldKind::Nested,
            FieldValue::Collection(_) => FieldKind::Collection,
        }
    }

    /// Value usable in an equality lookup: scalars as-is, enums as integers,
    /// an empty nested field as null.
    pub fn lookup_value(&self) -> Option<Value> {
        match self {
            FieldValue::Scalar(v) => Some(v.clone()),
            FieldValue::Enum(i) => Some(Value::Integer(*i)),
            FieldValue::Nested(None) => Some(Value::Null),
            FieldValue::Nested(Some(_)) | FieldValue::Collection(_) => None,
        }
    }
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            FieldValue::Enum(i) => f.debug_tuple("Enum").field(i).finish(),
            FieldValue::Nested(v) => f
                .debug_tuple("Nested")
                .field(&v.as_ref().map(|o| o.schema().type_name))
                .finish(),
            FieldValue::Collection(items) => f
                .debug_tuple("Collection")
                .field(&items.len())
                .finish(),
        }
    }
}

/// Identity of an object: the address of its shared allocation.
pub fn object_identity(object: &ObjectRef) -> usize {
    Arc::as_ptr(object).cast::<()>() as usize
}

/// Whether two references point at the same object.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    object_identity(a) == object_identity(b)
}

/// Interior-mutable session slot for persistable types.
#[derive(Debug, Default)]
pub struct SessionSlot(RwLock<Option<Session>>);

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Session> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn attach(&self, session: Session) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }
}
