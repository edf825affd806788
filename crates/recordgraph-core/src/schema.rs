//! Static per-type field descriptor tables.
//!
//! Each persistable type declares one `static` [`TypeSchema`] listing its
//! fields in order, with their remote-name overrides, key flag and value
//! classification:
//!
//! ```ignore
//! static AUTHOR: TypeSchema = TypeSchema::new(
//!     "Author",
//!     &[
//!         FieldDescriptor::scalar("Name").key(),
//!         FieldDescriptor::enumeration("Status"),
//!         FieldDescriptor::nested("BestFriend").renamed("friend"),
//!         FieldDescriptor::collection("Books"),
//!     ],
//! )
//! .with_class_name("Writer");
//! ```

/// Classification of a field's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Plain value written as-is when storable
    Scalar,
    /// Enumeration, persisted as its integer form
    Enum,
    /// Single nested persistable object (optional)
    Nested,
    /// Homogeneous sequence of persistable objects
    Collection,
}

/// One field of a persistable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub remote_name: Option<&'static str>,
    pub is_key: bool,
    pub readable: bool,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            remote_name: None,
            is_key: false,
            readable: true,
            kind,
        }
    }

    pub const fn scalar(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar)
    }

    pub const fn enumeration(name: &'static str) -> Self {
        Self::new(name, FieldKind::Enum)
    }

    pub const fn nested(name: &'static str) -> Self {
        Self::new(name, FieldKind::Nested)
    }

    pub const fn collection(name: &'static str) -> Self {
        Self::new(name, FieldKind::Collection)
    }

    /// Mark this field as the type's key field.
    pub const fn key(self) -> Self {
        Self {
            is_key: true,
            ..self
        }
    }

    /// Store this field under `remote_name` instead of the derived name.
    pub const fn renamed(self, remote_name: &'static str) -> Self {
        Self {
            remote_name: Some(remote_name),
            ..self
        }
    }

    /// Exclude this field from saves (it has no readable value).
    pub const fn write_only(self) -> Self {
        Self {
            readable: false,
            ..self
        }
    }

    /// Name the field is stored under.
    pub fn remote_key(&self) -> String {
        match self.remote_name {
            Some(name) => name.to_string(),
            None => lower_first(self.name),
        }
    }
}

/// Lower-case the first character of `name`.
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Field table of one persistable type.
#[derive(Debug, Clone, Copy)]
pub struct TypeSchema {
    pub type_name: &'static str,
    pub class_name: Option<&'static str>,
    pub fields: &'static [FieldDescriptor],
}

impl TypeSchema {
    pub const fn new(type_name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            type_name,
            class_name: None,
            fields,
        }
    }

    /// Store records of this type under `class_name` instead of the type name.
    pub const fn with_class_name(self, class_name: &'static str) -> Self {
        Self {
            class_name: Some(class_name),
            ..self
        }
    }

    /// Remote class name: the override if declared, else the type name.
    pub fn class_name(&self) -> &'static str {
        self.class_name.unwrap_or(self.type_name)
    }

    /// Descriptor of the field called `name`.
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Readable fields, in declaration order.
    pub fn readable_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        self.fields.iter().filter(|f| f.readable)
    }

    /// Fields marked as key.
    pub fn key_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_key)
    }
}
