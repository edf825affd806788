//! Persistable test models shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use recordgraph_core::{
    FieldDescriptor, FieldValue, PersistEnum, Persistable, Session, SessionSlot, TypeSchema, Value,
};
use recordgraph_state::fakes::MemoryRecordStore;

pub fn setup() -> (Arc<MemoryRecordStore>, Session) {
    let store = Arc::new(MemoryRecordStore::new());
    let session = Session::new(store.clone());
    (store, session)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Fiction,
    Poetry,
    Essay,
}

impl PersistEnum for Genre {
    fn to_int(&self) -> i64 {
        match self {
            Genre::Fiction => 0,
            Genre::Poetry => 1,
            Genre::Essay => 2,
        }
    }
}

pub static AUTHOR: TypeSchema = TypeSchema::new(
    "Author",
    &[
        FieldDescriptor::scalar("Name").key(),
        FieldDescriptor::scalar("Rating"),
        FieldDescriptor::nested("BestFriend"),
        FieldDescriptor::collection("Books"),
        FieldDescriptor::scalar("Password").write_only(),
    ],
);

/// Author keyed by name, with a best friend and a bibliography.
pub struct Author {
    pub name: String,
    pub rating: RwLock<f64>,
    pub best_friend: RwLock<Option<Arc<Author>>>,
    pub books: RwLock<Vec<Arc<Book>>>,
    session: SessionSlot,
}

impl Author {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            rating: RwLock::new(3.5),
            best_friend: RwLock::new(None),
            books: RwLock::new(Vec::new()),
            session: SessionSlot::new(),
        })
    }

    pub fn befriend(&self, friend: &Arc<Author>) {
        *self.best_friend.write().unwrap() = Some(friend.clone());
    }

    pub fn add_book(&self, book: &Arc<Book>) {
        self.books.write().unwrap().push(book.clone());
    }

    pub fn set_rating(&self, rating: f64) {
        *self.rating.write().unwrap() = rating;
    }
}

impl Persistable for Author {
    fn schema(&self) -> &'static TypeSchema {
        &AUTHOR
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Name" => Some(FieldValue::scalar(self.name.clone())),
            "Rating" => Some(FieldValue::scalar(*self.rating.read().unwrap())),
            "BestFriend" => Some(FieldValue::nested(self.best_friend.read().unwrap().clone())),
            "Books" => Some(FieldValue::collection(self.books.read().unwrap().as_slice())),
            _ => None,
        }
    }

    fn session(&self) -> Option<Session> {
        self.session.get()
    }

    fn attach_session(&self, session: Session) {
        self.session.attach(session)
    }
}

pub static BOOK: TypeSchema = TypeSchema::new(
    "Book",
    &[
        FieldDescriptor::scalar("Isbn").key(),
        FieldDescriptor::scalar("Title").renamed("bookTitle"),
        FieldDescriptor::enumeration("Genre"),
        FieldDescriptor::nested("Author"),
    ],
)
.with_class_name("Volume");

/// Book stored under the class name `Volume`, pointing back at its author.
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub genre: Genre,
    pub author: RwLock<Option<Arc<Author>>>,
    session: SessionSlot,
}

impl Book {
    pub fn new(isbn: &str, title: &str, genre: Genre) -> Arc<Self> {
        Arc::new(Self {
            isbn: isbn.to_string(),
            title: title.to_string(),
            genre,
            author: RwLock::new(None),
            session: SessionSlot::new(),
        })
    }

    pub fn written_by(&self, author: &Arc<Author>) {
        *self.author.write().unwrap() = Some(author.clone());
    }
}

impl Persistable for Book {
    fn schema(&self) -> &'static TypeSchema {
        &BOOK
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Isbn" => Some(FieldValue::scalar(self.isbn.clone())),
            "Title" => Some(FieldValue::scalar(self.title.clone())),
            "Genre" => Some(FieldValue::enumeration(&self.genre)),
            "Author" => Some(FieldValue::nested(self.author.read().unwrap().clone())),
            _ => None,
        }
    }

    fn session(&self) -> Option<Session> {
        self.session.get()
    }

    fn attach_session(&self, session: Session) {
        self.session.attach(session)
    }
}

pub static NODE: TypeSchema = TypeSchema::new(
    "Node",
    &[
        FieldDescriptor::scalar("Label").key(),
        FieldDescriptor::nested("Next"),
    ],
);

/// Singly linked node, used to build cycles of any length.
pub struct Node {
    pub label: String,
    pub next: RwLock<Option<Arc<Node>>>,
    session: SessionSlot,
}

impl Node {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            next: RwLock::new(None),
            session: SessionSlot::new(),
        })
    }

    pub fn link(&self, next: &Arc<Node>) {
        *self.next.write().unwrap() = Some(next.clone());
    }
}

impl Persistable for Node {
    fn schema(&self) -> &'static TypeSchema {
        &NODE
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Label" => Some(FieldValue::scalar(self.label.clone())),
            "Next" => Some(FieldValue::nested(self.next.read().unwrap().clone())),
            _ => None,
        }
    }

    fn session(&self) -> Option<Session> {
        self.session.get()
    }

    fn attach_session(&self, session: Session) {
        self.session.attach(session)
    }
}

pub static UNKEYED: TypeSchema = TypeSchema::new("Unkeyed", &[FieldDescriptor::scalar("Name")]);

pub static DOUBLE_KEYED: TypeSchema = TypeSchema::new(
    "DoubleKeyed",
    &[
        FieldDescriptor::scalar("Left").key(),
        FieldDescriptor::scalar("Right").key(),
    ],
);

/// Model whose schema is chosen at construction, for key-field failures.
pub struct Fixed {
    pub schema: &'static TypeSchema,
    session: SessionSlot,
}

impl Fixed {
    pub fn new(schema: &'static TypeSchema) -> Arc<Self> {
        Arc::new(Self {
            schema,
            session: SessionSlot::new(),
        })
    }
}

impl Persistable for Fixed {
    fn schema(&self) -> &'static TypeSchema {
        self.schema
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        self.schema
            .field(name)
            .map(|_| FieldValue::Scalar(Value::from(name)))
    }

    fn session(&self) -> Option<Session> {
        self.session.get()
    }

    fn attach_session(&self, session: Session) {
        self.session.attach(session)
    }
}
