//! Demo object graph: authors who befriend each other and write books.

use std::sync::{Arc, PoisonError, RwLock};

use recordgraph_core::{
    FieldDescriptor, FieldValue, PersistEnum, Persistable, Session, SessionSlot, TypeSchema,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Fiction,
    Poetry,
}

impl PersistEnum for Genre {
    fn to_int(&self) -> i64 {
        match self {
            Genre::Fiction => 0,
            Genre::Poetry => 1,
        }
    }
}

static AUTHOR: TypeSchema = TypeSchema::new(
    "Author",
    &[
        FieldDescriptor::scalar("Name").key(),
        FieldDescriptor::nested("BestFriend"),
        FieldDescriptor::collection("Books"),
    ],
);

pub struct Author {
    name: String,
    best_friend: RwLock<Option<Arc<Author>>>,
    books: RwLock<Vec<Arc<Book>>>,
    session: SessionSlot,
}

impl Author {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            best_friend: RwLock::new(None),
            books: RwLock::new(Vec::new()),
            session: SessionSlot::new(),
        })
    }

    pub fn befriend(&self, friend: &Arc<Author>) {
        *self
            .best_friend
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(friend.clone());
    }

    pub fn publish(self: &Arc<Self>, book: &Arc<Book>) {
        book.written_by(self);
        self.books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(book.clone());
    }
}

impl Persistable for Author {
    fn schema(&self) -> &'static TypeSchema {
        &AUTHOR
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Name" => Some(FieldValue::scalar(self.name.clone())),
            "BestFriend" => Some(FieldValue::nested(
                self.best_friend
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone(),
            )),
            "Books" => Some(FieldValue::collection(
                self.books
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .as_slice(),
            )),
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

static BOOK: TypeSchema = TypeSchema::new(
    "Book",
    &[
        FieldDescriptor::scalar("Isbn").key(),
        FieldDescriptor::scalar("Title").renamed("bookTitle"),
        FieldDescriptor::enumeration("Genre"),
        FieldDescriptor::nested("Author"),
    ],
);

pub struct Book {
    isbn: String,
    title: String,
    genre: Genre,
    author: RwLock<Option<Arc<Author>>>,
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

    fn written_by(&self, author: &Arc<Author>) {
        *self.author.write().unwrap_or_else(PoisonError::into_inner) = Some(author.clone());
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
            "Author" => Some(FieldValue::nested(
                self.author
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone(),
            )),
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

/// Jo and Amy are each other's best friend; Jo wrote two books.
pub fn demo_graph() -> Arc<Author> {
    let jo = Author::new("Jo");
    let amy = Author::new("Amy");
    jo.befriend(&amy);
    amy.befriend(&jo);
    jo.publish(&Book::new("978-0-00-000001-1", "Salt Roads", Genre::Fiction));
    jo.publish(&Book::new("978-0-00-000002-8", "Low Tide", Genre::Poetry));
    jo
}
