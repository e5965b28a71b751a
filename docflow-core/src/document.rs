//! Document trait and format conversions.
//!
//! A document is any serde type with a string id that is unique within its collection.
//! Documents are stored as BSON; [`DocumentExt`] converts between the typed value, BSON,
//! and JSON.

use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Field under which every stored document carries its id.
pub const ID_FIELD: &str = "id";

/// Core trait that all documents stored in a collection must implement.
///
/// The type must serialize to a BSON document whose [`ID_FIELD`] equals [`Document::id`].
///
/// # Example
///
/// ```ignore
/// use docflow::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Note {
///     pub id: String,
///     pub body: String,
/// }
///
/// impl Document for Note {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Document: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns this document's id.
    fn id(&self) -> &str;
}

/// Serialization helpers, implemented for every [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document to a BSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the document does not carry its id
    /// under [`ID_FIELD`].
    fn to_bson(&self) -> DocumentStoreResult<Bson>;

    /// Creates a document from a stored BSON value.
    fn from_bson(bson: Bson) -> DocumentStoreResult<Self>;

    fn to_json(&self) -> DocumentStoreResult<Value>;

    fn from_json(value: Value) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_bson(&self) -> DocumentStoreResult<Bson> {
        let bson = serialize_to_bson(self)?;
        check_id(&bson, self.id())?;

        Ok(bson)
    }

    fn from_bson(bson: Bson) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }

    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

/// Returns the id a stored document carries, if any.
pub fn document_id(document: &Bson) -> Option<&str> {
    document
        .as_document()
        .and_then(|doc| doc.get_str(ID_FIELD).ok())
}

/// Ensures `document` is a BSON document whose id field equals `id`.
pub fn check_id(document: &Bson, id: &str) -> DocumentStoreResult<()> {
    if document.as_document().is_none() {
        return Err(DocumentStoreError::Validation(
            "document must serialize to a BSON document".into(),
        ));
    }

    match document_id(document) {
        Some(found) if found == id => Ok(()),
        Some(found) => Err(DocumentStoreError::Validation(format!(
            "document id field {found:?} does not match {id:?}"
        ))),
        None => Err(DocumentStoreError::Validation(format!(
            "document is missing a string {ID_FIELD:?} field"
        ))),
    }
}
