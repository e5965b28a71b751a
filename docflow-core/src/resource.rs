//! Resource model for the containers of a document store.
//!
//! A store holds named [`Database`]s, each database holds named collections
//! ([`CollectionResource`]), and each collection holds documents. Databases and collections
//! are provisioned once and never mutated afterwards; the settings a collection is created
//! with travel in a [`CollectionSpec`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DocumentStoreError, DocumentStoreResult, ResourceKind};

/// Longest id accepted for databases, collections and documents.
pub const MAX_RESOURCE_NAME_LEN: usize = 255;

const FORBIDDEN_NAME_CHARS: [char; 4] = ['/', '\\', '?', '#'];

/// Checks a resource id against the store's naming rules.
///
/// Ids must be non-empty, at most [`MAX_RESOURCE_NAME_LEN`] characters long, and must not
/// contain `/`, `\`, `?` or `#`.
pub fn validate_name(kind: ResourceKind, name: &str) -> DocumentStoreResult<()> {
    if name.is_empty() {
        return Err(DocumentStoreError::Validation(format!("{kind} id must not be empty")));
    }
    if name.chars().count() > MAX_RESOURCE_NAME_LEN {
        return Err(DocumentStoreError::Validation(format!(
            "{kind} id exceeds {MAX_RESOURCE_NAME_LEN} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(DocumentStoreError::Validation(format!(
            "{kind} id {name:?} contains forbidden character {c:?}"
        )));
    }

    Ok(())
}

/// System properties assigned by the store when a resource is created.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceMeta {
    /// Store-assigned resource id.
    pub rid: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ResourceMeta {
    /// Fresh system properties for a resource created now.
    pub fn assign() -> Self {
        Self {
            rid: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }
}

/// A provisioned database.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Database {
    pub id: String,
    pub meta: ResourceMeta,
}

/// A provisioned collection together with the settings it was created with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CollectionResource {
    pub id: String,
    pub database: String,
    pub indexing_policy: IndexingPolicy,
    pub throughput: Throughput,
    pub meta: ResourceMeta,
}

/// Value type covered by a range index.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    String,
    Number,
}

/// Index precision in bytes.
///
/// Serialized with the store's convention of `-1` for maximum precision.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(into = "i16", try_from = "i16")]
pub enum Precision {
    Maximum,
    Bytes(u8),
}

impl Precision {
    /// Largest explicit precision the store accepts.
    pub const MAX_BYTES: u8 = 100;
}

impl From<Precision> for i16 {
    fn from(precision: Precision) -> Self {
        match precision {
            Precision::Maximum => -1,
            Precision::Bytes(bytes) => bytes as i16,
        }
    }
}

impl TryFrom<i16> for Precision {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Precision::Maximum),
            1..=100 => Ok(Precision::Bytes(value as u8)),
            _ => Err(format!("invalid index precision {value}")),
        }
    }
}

/// A range index over every value of one data type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeIndex {
    pub data_type: DataType,
    pub precision: Precision,
}

/// Declares which value types a collection indexes, and how precisely.
///
/// The default indexes strings with a range index of maximum precision, which allows
/// equality and range predicates over any string field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexingPolicy {
    pub range_indexes: Vec<RangeIndex>,
}

impl IndexingPolicy {
    /// A policy with a single range index.
    pub fn range(data_type: DataType, precision: Precision) -> Self {
        Self {
            range_indexes: vec![RangeIndex { data_type, precision }],
        }
    }

    /// Adds another range index to the policy.
    pub fn with_range(mut self, data_type: DataType, precision: Precision) -> Self {
        self.range_indexes.push(RangeIndex { data_type, precision });
        self
    }

    pub fn indexes(&self, data_type: DataType) -> bool {
        self.range_indexes
            .iter()
            .any(|index| index.data_type == data_type)
    }

    pub fn validate(&self) -> DocumentStoreResult<()> {
        for index in &self.range_indexes {
            if let Precision::Bytes(bytes) = index.precision {
                if bytes == 0 || bytes > Precision::MAX_BYTES {
                    return Err(DocumentStoreError::Validation(format!(
                        "index precision {bytes} outside 1..={}",
                        Precision::MAX_BYTES
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self::range(DataType::String, Precision::Maximum)
    }
}

/// Provisioned request-unit budget of a collection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Throughput(pub u32);

impl Throughput {
    /// Smallest budget a collection can be provisioned with.
    pub const MIN: Throughput = Throughput(400);

    pub fn validate(&self) -> DocumentStoreResult<()> {
        if *self < Self::MIN {
            return Err(DocumentStoreError::Validation(format!(
                "throughput {} is below the minimum of {}",
                self.0,
                Self::MIN.0
            )));
        }

        Ok(())
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::MIN
    }
}

/// Settings applied when a collection is created.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CollectionSpec {
    pub indexing_policy: IndexingPolicy,
    pub throughput: Throughput,
}

impl CollectionSpec {
    pub fn new(indexing_policy: IndexingPolicy, throughput: Throughput) -> Self {
        Self { indexing_policy, throughput }
    }

    pub fn with_throughput(mut self, throughput: Throughput) -> Self {
        self.throughput = throughput;
        self
    }

    pub fn validate(&self) -> DocumentStoreResult<()> {
        self.indexing_policy.validate()?;
        self.throughput.validate()
    }
}
