//! Sample family records used by the workflow.

use serde::{Deserialize, Serialize};
use std::fmt;

use docflow_core::document::Document;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    pub first_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub given_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    pub first_name: String,
    pub gender: String,
    pub grade: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pets: Vec<Pet>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub state: String,
    pub county: String,
    pub city: String,
}

/// A family document, keyed by `id` and discriminated by `lastName`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    pub last_name: String,
    pub parents: Vec<Parent>,
    pub children: Vec<Child>,
    pub address: Address,
    pub is_registered: bool,
}

impl Document for Family {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "Family({})", self.id),
        }
    }
}

fn parent(family_name: Option<&str>, first_name: &str) -> Parent {
    Parent {
        family_name: family_name.map(str::to_string),
        first_name: first_name.to_string(),
    }
}

fn pet(given_name: &str) -> Pet {
    Pet { given_name: given_name.to_string() }
}

/// The Andersen family of Seattle.
pub fn andersen() -> Family {
    Family {
        id: "Andersen.1".into(),
        last_name: "Andersen".into(),
        parents: vec![parent(None, "Thomas"), parent(None, "Mary Kay")],
        children: vec![Child {
            family_name: None,
            first_name: "Henriette Thaulow".into(),
            gender: "female".into(),
            grade: 5,
            pets: vec![pet("Fluffy")],
        }],
        address: Address {
            state: "WA".into(),
            county: "King".into(),
            city: "Seattle".into(),
        },
        is_registered: true,
    }
}

/// The Wakefield family of Manhattan.
pub fn wakefield() -> Family {
    Family {
        id: "Wakefield.7".into(),
        last_name: "Wakefield".into(),
        parents: vec![
            parent(Some("Wakefield"), "Robin"),
            parent(Some("Miller"), "Ben"),
        ],
        children: vec![
            Child {
                family_name: Some("Merriam".into()),
                first_name: "Jesse".into(),
                gender: "female".into(),
                grade: 8,
                pets: vec![pet("Goofy"), pet("Shadow")],
            },
            Child {
                family_name: Some("Miller".into()),
                first_name: "Lisa".into(),
                gender: "female".into(),
                grade: 1,
                pets: Vec::new(),
            },
        ],
        address: Address {
            state: "NY".into(),
            county: "Manhattan".into(),
            city: "NY".into(),
        },
        is_registered: false,
    }
}
