//! Wire types shared by the gateways and view-models.
//!
//! Field names on the wire follow the backend (`nombre`, `precio`, `rol`).

use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned identifier; absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Unit price
    #[serde(rename = "precio")]
    pub price: f64,
    pub stock: i64,
}

impl Product {
    pub fn new(name: impl Into<String>, price: f64, stock: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            stock,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// The server id, treating `0` as not yet assigned.
    pub fn assigned_id(&self) -> Option<i64> {
        assigned(self.id)
    }

    /// Price times stock for this line.
    pub fn value(&self) -> f64 {
        self.price * self.stock as f64
    }
}

/// The logged-in user record, as returned by the login endpoint and persisted
/// under `currentUser`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: String,
    /// Display name
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "rol", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// A record is usable only when it carries a name or an identifier.
    pub fn is_identified(&self) -> bool {
        assigned(self.id).is_some() || self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Name to greet the user with, falling back to `fallback` (the login name).
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(fallback)
    }
}

/// Backend ids start at 1; `0` means none.
pub fn assigned(id: Option<i64>) -> Option<i64> {
    id.filter(|&id| id != 0)
}
