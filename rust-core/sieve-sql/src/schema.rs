// SPDX-License-Identifier: PMPL-1.0-or-later
//! Typed schema graph the join synthesizer walks.
//!
//! An [`Entity`] maps onto one table and names its columns, its
//! relationships to other entities, and any computed attributes that exist
//! on the model but cannot be queried.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use sieve_core::QueryError;

/// Declared SQL type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    BigInteger,
    Float,
    Numeric,
    Boolean,
    Date,
    DateTime,
    Time,
    Interval,
    Uuid,
    Json,
    Geometry,
}

impl ColumnType {
    /// Cast hint used for condition values when the condition has none.
    pub fn cast_hint(self) -> Option<&'static str> {
        match self {
            ColumnType::Text => Some("string"),
            ColumnType::Integer => Some("integer"),
            ColumnType::BigInteger => Some("biginteger"),
            ColumnType::Float => Some("float"),
            ColumnType::Numeric => Some("numeric"),
            ColumnType::Boolean => Some("boolean"),
            ColumnType::Date => Some("date"),
            ColumnType::DateTime => Some("datetime"),
            ColumnType::Time => Some("time"),
            ColumnType::Interval => Some("interval"),
            ColumnType::Uuid => Some("uuid"),
            ColumnType::Json | ColumnType::Geometry => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "biginteger",
            ColumnType::Float => "float",
            ColumnType::Numeric => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Time => "time",
            ColumnType::Interval => "interval",
            ColumnType::Uuid => "uuid",
            ColumnType::Json => "json",
            ColumnType::Geometry => "geometry",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// A navigable link from one entity to another.
///
/// The join condition is `owner.local_key = target.remote_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    /// Name of the target [`Entity`].
    pub target: String,
    pub local_key: String,
    pub remote_key: String,
    /// True when the owner can have many targets.
    pub collection: bool,
}

impl Relationship {
    /// Scalar relationship, e.g. `order.customer` via `order.customer_id = customer.id`.
    pub fn to_one(
        name: impl Into<String>,
        target: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            local_key: local_key.into(),
            remote_key: remote_key.into(),
            collection: false,
        }
    }

    /// Collection relationship, e.g. `customer.orders` via `customer.id = order.customer_id`.
    pub fn to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        Self {
            collection: true,
            ..Self::to_one(name, target, local_key, remote_key)
        }
    }
}

/// How a name on an entity classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute<'a> {
    Column(&'a Column),
    Relationship(&'a Relationship),
    /// Exists on the model but has no SQL mapping.
    Computed,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub computed: Vec<String>,
}

impl Entity {
    /// Entity with an `id` primary key and no columns yet.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            columns: Vec::new(),
            relationships: Vec::new(),
            computed: Vec::new(),
        }
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column {
            name: name.into(),
            column_type,
        });
        self
    }

    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn computed(mut self, name: impl Into<String>) -> Self {
        self.computed.push(name.into());
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Classify `name`. Columns shadow relationships of the same name.
    pub fn attribute(&self, name: &str) -> Attribute<'_> {
        if let Some(column) = self.get_column(name) {
            Attribute::Column(column)
        } else if let Some(relationship) = self.get_relationship(name) {
            Attribute::Relationship(relationship)
        } else if self.computed.iter().any(|c| c == name) {
            Attribute::Computed
        } else {
            Attribute::Missing
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn relationship_names(&self) -> Vec<String> {
        self.relationships.iter().map(|r| r.name.clone()).collect()
    }

    /// Columns followed by relationships.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names = self.column_names();
        names.extend(self.relationship_names());
        names
    }
}

/// All entities known to a relational backend, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    entities: BTreeMap<String, Entity>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity: Entity) -> Self {
        self.insert(entity);
        self
    }

    /// Add or replace an entity, returning the one it replaced.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.name.clone(), entity)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Like [`Self::entity`] but failing with [`QueryError::UnknownEntity`].
    pub fn lookup(&self, name: &str) -> Result<&Entity, QueryError> {
        self.entity(name)
            .ok_or_else(|| QueryError::UnknownEntity(name.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
