//! Purpose: Record schema: the closed set of persisted entity types.
//! Exports: `RecordType`, `User`, `Order`, `Record`.
//! Role: Typed vocabulary shared by the registry, sessions, stores, and HTTP layer.
//! Invariants: `RecordType` is closed; adding a variant means updating the
//! registry wiring and the owning store's schema together.
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RecordType {
    User,
    Order,
}

impl RecordType {
    pub const ALL: [RecordType; 2] = [RecordType::User, RecordType::Order];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::User => "user",
            RecordType::Order => "order",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            RecordType::User => "users",
            RecordType::Order => "orders",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" | "users" => Some(RecordType::User),
            "order" | "orders" => Some(RecordType::Order),
            _ => None,
        }
    }
}

/// `id` is `None` until the owning store commits the record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Order {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub item: String,
    pub quantity: i64,
}

impl Order {
    pub fn new(item: impl Into<String>, quantity: i64) -> Self {
        Self {
            id: None,
            item: item.into(),
            quantity,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    User(User),
    Order(Order),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::User(_) => RecordType::User,
            Record::Order(_) => RecordType::Order,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Record::User(user) => user.id,
            Record::Order(order) => order.id,
        }
    }
}

impl From<User> for Record {
    fn from(user: User) -> Self {
        Record::User(user)
    }
}

impl From<Order> for Record {
    fn from(order: Order) -> Self {
        Record::Order(order)
    }
}
