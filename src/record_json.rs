//! Purpose: Shared JSON shapes for records emitted by the CLI and server.
//! Exports: `record_json`, `records_json`.
//! Role: Keep stdout and HTTP payloads aligned from one source.
//! Invariants: Field names match the store schema (`id`, `name`, `email`,
//! `item`, `quantity`).

use serde_json::{Value, json};

use blendb::api::Record;

pub(crate) fn records_json(records: &[Record]) -> Vec<Value> {
    records.iter().map(record_json).collect()
}

pub(crate) fn record_json(record: &Record) -> Value {
    match record {
        Record::User(user) => json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
        }),
        Record::Order(order) => json!({
            "id": order.id,
            "item": order.item,
            "quantity": order.quantity,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::record_json;
    use blendb::api::{Order, Record, User};

    #[test]
    fn record_json_field_names_are_stable() {
        let user = record_json(&Record::User(User {
            id: Some(1),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
        }));
        assert_eq!(user["id"], 1);
        assert_eq!(user["name"], "John Doe");
        assert_eq!(user["email"], "john@example.com");

        let order = record_json(&Record::Order(Order::new("Phone", 2)));
        assert_eq!(order["item"], "Phone");
        assert_eq!(order["quantity"], 2);
        assert!(order["id"].is_null());
    }
}
