//! The `User` record.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A user as held by the store and exchanged on the wire.
///
/// `id` is `None` only before the first save; every record the store hands
/// back carries one. The text fields are free-form and may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl User {
    /// A not-yet-stored user with all three text fields set.
    pub fn new(
        name: impl Into<String>,
        phone_number: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            phone_number: Some(phone_number.into()),
            address: Some(address.into()),
        }
    }

    /// Replace the identifier, whatever it was before.
    pub fn with_id(self, id: UserId) -> Self {
        Self { id: Some(id), ..self }
    }

    /// Drop the identifier so the store assigns a fresh one.
    pub fn without_id(self) -> Self {
        Self { id: None, ..self }
    }

    /// Field-for-field equality on everything the client controls.
    pub fn same_details(&self, other: &User) -> bool {
        self.name == other.name
            && self.phone_number == other.phone_number
            && self.address == other.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_uses_camel_case_and_nulls() {
        let user = User {
            id: Some(UserId::new(3).unwrap()),
            name: Some("Bengt".into()),
            phone_number: None,
            address: Some("Dublin".into()),
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({ "id": 3, "name": "Bengt", "phoneNumber": null, "address": "Dublin" })
        );
    }

    #[test]
    fn missing_fields_decode_as_absent() {
        let user: User = serde_json::from_value(json!({ "name": "John" })).unwrap();
        assert_eq!(user.id, None);
        assert_eq!(user.name.as_deref(), Some("John"));
        assert_eq!(user.phone_number, None);
        assert_eq!(user.address, None);
    }

    #[test]
    fn with_id_overrides_existing_id() {
        let first = UserId::new(1).unwrap();
        let second = UserId::new(2).unwrap();

        let user = User::new("Bengt", "+35308511111111", "Dublin").with_id(first);
        let user = user.with_id(second);
        assert_eq!(user.id, Some(second));
        assert_eq!(user.clone().without_id().id, None);
        assert!(user.same_details(&User::new("Bengt", "+35308511111111", "Dublin")));
    }
}
