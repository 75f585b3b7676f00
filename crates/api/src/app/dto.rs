use serde::Deserialize;

use userdir_core::User;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /users` and `PUT /users/{id}`.
///
/// Has no `id` field: a client-supplied id is dropped during decoding, and the
/// handler decides the id (store-assigned on create, path value on update).
/// Omitted fields decode as absent, which a PUT writes through as `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl UserPayload {
    pub fn into_user(self) -> User {
        User {
            id: None,
            name: self.name,
            phone_number: self.phone_number,
            address: self.address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ignores_client_id() {
        let payload: UserPayload = serde_json::from_value(json!({
            "id": 77,
            "name": "Bengt",
            "phoneNumber": "+35308511111111",
            "address": "Dublin",
        }))
        .unwrap();

        let user = payload.into_user();
        assert_eq!(user.id, None);
        assert_eq!(user.phone_number.as_deref(), Some("+35308511111111"));
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let result = serde_json::from_value::<UserPayload>(json!({ "name": 5 }));
        assert!(result.is_err());
    }
}
