use serde::{Deserialize, Serialize};

/// Profile record returned by `GET /user/`. Read-only from the client's
/// perspective; extra server-side fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_parses_with_and_without_email() {
        let full: User =
            serde_json::from_str(r#"{"id": 1, "username": "alice", "email": "a@example.com"}"#)
                .unwrap();
        assert_eq!(full.username, "alice");
        assert_eq!(full.email.as_deref(), Some("a@example.com"));

        let bare: User = serde_json::from_str(r#"{"id": 2, "username": "bob"}"#).unwrap();
        assert!(bare.email.is_none());
    }
}
