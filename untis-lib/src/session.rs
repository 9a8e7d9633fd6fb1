//! Per-client session record.

use serde::{Deserialize, Serialize};

/// An identity attached to a login, guardians may have one per ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    #[serde(rename = "type")]
    pub person_type: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub fore_name: String,
}

/// State of a logged in client.
///
/// A client without a session has no `Session` at all, so a value of this type always carries a
/// session id. Updates go through the `with_*` methods, each returning a new record merged with
/// the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    person_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    person_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    klasse_id: Option<i64>,
    #[serde(default, rename = "jwt_token", skip_serializing_if = "Option::is_none")]
    jwt_token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    persons: Vec<Person>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            person_id: None,
            person_type: None,
            klasse_id: None,
            jwt_token: None,
            persons: Vec::new(),
        }
    }

    pub fn with_person(self, person_id: i64, person_type: i64) -> Self {
        Self {
            person_id: Some(person_id),
            person_type: Some(person_type),
            ..self
        }
    }

    pub fn with_persons(self, persons: Vec<Person>) -> Self {
        Self { persons, ..self }
    }

    pub fn with_klasse_id(self, klasse_id: i64) -> Self {
        Self {
            klasse_id: Some(klasse_id),
            ..self
        }
    }

    pub fn with_jwt(self, jwt_token: impl Into<String>) -> Self {
        Self {
            jwt_token: Some(jwt_token.into()),
            ..self
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn person_id(&self) -> Option<i64> {
        self.person_id
    }

    pub fn person_type(&self) -> Option<i64> {
        self.person_type
    }

    pub fn klasse_id(&self) -> Option<i64> {
        self.klasse_id
    }

    pub fn jwt_token(&self) -> Option<&str> {
        self.jwt_token.as_deref()
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_keep_previous_fields() {
        let session = Session::new("abc")
            .with_person(1, 5)
            .with_klasse_id(99)
            .with_jwt("token");
        assert_eq!(session.session_id(), "abc");
        assert_eq!(session.person_id(), Some(1));
        assert_eq!(session.person_type(), Some(5));
        assert_eq!(session.klasse_id(), Some(99));
        assert_eq!(session.jwt_token(), Some("token"));
    }

    #[test]
    fn deserializes_authenticate_result() {
        let session: Session = serde_json::from_str(
            r#"{
                "sessionId": "123",
                "personId": 1,
                "personType": 5,
                "klasseId": 99,
                "persons": [
                    {"id": 1, "type": 5, "displayName": "Testing Person", "longName": "Testing Person", "foreName": "Testing"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(session.session_id(), "123");
        assert_eq!(session.klasse_id(), Some(99));
        assert_eq!(session.persons()[0].fore_name, "Testing");
    }

    #[test]
    fn serializes_only_known_fields() {
        let value = serde_json::to_value(Session::new("abc").with_person(3, 2)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"sessionId": "abc", "personId": 3, "personType": 2})
        );
    }
}
