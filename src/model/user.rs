use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Column, DeleteStyle, Endpoint, Entity, EntityKind, FieldKind, FieldSpec, Listing};
use super::{nullable, require, unknown_field};
use crate::dates;
use crate::error::ValidationError;
use crate::search::matches_any;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN", alias = "admin", alias = "Admin")]
    Admin,
    #[default]
    #[serde(rename = "USER", alias = "user", alias = "User")]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub birthday: String,
    /// `true` is male.
    #[serde(default, deserialize_with = "nullable")]
    pub gender: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub role: Role,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

const GENDERS: &[&str] = &["male", "female"];
const ROLES: &[&str] = &["ADMIN", "USER"];

static COLUMNS: [Column; 7] = [
    Column { title: "ID", width: 6 },
    Column { title: "NAME", width: 22 },
    Column { title: "EMAIL", width: 0 },
    Column { title: "PHONE", width: 14 },
    Column { title: "BIRTHDAY", width: 11 },
    Column { title: "GENDER", width: 7 },
    Column { title: "ROLE", width: 6 },
];

static FIELDS: [FieldSpec; 7] = [
    FieldSpec::new("name", "Name", FieldKind::Text),
    FieldSpec::new("email", "Email", FieldKind::Text),
    FieldSpec::new("password", "Password", FieldKind::Secret).create_only(),
    FieldSpec::new("phone", "Phone", FieldKind::Text),
    FieldSpec::new("birthday", "Birthday", FieldKind::Date),
    FieldSpec::new("gender", "Gender", FieldKind::Choice(GENDERS)),
    FieldSpec::new("role", "Role", FieldKind::Choice(ROLES)),
];

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    const ENDPOINT: Endpoint = Endpoint {
        collection: "/api/users",
        listing: Listing::ServerPaged,
        delete: DeleteStyle::Query,
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            dates::display(&self.birthday),
            if self.gender { "male".into() } else { "female".into() },
            self.role.to_string(),
        ]
    }

    fn fields() -> &'static [FieldSpec] {
        &FIELDS
    }

    fn field(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "email" => self.email.clone(),
            "password" => String::new(),
            "phone" => self.phone.clone(),
            "birthday" => dates::display(&self.birthday),
            "gender" => {
                let g = if self.gender { GENDERS[0] } else { GENDERS[1] };
                g.to_string()
            }
            "role" => self.role.to_string(),
            _ => String::new(),
        }
    }

    fn set_field(&mut self, key: &str, raw: &str) -> Result<(), ValidationError> {
        match key {
            "name" => self.name = raw.trim().to_string(),
            "email" => self.email = raw.trim().to_string(),
            "password" => {
                self.password = if raw.is_empty() { None } else { Some(raw.to_string()) };
            }
            "phone" => self.phone = raw.trim().to_string(),
            "birthday" => {
                self.birthday = if raw.trim().is_empty() {
                    String::new()
                } else {
                    let d = dates::parse(raw)
                        .ok_or_else(|| ValidationError::new("birthday", format!("'{}' is not a date", raw.trim())))?;
                    dates::to_date_string(d)
                };
            }
            "gender" => self.gender = raw.trim().eq_ignore_ascii_case(GENDERS[0]),
            "role" => {
                self.role = Role::parse(raw)
                    .ok_or_else(|| ValidationError::new("role", "must be ADMIN or USER"))?;
            }
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        match self.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ValidationError::new("email", "is not an email address")),
        }
        if !self.birthday.trim().is_empty() && dates::parse(&self.birthday).is_none() {
            return Err(ValidationError::new("birthday", "is not a date"));
        }
        Ok(())
    }

    fn matches(&self, needle: &str) -> bool {
        matches_any(needle, [self.name.as_str(), self.email.as_str(), self.phone.as_str()])
    }

    fn normalize(&mut self) {
        if let Some(d) = dates::parse(&self.birthday) {
            self.birthday = dates::to_date_string(d);
        }
    }

    fn label(&self) -> String {
        format!("user '{}' (#{})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_shape_and_keeps_unknown_fields() {
        let json = r#"{
            "id": 12, "name": "Lan", "email": "lan@example.com", "password": null,
            "phone": null, "birthday": "20/10/1995", "avatar": "https://cdn/x.png",
            "gender": true, "role": "ADMIN"
        }"#;
        let u: User = serde_json::from_str(json).unwrap();
        assert_eq!(u.id, 12);
        assert_eq!(u.phone, "");
        assert!(u.is_admin());
        assert_eq!(u.extra.get("avatar").and_then(|v| v.as_str()), Some("https://cdn/x.png"));

        let back = serde_json::to_value(&u).unwrap();
        assert_eq!(back["avatar"], "https://cdn/x.png");
        assert!(back.get("password").is_none());
    }

    #[test]
    fn role_accepts_lowercase() {
        let u: User = serde_json::from_str(r#"{"id":1,"role":"user"}"#).unwrap();
        assert_eq!(u.role, Role::User);
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn validation_rules() {
        let mut u = User {
            name: "Minh".into(),
            email: "minh@example.com".into(),
            ..User::default()
        };
        assert!(u.validate().is_ok());
        u.email = "minh@".into();
        assert_eq!(u.validate().unwrap_err().field, "email");
        u.email = "minh@example.com".into();
        u.name = "  ".into();
        assert_eq!(u.validate().unwrap_err().field, "name");
    }

    #[test]
    fn form_fields_roundtrip_through_text() {
        let mut u = User::default();
        u.set_field("birthday", "01/02/2000").unwrap();
        assert_eq!(u.birthday, "2000-02-01");
        u.set_field("gender", "male").unwrap();
        assert!(u.gender);
        assert_eq!(u.field("gender"), "male");
        assert!(u.set_field("role", "owner").is_err());
        assert!(u.set_field("birthday", "someday").is_err());
        assert!(u.set_field("nickname", "x").is_err());
    }
}
