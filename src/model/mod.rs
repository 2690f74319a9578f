//! Entity records mirrored from the Remote API and the capability trait the
//! generic list manager, the API clients and the UI are written against.
//!
//! Records keep any JSON fields they do not model in a flattened `extra` map, so an
//! update sends back server-only fields untouched.

pub mod booking;
pub mod location;
pub mod room;
pub mod user;

pub use booking::Booking;
pub use location::Location;
pub use room::Room;
pub use user::{Role, User};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Which entity a list view manages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Location,
    Room,
    Booking,
}

impl EntityKind {
    pub fn title(self) -> &'static str {
        match self {
            EntityKind::User => "Users",
            EntityKind::Location => "Locations",
            EntityKind::Room => "Rooms",
            EntityKind::Booking => "Bookings",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Location => "location",
            EntityKind::Room => "room",
            EntityKind::Booking => "booking",
        }
    }
}

/// Restricts a listing to the rows related to another entity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    All,
    /// Bookings made by one user.
    ByUser(i64),
    /// Rooms at one location.
    ByLocation(i64),
}

/// How the collection is listed by the Remote API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    /// `GET {collection}/phan-trang-tim-kiem?pageIndex&pageSize&keyword`
    ServerPaged,
    /// `GET {collection}` returns everything; filtering and paging happen client side.
    Full,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeleteStyle {
    /// `DELETE {collection}/{id}`
    Path,
    /// `DELETE {collection}?id={id}`
    Query,
}

#[derive(Copy, Clone, Debug)]
pub struct Endpoint {
    pub collection: &'static str,
    pub listing: Listing,
    pub delete: DeleteStyle,
}

impl Endpoint {
    pub fn search_path(&self) -> String {
        format!("{}/phan-trang-tim-kiem", self.collection)
    }

    pub fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.collection, id)
    }
}

/// Table column: header and fixed width (0 lets the column fill).
#[derive(Copy, Clone, Debug)]
pub struct Column {
    pub title: &'static str,
    pub width: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Masked on screen, never prefilled.
    Secret,
    Integer { min: i64, max: i64 },
    Flag,
    Date,
    Choice(&'static [&'static str]),
}

/// One editable field of a create/update form.
#[derive(Copy, Clone, Debug)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Whether the update form may change it; create forms show every field.
    pub on_update: bool,
}

impl FieldSpec {
    pub const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            on_update: true,
        }
    }

    pub const fn create_only(mut self) -> Self {
        self.on_update = false;
        self
    }
}

/// Everything the list manager, the API clients and the UI need from a record type.
pub trait Entity:
    Clone + std::fmt::Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;
    const ENDPOINT: Endpoint;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);

    fn columns() -> &'static [Column];
    fn cells(&self) -> Vec<String>;

    fn fields() -> &'static [FieldSpec];
    /// Current value of a form field in its editable text form.
    fn field(&self, key: &str) -> String;
    fn set_field(&mut self, key: &str, raw: &str) -> Result<(), ValidationError>;

    fn validate(&self) -> Result<(), ValidationError>;

    /// Case-insensitive keyword match; `needle` is already normalized.
    fn matches(&self, needle: &str) -> bool;

    /// Canonicalize values before submission (dates to UTC).
    fn normalize(&mut self) {}

    /// Remote path listing the rows of a scope, for scopes this entity supports.
    fn scoped_path(_scope: Scope) -> Option<String> {
        None
    }

    fn in_scope(&self, scope: Scope) -> bool {
        matches!(scope, Scope::All)
    }

    /// Room this record refers to, so views can show its name next to the id.
    fn room_ref(&self) -> Option<i64> {
        None
    }

    /// Short human label used in confirmations.
    fn label(&self) -> String {
        format!("{} #{}", Self::KIND.singular(), self.id())
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![("ID", self.id().to_string())];
        out.extend(
            Self::fields()
                .iter()
                .filter(|f| f.kind != FieldKind::Secret)
                .map(|f| (f.label, self.field(f.key))),
        );
        out
    }
}

/// Deserialize `null` as the type's default; the API is loose about optional strings.
pub(crate) fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

pub(crate) fn parse_int(field: &'static str, raw: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let t = raw.trim();
    let n: i64 = if t.is_empty() {
        0
    } else {
        t.parse()
            .map_err(|_| ValidationError::new(field, format!("'{t}' is not a number")))?
    };
    if n < min || n > max {
        return Err(ValidationError::new(field, format!("must be between {min} and {max}")));
    }
    Ok(n)
}

pub(crate) fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on" | "x")
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "is required"))
    } else {
        Ok(())
    }
}

pub(crate) fn flag_text(v: bool) -> String {
    if v { "true".into() } else { "false".into() }
}

pub(crate) fn unknown_field(key: &str) -> ValidationError {
    ValidationError::new("form", format!("unknown field '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_parsing_enforces_range() {
        assert_eq!(parse_int("khach", " 4 ", 1, 100), Ok(4));
        assert_eq!(parse_int("khach", "", 0, 100), Ok(0));
        assert!(parse_int("khach", "0", 1, 100).is_err());
        let err = parse_int("giaTien", "abc", 0, 10).unwrap_err();
        assert_eq!(err.field, "giaTien");
    }

    #[test]
    fn endpoint_paths() {
        let ep = Room::ENDPOINT;
        assert_eq!(ep.search_path(), "/api/phong-thue/phan-trang-tim-kiem");
        assert_eq!(ep.item_path(7), "/api/phong-thue/7");
        assert_eq!(User::ENDPOINT.delete, DeleteStyle::Query);
        assert_eq!(Booking::ENDPOINT.listing, Listing::Full);
    }

    #[test]
    fn details_hide_secrets() {
        let u = User {
            id: 3,
            name: "An".into(),
            password: Some("hunter2".into()),
            ..User::default()
        };
        let details = u.details();
        assert_eq!(details[0], ("ID", "3".to_string()));
        assert!(details.iter().all(|(_, v)| v != "hunter2"));
    }
}
