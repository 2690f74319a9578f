use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Column, DeleteStyle, Endpoint, Entity, EntityKind, FieldKind, FieldSpec, Listing, Scope};
use super::{nullable, parse_int, unknown_field};
use crate::dates;
use crate::error::ValidationError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "maPhong", default, deserialize_with = "nullable")]
    pub room_id: i64,
    #[serde(rename = "ngayDen", default, deserialize_with = "nullable")]
    pub check_in: String,
    #[serde(rename = "ngayDi", default, deserialize_with = "nullable")]
    pub check_out: String,
    #[serde(rename = "soLuongKhach", default, deserialize_with = "nullable")]
    pub guests: u32,
    #[serde(rename = "maNguoiDung", default, deserialize_with = "nullable")]
    pub user_id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Booking {
    /// Nights between check-in and check-out, when both dates parse.
    pub fn nights(&self) -> Option<i64> {
        let a = dates::parse(&self.check_in)?;
        let b = dates::parse(&self.check_out)?;
        Some((b - a).num_days())
    }
}

static COLUMNS: [Column; 7] = [
    Column { title: "ID", width: 6 },
    Column { title: "ROOM", width: 8 },
    Column { title: "CHECK-IN", width: 11 },
    Column { title: "CHECK-OUT", width: 11 },
    Column { title: "NIGHTS", width: 6 },
    Column { title: "GUESTS", width: 6 },
    Column { title: "USER", width: 0 },
];

static FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("maNguoiDung", "User ID", FieldKind::Integer { min: 1, max: i64::MAX }),
    FieldSpec::new("maPhong", "Room ID", FieldKind::Integer { min: 1, max: i64::MAX }),
    FieldSpec::new("ngayDen", "Check-in", FieldKind::Date),
    FieldSpec::new("ngayDi", "Check-out", FieldKind::Date),
    FieldSpec::new("soLuongKhach", "Guests", FieldKind::Integer { min: 1, max: 100 }),
];

fn set_date(field: &'static str, slot: &mut String, raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        slot.clear();
        return Ok(());
    }
    let d = dates::parse(raw)
        .ok_or_else(|| ValidationError::new(field, format!("'{}' is not a date", raw.trim())))?;
    *slot = dates::to_wire(d);
    Ok(())
}

impl Entity for Booking {
    const KIND: EntityKind = EntityKind::Booking;
    const ENDPOINT: Endpoint = Endpoint {
        collection: "/api/dat-phong",
        listing: Listing::Full,
        delete: DeleteStyle::Path,
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
            self.room_id.to_string(),
            dates::display(&self.check_in),
            dates::display(&self.check_out),
            self.nights().map(|n| n.to_string()).unwrap_or_default(),
            self.guests.to_string(),
            self.user_id.to_string(),
        ]
    }

    fn fields() -> &'static [FieldSpec] {
        &FIELDS
    }

    fn field(&self, key: &str) -> String {
        match key {
            "maNguoiDung" => self.user_id.to_string(),
            "maPhong" => self.room_id.to_string(),
            "ngayDen" => dates::display(&self.check_in),
            "ngayDi" => dates::display(&self.check_out),
            "soLuongKhach" => self.guests.to_string(),
            _ => String::new(),
        }
    }

    fn set_field(&mut self, key: &str, raw: &str) -> Result<(), ValidationError> {
        match key {
            "maNguoiDung" => self.user_id = parse_int("maNguoiDung", raw, 1, i64::MAX)?,
            "maPhong" => self.room_id = parse_int("maPhong", raw, 1, i64::MAX)?,
            "ngayDen" => set_date("ngayDen", &mut self.check_in, raw)?,
            "ngayDi" => set_date("ngayDi", &mut self.check_out, raw)?,
            "soLuongKhach" => self.guests = parse_int("soLuongKhach", raw, 1, 100)? as u32,
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id <= 0 {
            return Err(ValidationError::new("maNguoiDung", "is required"));
        }
        if self.room_id <= 0 {
            return Err(ValidationError::new("maPhong", "is required"));
        }
        if !(1..=100).contains(&self.guests) {
            return Err(ValidationError::new("soLuongKhach", "must be between 1 and 100"));
        }
        let check_in = dates::parse(&self.check_in)
            .ok_or_else(|| ValidationError::new("ngayDen", "is required"))?;
        let check_out = dates::parse(&self.check_out)
            .ok_or_else(|| ValidationError::new("ngayDi", "is required"))?;
        if check_out <= check_in {
            return Err(ValidationError::new("ngayDi", "must be after check-in"));
        }
        Ok(())
    }

    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.room_id.to_string().contains(needle)
            || self.user_id.to_string().contains(needle)
    }

    fn normalize(&mut self) {
        if let Some(d) = dates::parse(&self.check_in) {
            self.check_in = dates::to_wire(d);
        }
        if let Some(d) = dates::parse(&self.check_out) {
            self.check_out = dates::to_wire(d);
        }
    }

    fn scoped_path(scope: Scope) -> Option<String> {
        match scope {
            Scope::ByUser(id) => Some(format!("{}/lay-theo-nguoi-dung/{id}", Self::ENDPOINT.collection)),
            _ => None,
        }
    }

    fn in_scope(&self, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::ByUser(id) => self.user_id == id,
            Scope::ByLocation(_) => false,
        }
    }

    fn room_ref(&self) -> Option<i64> {
        (self.room_id > 0).then_some(self.room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(check_in: &str, check_out: &str) -> Booking {
        Booking {
            id: 1,
            room_id: 10,
            check_in: check_in.into(),
            check_out: check_out.into(),
            guests: 2,
            user_id: 7,
            extra: Map::new(),
        }
    }

    #[test]
    fn dates_normalize_to_midnight_utc() {
        let mut b = booking("2024-05-01T01:00:00+07:00", "2024-05-03");
        b.normalize();
        assert_eq!(b.check_in, "2024-04-30T00:00:00Z");
        assert_eq!(b.check_out, "2024-05-03T00:00:00Z");
        assert_eq!(b.nights(), Some(3));
        assert_eq!(b.cells()[2], "2024-04-30");
    }

    #[test]
    fn check_out_must_follow_check_in() {
        assert!(booking("2024-05-01", "2024-05-02").validate().is_ok());
        let err = booking("2024-05-02", "2024-05-02").validate().unwrap_err();
        assert_eq!(err.field, "ngayDi");
        let err = booking("", "2024-05-02").validate().unwrap_err();
        assert_eq!(err.field, "ngayDen");
    }

    #[test]
    fn keyword_matches_room_or_user_ids() {
        let b = booking("2024-05-01", "2024-05-02");
        assert!(b.matches("10"));
        assert!(b.matches("7"));
        assert!(!b.matches("99"));
        assert!(b.in_scope(Scope::ByUser(7)));
        assert!(!b.in_scope(Scope::ByUser(8)));
        assert_eq!(b.room_ref(), Some(10));
        assert_eq!(Booking::default().room_ref(), None);
    }
}
