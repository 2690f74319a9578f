use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Column, DeleteStyle, Endpoint, Entity, EntityKind, FieldKind, FieldSpec, Listing, Scope};
use super::{flag_text, nullable, parse_flag, parse_int, require, unknown_field};
use crate::error::ValidationError;
use crate::search::matches_any;

const MAX_COUNT: i64 = 100;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "tenPhong", default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "khach", default, deserialize_with = "nullable")]
    pub guests: u32,
    #[serde(rename = "phongNgu", default, deserialize_with = "nullable")]
    pub bedrooms: u32,
    #[serde(rename = "giuong", default, deserialize_with = "nullable")]
    pub beds: u32,
    #[serde(rename = "phongTam", default, deserialize_with = "nullable")]
    pub baths: u32,
    #[serde(rename = "moTa", default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(rename = "giaTien", default, deserialize_with = "nullable")]
    pub price: u64,
    #[serde(flatten)]
    pub amenities: Amenities,
    #[serde(rename = "hinhAnh", default, deserialize_with = "nullable")]
    pub image: String,
    #[serde(rename = "maViTri", default, deserialize_with = "nullable")]
    pub location_id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Amenity flags; absent or null means the room does not have it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenities {
    #[serde(rename = "mayGiat", default, deserialize_with = "nullable")]
    pub washer: bool,
    #[serde(rename = "banLa", default, deserialize_with = "nullable")]
    pub iron: bool,
    #[serde(rename = "tivi", default, deserialize_with = "nullable")]
    pub tv: bool,
    #[serde(rename = "dieuHoa", default, deserialize_with = "nullable")]
    pub air_conditioning: bool,
    #[serde(rename = "wifi", default, deserialize_with = "nullable")]
    pub wifi: bool,
    #[serde(rename = "bep", default, deserialize_with = "nullable")]
    pub kitchen: bool,
    #[serde(rename = "doXe", default, deserialize_with = "nullable")]
    pub parking: bool,
    #[serde(rename = "hoBoi", default, deserialize_with = "nullable")]
    pub pool: bool,
    #[serde(rename = "banUi", default, deserialize_with = "nullable")]
    pub ironing_board: bool,
}

impl Amenities {
    fn slot(&mut self, key: &str) -> Option<&mut bool> {
        Some(match key {
            "mayGiat" => &mut self.washer,
            "banLa" => &mut self.iron,
            "tivi" => &mut self.tv,
            "dieuHoa" => &mut self.air_conditioning,
            "wifi" => &mut self.wifi,
            "bep" => &mut self.kitchen,
            "doXe" => &mut self.parking,
            "hoBoi" => &mut self.pool,
            "banUi" => &mut self.ironing_board,
            _ => return None,
        })
    }

    fn get(&self, key: &str) -> Option<bool> {
        let mut copy = *self;
        copy.slot(key).map(|v| *v)
    }

    /// Short names of the amenities that are present.
    pub fn summary(&self) -> String {
        let named = [
            (self.wifi, "wifi"),
            (self.air_conditioning, "ac"),
            (self.tv, "tv"),
            (self.kitchen, "kitchen"),
            (self.washer, "washer"),
            (self.iron, "iron"),
            (self.ironing_board, "board"),
            (self.parking, "parking"),
            (self.pool, "pool"),
        ];
        named
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, n)| *n)
            .collect::<Vec<_>>()
            .join(",")
    }
}

const COUNT: FieldKind = FieldKind::Integer { min: 0, max: MAX_COUNT };

static COLUMNS: [Column; 9] = [
    Column { title: "ID", width: 6 },
    Column { title: "NAME", width: 0 },
    Column { title: "GUESTS", width: 6 },
    Column { title: "BEDRM", width: 5 },
    Column { title: "BEDS", width: 4 },
    Column { title: "BATHS", width: 5 },
    Column { title: "PRICE", width: 8 },
    Column { title: "LOC", width: 5 },
    Column { title: "AMENITIES", width: 24 },
];

static FIELDS: [FieldSpec; 18] = [
    FieldSpec::new("tenPhong", "Name", FieldKind::Text),
    FieldSpec::new("khach", "Guests", FieldKind::Integer { min: 1, max: MAX_COUNT }),
    FieldSpec::new("phongNgu", "Bedrooms", COUNT),
    FieldSpec::new("giuong", "Beds", COUNT),
    FieldSpec::new("phongTam", "Bathrooms", COUNT),
    FieldSpec::new("moTa", "Description", FieldKind::Text),
    FieldSpec::new("giaTien", "Price", FieldKind::Integer { min: 0, max: i64::MAX }),
    FieldSpec::new("maViTri", "Location ID", FieldKind::Integer { min: 0, max: i64::MAX }),
    FieldSpec::new("hinhAnh", "Image URL", FieldKind::Text),
    FieldSpec::new("mayGiat", "Washer", FieldKind::Flag),
    FieldSpec::new("banLa", "Iron", FieldKind::Flag),
    FieldSpec::new("tivi", "TV", FieldKind::Flag),
    FieldSpec::new("dieuHoa", "Air conditioning", FieldKind::Flag),
    FieldSpec::new("wifi", "Wifi", FieldKind::Flag),
    FieldSpec::new("bep", "Kitchen", FieldKind::Flag),
    FieldSpec::new("doXe", "Parking", FieldKind::Flag),
    FieldSpec::new("hoBoi", "Pool", FieldKind::Flag),
    FieldSpec::new("banUi", "Ironing board", FieldKind::Flag),
];

impl Entity for Room {
    const KIND: EntityKind = EntityKind::Room;
    const ENDPOINT: Endpoint = Endpoint {
        collection: "/api/phong-thue",
        listing: Listing::ServerPaged,
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
            self.name.clone(),
            self.guests.to_string(),
            self.bedrooms.to_string(),
            self.beds.to_string(),
            self.baths.to_string(),
            self.price.to_string(),
            self.location_id.to_string(),
            self.amenities.summary(),
        ]
    }

    fn fields() -> &'static [FieldSpec] {
        &FIELDS
    }

    fn field(&self, key: &str) -> String {
        match key {
            "tenPhong" => self.name.clone(),
            "khach" => self.guests.to_string(),
            "phongNgu" => self.bedrooms.to_string(),
            "giuong" => self.beds.to_string(),
            "phongTam" => self.baths.to_string(),
            "moTa" => self.description.clone(),
            "giaTien" => self.price.to_string(),
            "maViTri" => self.location_id.to_string(),
            "hinhAnh" => self.image.clone(),
            other => self.amenities.get(other).map(flag_text).unwrap_or_default(),
        }
    }

    fn set_field(&mut self, key: &str, raw: &str) -> Result<(), ValidationError> {
        match key {
            "tenPhong" => self.name = raw.trim().to_string(),
            "khach" => self.guests = parse_int("khach", raw, 1, MAX_COUNT)? as u32,
            "phongNgu" => self.bedrooms = parse_int("phongNgu", raw, 0, MAX_COUNT)? as u32,
            "giuong" => self.beds = parse_int("giuong", raw, 0, MAX_COUNT)? as u32,
            "phongTam" => self.baths = parse_int("phongTam", raw, 0, MAX_COUNT)? as u32,
            "moTa" => self.description = raw.trim().to_string(),
            "giaTien" => self.price = parse_int("giaTien", raw, 0, i64::MAX)? as u64,
            "maViTri" => self.location_id = parse_int("maViTri", raw, 0, i64::MAX)?,
            "hinhAnh" => self.image = raw.trim().to_string(),
            other => match self.amenities.slot(other) {
                Some(slot) => *slot = parse_flag(raw),
                None => return Err(unknown_field(other)),
            },
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("tenPhong", &self.name)?;
        if self.guests < 1 || i64::from(self.guests) > MAX_COUNT {
            return Err(ValidationError::new("khach", format!("must be between 1 and {MAX_COUNT}")));
        }
        for (field, n) in [("phongNgu", self.bedrooms), ("giuong", self.beds), ("phongTam", self.baths)] {
            if i64::from(n) > MAX_COUNT {
                return Err(ValidationError::new(field, format!("must be between 0 and {MAX_COUNT}")));
            }
        }
        Ok(())
    }

    fn matches(&self, needle: &str) -> bool {
        matches_any(needle, [self.name.as_str(), self.description.as_str()])
    }

    fn scoped_path(scope: Scope) -> Option<String> {
        match scope {
            Scope::ByLocation(id) => Some(format!("{}/lay-phong-theo-vi-tri?maViTri={id}", Self::ENDPOINT.collection)),
            _ => None,
        }
    }

    fn in_scope(&self, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::ByLocation(id) => self.location_id == id,
            Scope::ByUser(_) => false,
        }
    }

    fn label(&self) -> String {
        format!("room '{}' (#{})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_amenities_default_to_false() {
        let json = r#"{"id":5,"tenPhong":"Studio","khach":2,"wifi":true,"hoBoi":null,"giaTien":40,"maViTri":3}"#;
        let r: Room = serde_json::from_str(json).unwrap();
        assert!(r.amenities.wifi);
        assert!(!r.amenities.pool);
        assert!(!r.amenities.washer);
        assert_eq!(r.amenities.summary(), "wifi");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["hoBoi"], false);
        assert_eq!(v["tenPhong"], "Studio");
    }

    #[test]
    fn flag_fields_are_editable_by_key() {
        let mut r = Room::default();
        r.set_field("bep", "true").unwrap();
        assert_eq!(r.field("bep"), "true");
        assert_eq!(r.field("doXe"), "false");
        assert!(r.set_field("sauna", "true").is_err());
    }

    #[test]
    fn numeric_ranges_are_checked() {
        let mut r = Room::default();
        assert!(r.set_field("khach", "0").is_err());
        assert!(r.set_field("giaTien", "-1").is_err());
        r.set_field("tenPhong", "Loft").unwrap();
        assert_eq!(r.validate().unwrap_err().field, "khach");
        r.set_field("khach", "3").unwrap();
        assert!(r.validate().is_ok());
    }

    #[test]
    fn location_scope() {
        let r = Room { location_id: 4, ..Room::default() };
        assert!(r.in_scope(Scope::ByLocation(4)));
        assert!(!r.in_scope(Scope::ByLocation(5)));
        assert_eq!(
            Room::scoped_path(Scope::ByLocation(4)).as_deref(),
            Some("/api/phong-thue/lay-phong-theo-vi-tri?maViTri=4")
        );
    }
}
