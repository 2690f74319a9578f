use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Column, DeleteStyle, Endpoint, Entity, EntityKind, FieldKind, FieldSpec, Listing};
use super::{nullable, require, unknown_field};
use crate::error::ValidationError;
use crate::search::matches_any;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "tenViTri", default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "tinhThanh", default, deserialize_with = "nullable")]
    pub province: String,
    #[serde(rename = "quocGia", default, deserialize_with = "nullable")]
    pub country: String,
    #[serde(rename = "hinhAnh", default, deserialize_with = "nullable")]
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

static COLUMNS: [Column; 5] = [
    Column { title: "ID", width: 6 },
    Column { title: "NAME", width: 24 },
    Column { title: "PROVINCE", width: 18 },
    Column { title: "COUNTRY", width: 14 },
    Column { title: "IMAGE", width: 0 },
];

static FIELDS: [FieldSpec; 4] = [
    FieldSpec::new("tenViTri", "Name", FieldKind::Text),
    FieldSpec::new("tinhThanh", "Province", FieldKind::Text),
    FieldSpec::new("quocGia", "Country", FieldKind::Text),
    FieldSpec::new("hinhAnh", "Image URL", FieldKind::Text),
];

impl Entity for Location {
    const KIND: EntityKind = EntityKind::Location;
    const ENDPOINT: Endpoint = Endpoint {
        collection: "/api/vi-tri",
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
            self.province.clone(),
            self.country.clone(),
            self.image.clone(),
        ]
    }

    fn fields() -> &'static [FieldSpec] {
        &FIELDS
    }

    fn field(&self, key: &str) -> String {
        match key {
            "tenViTri" => self.name.clone(),
            "tinhThanh" => self.province.clone(),
            "quocGia" => self.country.clone(),
            "hinhAnh" => self.image.clone(),
            _ => String::new(),
        }
    }

    fn set_field(&mut self, key: &str, raw: &str) -> Result<(), ValidationError> {
        let v = raw.trim().to_string();
        match key {
            "tenViTri" => self.name = v,
            "tinhThanh" => self.province = v,
            "quocGia" => self.country = v,
            "hinhAnh" => self.image = v,
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("tenViTri", &self.name)?;
        require("tinhThanh", &self.province)?;
        require("quocGia", &self.country)
    }

    fn matches(&self, needle: &str) -> bool {
        matches_any(
            needle,
            [self.name.as_str(), self.province.as_str(), self.country.as_str()],
        )
    }

    fn label(&self) -> String {
        format!("location '{}' (#{})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_map_to_fields() {
        let json = r#"{"id":3,"tenViTri":"Ben Thanh","tinhThanh":"Ho Chi Minh","quocGia":"Viet Nam","hinhAnh":null}"#;
        let l: Location = serde_json::from_str(json).unwrap();
        assert_eq!(l.name, "Ben Thanh");
        assert_eq!(l.image, "");
        let v = serde_json::to_value(&l).unwrap();
        assert_eq!(v["tinhThanh"], "Ho Chi Minh");
        assert!(v.get("province").is_none());
    }

    #[test]
    fn name_like_fields_are_required() {
        let mut l = Location::default();
        assert_eq!(l.validate().unwrap_err().field, "tenViTri");
        l.set_field("tenViTri", "Hoi An").unwrap();
        l.set_field("tinhThanh", "Quang Nam").unwrap();
        assert_eq!(l.validate().unwrap_err().field, "quocGia");
        l.set_field("quocGia", "Viet Nam").unwrap();
        assert!(l.validate().is_ok());
        assert!(l.matches("quang"));
        assert!(!l.matches("hanoi"));
    }
}
