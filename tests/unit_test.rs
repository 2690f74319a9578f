// Unit tests for booking-admin
// These tests work with the public API of the library crate

#[cfg(test)]
mod config_tests {
    use booking_admin::config::{Cli, PAGE_SIZES, step_page_size};
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn test_demo_needs_no_credentials() {
        let cli = Cli::try_parse_from(["booking-admin", "--demo", "--config-dir", "/tmp/ba"]).unwrap();
        let s = cli.into_settings().unwrap();
        assert!(s.demo);
        assert!(s.credentials.is_none());
        assert_eq!(s.page_size, 10);
        assert_eq!(s.debounce, Duration::from_millis(500));
        assert_eq!(s.theme_path(), std::path::PathBuf::from("/tmp/ba/theme.conf"));
        assert_eq!(s.log_file, std::path::PathBuf::from("/tmp/ba/booking-admin.log"));
    }

    #[test]
    fn test_live_mode_requires_credentials() {
        let cli = Cli::try_parse_from(["booking-admin", "--config-dir", "/tmp/ba"]).unwrap();
        let err = cli.into_settings().unwrap_err();
        assert!(err.to_string().contains("--email"));
    }

    #[test]
    fn test_credentials_are_trimmed() {
        let cli = Cli::try_parse_from([
            "booking-admin",
            "--email",
            "  admin@x.io ",
            "--password",
            "pw",
            "--page-size",
            "20",
            "--debounce-ms",
            "250",
        ])
        .unwrap();
        let s = cli.into_settings().unwrap();
        let creds = s.credentials.unwrap();
        assert_eq!(creds.email, "admin@x.io");
        assert_eq!(s.page_size, 20);
        assert_eq!(s.debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_page_size_bounds_are_enforced() {
        assert!(Cli::try_parse_from(["booking-admin", "--demo", "--page-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["booking-admin", "--demo", "--page-size", "101"]).is_err());
        assert!(Cli::try_parse_from(["booking-admin", "--demo", "--page-size", "100"]).is_ok());
    }

    #[test]
    fn test_page_size_steps() {
        assert_eq!(step_page_size(10, true), 20);
        assert_eq!(step_page_size(10, false), 5);
        assert_eq!(step_page_size(7, true), 10);
        assert_eq!(step_page_size(PAGE_SIZES[0], false), PAGE_SIZES[0]);
        assert_eq!(step_page_size(50, true), 50);
        assert_eq!(step_page_size(100, false), 50);
    }
}

#[cfg(test)]
mod keymap_tests {
    use booking_admin::app::keymap::{KeyAction, Keymap};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(km: &Keymap, code: KeyCode, mods: KeyModifiers) -> Option<KeyAction> {
        km.resolve(&KeyEvent::new(code, mods))
    }

    #[test]
    fn test_default_bindings() {
        let km = Keymap::default();
        assert_eq!(press(&km, KeyCode::Char('q'), KeyModifiers::NONE), Some(KeyAction::Quit));
        assert_eq!(press(&km, KeyCode::Char('n'), KeyModifiers::NONE), Some(KeyAction::NewRecord));
        assert_eq!(press(&km, KeyCode::Delete, KeyModifiers::NONE), Some(KeyAction::DeleteSelection));
        assert_eq!(press(&km, KeyCode::PageDown, KeyModifiers::NONE), Some(KeyAction::NextPage));
        assert_eq!(press(&km, KeyCode::Tab, KeyModifiers::NONE), Some(KeyAction::NextTab));
        assert_eq!(press(&km, KeyCode::Esc, KeyModifiers::NONE), Some(KeyAction::Back));
    }

    #[test]
    fn test_keymap_file_roundtrip() {
        let mut path = std::env::temp_dir();
        path.push(format!("ba_keys_{}.conf", std::process::id()));
        let km = Keymap::parse("Refresh = Ctrl+r\n");
        km.write_file(&path).expect("write keymap");
        let loaded = Keymap::from_file(&path).expect("read keymap");
        assert_eq!(press(&loaded, KeyCode::Char('r'), KeyModifiers::CONTROL), Some(KeyAction::Refresh));
        assert_eq!(press(&loaded, KeyCode::Char('/'), KeyModifiers::NONE), Some(KeyAction::StartSearch));
        let _ = std::fs::remove_file(&path);
    }
}

#[cfg(test)]
mod search_tests {
    use booking_admin::search::{Debouncer, matches_any, normalize_keyword};
    use std::time::{Duration, Instant};

    #[test]
    fn test_debouncer_releases_only_the_last_text() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut d = Debouncer::new(ms(500));
        d.push("d", t0);
        d.push("de", t0 + ms(100));
        d.push("del", t0 + ms(200));
        assert_eq!(d.poll(t0 + ms(600)), None);
        assert_eq!(d.remaining(t0 + ms(600)), Some(ms(100)));
        assert_eq!(d.poll(t0 + ms(700)).as_deref(), Some("del"));
        assert_eq!(d.remaining(t0 + ms(700)), None);
        assert_eq!(d.poll(t0 + ms(2000)), None);
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        assert_eq!(normalize_keyword("  Deluxe "), "deluxe");
        assert!(matches_any("lux", ["DELUXE room"]));
        assert!(matches_any("", ["anything"]));
        assert!(!matches_any("pool", ["Studio", "Loft"]));
    }
}

#[cfg(test)]
mod paging_tests {
    use booking_admin::api::{Page, PageQuery, paginate};
    use booking_admin::model::Location;

    fn loc(id: i64, name: &str) -> Location {
        Location {
            id,
            name: name.to_string(),
            province: "P".into(),
            country: "C".into(),
            ..Location::default()
        }
    }

    #[test]
    fn test_query_is_clamped() {
        let q = PageQuery::new(0, 500, "x");
        assert_eq!(q.page_index, 1);
        assert_eq!(q.page_size, 100);
        assert_eq!(PageQuery::new(3, 0, "").page_size, 1);
    }

    #[test]
    fn test_paginate_filters_then_slices() {
        let rows: Vec<Location> = (1..=7)
            .map(|i| loc(i, if i % 2 == 0 { "Beach" } else { "Hill" }))
            .collect();
        let p = paginate(rows.clone(), &PageQuery::new(2, 2, "hill"));
        assert_eq!(p.total, 4);
        assert_eq!(p.rows.iter().map(|l| l.id).collect::<Vec<_>>(), vec![5, 7]);
        let past = paginate(rows, &PageQuery::new(9, 5, ""));
        assert!(past.rows.is_empty());
        assert_eq!(past.total, 7);
    }

    #[test]
    fn test_page_count_never_zero() {
        assert_eq!(Page::<Location>::page_count(0, 10), 1);
        assert_eq!(Page::<Location>::page_count(21, 10), 3);
        assert_eq!(Page::<Location>::page_count(20, 10), 2);
    }
}

#[cfg(test)]
mod form_tests {
    use booking_admin::manager::{EntityForm, FormMode};
    use booking_admin::model::{Booking, Location};

    fn type_into(form: &mut EntityForm<Location>, key: &str, text: &str) {
        form.state.focus = form.state.fields.iter().position(|f| f.key == key).unwrap();
        for c in text.chars() {
            form.state.input_char(c);
        }
    }

    #[test]
    fn test_create_form_builds_a_record() {
        let mut form = EntityForm::<Location>::create();
        assert_eq!(form.mode(), FormMode::Create);
        type_into(&mut form, "tenViTri", "Ben Thanh");
        type_into(&mut form, "tinhThanh", "Ho Chi Minh");
        type_into(&mut form, "quocGia", "Viet Nam");
        let built = form.build().unwrap();
        assert_eq!(built.name, "Ben Thanh");
        assert_eq!(built.country, "Viet Nam");
        assert_eq!(form.state.title(), "New location");
    }

    #[test]
    fn test_edit_form_touches_only_changed_fields() {
        let original = Location {
            id: 4,
            name: "Old".into(),
            province: "Hue".into(),
            country: "Viet Nam".into(),
            image: "a.png".into(),
            ..Location::default()
        };
        let mut form = EntityForm::edit(&original);
        type_into(&mut form, "tenViTri", "er");
        assert_eq!(form.state.dirty_count(), 1);
        let built = form.build().unwrap();
        assert_eq!(built.name, "Older");
        assert_eq!(built.image, "a.png");
        assert_eq!(built.id, 4);
    }

    #[test]
    fn test_booking_form_rejects_letters_in_numbers() {
        let mut form = EntityForm::<Booking>::create();
        let idx = form.state.fields.iter().position(|f| f.key == "soLuongKhach").unwrap();
        form.state.focus = idx;
        form.state.backspace();
        form.state.input_char('x');
        form.state.input_char('3');
        assert_eq!(form.state.values[idx], "3");
    }
}

#[cfg(test)]
mod dates_tests {
    use booking_admin::dates;
    use chrono::NaiveDate;

    #[test]
    fn test_offsets_are_normalized_to_utc_days() {
        let d = dates::parse("2024-03-01T01:30:00+07:00").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(dates::display("2024-03-05T00:00:00"), "2024-03-05");
        assert_eq!(dates::display("soon"), "soon");
        assert_eq!(dates::to_wire(d), "2024-02-29T00:00:00Z");
    }
}
