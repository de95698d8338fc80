/// Property-based tests using proptest
/// Tests invariants and properties that should hold for all inputs
use proptest::prelude::*;
use rust_identity_api::classifier::classify;
use rust_identity_api::models::{
    ClientQuery, IdentificationType, RoutingClass, SourceKind, DATE_SENTINEL,
};
use rust_identity_api::normalizer::{normalize, normalize_date};
use rust_identity_api::validation::validate;
use serde_json::json;

fn canonical_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 19
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b'T'
        && bytes[13] == b':'
        && bytes[16] == b':'
}

// Property: classification is total and RNC ignores force-update
proptest! {
    #[test]
    fn rnc_always_routes_to_legal_entity(force_update in any::<bool>()) {
        prop_assert_eq!(classify(IdentificationType::Rnc, force_update), RoutingClass::LegalEntity);
    }

    #[test]
    fn cedula_routing_follows_force_update(force_update in any::<bool>()) {
        let expected = if force_update {
            RoutingClass::FallbackLookup
        } else {
            RoutingClass::MasterLookup
        };
        prop_assert_eq!(classify(IdentificationType::Cedula, force_update), expected);
    }
}

// Property: date canonicalization
proptest! {
    #[test]
    fn blank_dates_become_sentinel(spaces in "[ \t]{0,5}") {
        prop_assert_eq!(normalize_date(Some(&spaces)), DATE_SENTINEL);
    }

    #[test]
    fn year_one_dates_become_sentinel(suffix in "(T00:00:00)?") {
        let raw = format!("0001-01-01{}", suffix);
        prop_assert_eq!(normalize_date(Some(&raw)), DATE_SENTINEL);
    }

    #[test]
    fn calendar_dates_render_canonically(
        year in 1900i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        slash in any::<bool>()
    ) {
        let raw = if slash {
            format!("{:02}/{:02}/{}", day, month, year)
        } else {
            format!("{}-{:02}-{:02}", year, month, day)
        };
        let normalized = normalize_date(Some(&raw));
        prop_assert!(canonical_shape(&normalized));
        prop_assert_eq!(normalized, format!("{}-{:02}-{:02}T00:00:00", year, month, day));
    }

    #[test]
    fn date_normalization_is_idempotent(raw in "\\PC*") {
        let once = normalize_date(Some(&raw));
        prop_assert_eq!(normalize_date(Some(&once)), once.clone());
    }
}

// Property: normalization is deterministic and trims text
proptest! {
    #[test]
    fn fallback_normalization_is_deterministic(
        nombres in "[ ]{0,2}[A-Z ]{0,20}[ ]{0,2}",
        apellido in "[ ]{0,2}[A-Z]{0,12}[ ]{0,2}",
        fecha in prop::option::of("[0-9/ -]{0,12}")
    ) {
        let raw = json!({
            "cedula": "99999999999",
            "nombres": nombres,
            "apellido1": apellido,
            "fechaNacimiento": fecha
        });

        let first = normalize(SourceKind::FallbackRegistry, &raw).unwrap();
        let second = normalize(SourceKind::FallbackRegistry, &raw).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.names.as_str(), first.names.trim());
        prop_assert_eq!(first.first_last_name.as_str(), first.first_last_name.trim());
        prop_assert_eq!(first.cancellation_date.as_str(), DATE_SENTINEL);
        prop_assert_eq!(first.identification.type_.as_str(), "Cedula");
    }

    #[test]
    fn legal_entity_never_fills_person_fields(name in "[A-Z ]{1,30}") {
        let raw = json!({ "rnc": "101199662", "businessName": name });
        let record = normalize(SourceKind::LegalEntity, &raw).unwrap();

        prop_assert_eq!(record.identification.type_.as_str(), "RNC");
        prop_assert!(record.first_last_name.is_empty());
        prop_assert!(record.gender.is_empty());
        prop_assert_eq!(record.birth_date.as_str(), DATE_SENTINEL);
    }
}

// Property: validation never panics
proptest! {
    #[test]
    fn validation_never_panics(
        number in prop::option::of("\\PC*"),
        type_ in prop::option::of("\\PC*"),
        session in prop::option::of("\\PC*")
    ) {
        let _ = validate(ClientQuery {
            identification_number: number,
            identification_type: type_,
            force_update: None,
            include_binary_photo: None,
            session_id: session,
        });
    }

    #[test]
    fn eleven_digit_cedulas_validate(number in "[0-9]{11}") {
        let ctx = validate(ClientQuery {
            identification_number: Some(number.clone()),
            identification_type: Some("Cedula".to_string()),
            ..Default::default()
        }).unwrap();

        prop_assert_eq!(ctx.identification_number, number);
        prop_assert!(!ctx.session_id.is_empty());
        prop_assert!(!ctx.force_update);
    }
}
