//! User-info normalization into the canonical profile shape.

use crate::error::{OAuth2Error, OAuth2Result};
use serde_json::Value;
use vkid_identity_core::{CanonicalProfile, ProfileName};

/// Parse a raw user-info body into a canonical profile.
///
/// Pure function of the body: parsing the same payload twice yields
/// structurally equal profiles. A payload without a resolvable non-empty
/// user id never yields a profile.
pub fn parse_profile(provider: &str, raw_body: &str) -> OAuth2Result<CanonicalProfile> {
    let payload: Value =
        serde_json::from_str(raw_body).map_err(OAuth2Error::profile_parse_json)?;

    let user = payload
        .get("user")
        .filter(|user| user.is_object())
        .ok_or_else(|| OAuth2Error::profile_parse("missing user object"))?;

    let id = string_field(user, &["user_id", "id"])
        .ok_or_else(|| OAuth2Error::profile_parse("missing user id"))?;

    let given_name = string_field(user, &["first_name", "firstName"]).unwrap_or_default();
    let family_name = string_field(user, &["last_name", "lastName"]).unwrap_or_default();
    let display_name = display_name(&given_name, &family_name);

    Ok(CanonicalProfile {
        provider: provider.to_string(),
        id,
        display_name,
        name: ProfileName {
            given_name,
            family_name,
        },
        email: string_field(user, &["email"]),
        email_verified: truthy_flag(user, "email_verified"),
        phone: string_field(user, &["phone"]),
        phone_verified: truthy_flag(user, "phone_verified"),
        avatar: string_field(user, &["avatar"]),
        gender: gender(user),
        raw: raw_body.to_string(),
        parsed: user.clone(),
    })
}

/// First non-empty value among `keys`; numbers are stringified.
fn string_field(user: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match user.get(*key) {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// A verified flag is carried through only when present and truthy.
fn truthy_flag(user: &Value, key: &str) -> Option<bool> {
    match user.get(key) {
        Some(Value::Bool(true)) => Some(true),
        Some(Value::Number(number)) if number.as_i64() != Some(0) => Some(true),
        Some(Value::String(text)) if !text.is_empty() && text != "0" && text != "false" => {
            Some(true)
        }
        _ => None,
    }
}

/// "given family", trimmed; a single non-empty part stands on its own.
fn display_name(given: &str, family: &str) -> Option<String> {
    let joined = format!("{given} {family}");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_string())
    }
}

/// VK `sex` code: 1 = female, 2 = male, anything else unresolved.
fn gender(user: &Value) -> Option<String> {
    match user.get("sex").and_then(Value::as_i64) {
        Some(1) => Some("female".to_string()),
        Some(2) => Some("male".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_user_yields_full_profile() {
        let body = r#"{ "user": { "user_id": "42", "first_name": "Anna", "last_name": "K" } }"#;
        let profile = parse_profile("vkid", body).unwrap();

        assert_eq!(profile.provider, "vkid");
        assert_eq!(profile.id, "42");
        assert_eq!(profile.display_name.as_deref(), Some("Anna K"));
        assert_eq!(profile.name.given_name, "Anna");
        assert_eq!(profile.name.family_name, "K");
        assert_eq!(profile.raw, body);
        assert_eq!(profile.parsed["user_id"], "42");
    }

    #[test]
    fn fallback_id_without_names() {
        let profile = parse_profile("vkid", r#"{ "user": { "id": "7" } }"#).unwrap();

        assert_eq!(profile.id, "7");
        assert_eq!(profile.display_name, None);
        assert_eq!(profile.name.given_name, "");
        assert_eq!(profile.name.family_name, "");
        assert_eq!(profile.email, None);
        assert_eq!(profile.phone, None);
        assert_eq!(profile.avatar, None);
    }

    #[test]
    fn user_id_wins_over_id() {
        let profile =
            parse_profile("vkid", r#"{ "user": { "user_id": "1", "id": "2" } }"#).unwrap();
        assert_eq!(profile.id, "1");
    }

    #[test]
    fn numeric_id_is_stringified() {
        let profile = parse_profile("vkid", r#"{ "user": { "user_id": 221486 } }"#).unwrap();
        assert_eq!(profile.id, "221486");
    }

    #[test]
    fn missing_user_id_is_a_parse_error() {
        let err = parse_profile("vkid", r#"{ "user": {} }"#).unwrap_err();
        assert!(
            matches!(&err, OAuth2Error::ProfileParse { reason, .. } if reason == "missing user id")
        );
    }

    #[test]
    fn empty_user_id_is_a_parse_error() {
        let err = parse_profile("vkid", r#"{ "user": { "user_id": "" } }"#).unwrap_err();
        assert!(matches!(err, OAuth2Error::ProfileParse { .. }));
    }

    #[test]
    fn missing_user_object_is_a_parse_error() {
        let err = parse_profile("vkid", r#"{ "status": "ok" }"#).unwrap_err();
        assert!(
            matches!(&err, OAuth2Error::ProfileParse { reason, .. } if reason == "missing user object")
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_profile("vkid", "{not json").unwrap_err();
        assert!(
            matches!(&err, OAuth2Error::ProfileParse { source, .. } if source.is_some())
        );
    }

    #[test]
    fn camel_case_name_spellings_are_accepted() {
        let body = r#"{ "user": { "user_id": "9", "firstName": "Ivan", "lastName": "P" } }"#;
        let profile = parse_profile("vkid", body).unwrap();
        assert_eq!(profile.name.given_name, "Ivan");
        assert_eq!(profile.display_name.as_deref(), Some("Ivan P"));
    }

    #[test]
    fn display_name_falls_back_to_single_part() {
        let body = r#"{ "user": { "user_id": "9", "last_name": "Petrova" } }"#;
        let profile = parse_profile("vkid", body).unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Petrova"));
    }

    #[test]
    fn optional_fields_only_present_when_truthy() {
        let body = r#"{ "user": {
            "user_id": "5",
            "email": "a@example.com",
            "email_verified": true,
            "phone": "+79990000000",
            "phone_verified": false,
            "avatar": "https://cdn.example.com/a.jpg",
            "sex": 2
        } }"#;
        let profile = parse_profile("vkid", body).unwrap();

        assert_eq!(profile.email.as_deref(), Some("a@example.com"));
        assert_eq!(profile.email_verified, Some(true));
        assert_eq!(profile.phone.as_deref(), Some("+79990000000"));
        assert_eq!(profile.phone_verified, None);
        assert_eq!(profile.avatar.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(profile.gender.as_deref(), Some("male"));
    }

    #[test]
    fn unknown_sex_code_leaves_gender_unresolved() {
        let profile = parse_profile("vkid", r#"{ "user": { "user_id": "5", "sex": 0 } }"#).unwrap();
        assert_eq!(profile.gender, None);
    }

    #[test]
    fn parsing_is_idempotent() {
        let body = r#"{ "user": { "user_id": "42", "first_name": "Anna", "last_name": "K", "email": "a@b.c" } }"#;
        let first = parse_profile("vkid", body).unwrap();
        let second = parse_profile("vkid", body).unwrap();
        assert_eq!(first, second);
    }
}
