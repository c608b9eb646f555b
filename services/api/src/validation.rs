//! Field validators: pure predicates over raw JSON values
//!
//! Every rule is total: same value in, same verdict out, never a panic.
//! Null fails every rule, presence included; nullability is a policy
//! concern, not a validator one.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::constants::{
    PASSWORD_MAX, PASSWORD_MIN, PrivilegeTier, RESERVED_USERNAMES, ResourceKind, TEXT_FIELD_MAX,
};

/// Closed set of validation rules a request field can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Any defined, non-null value, including `0`, `false`, `""`, `[]`, `{}`.
    Present,
    /// Numbers, or non-blank numeric strings. Booleans and arrays fail.
    Numeric,
    /// Strict JSON `true`/`false`.
    Boolean,
    /// Canonical 8-4-4-4-12 hex-with-dashes form, case-insensitive.
    Uuid,
    /// String containing `@` neither first nor last. Deliberately permissive:
    /// `what@that` passes; tightening would reject input the system accepts.
    Email,
    /// 6-28 chars with at least one ASCII letter and one ASCII digit.
    Password,
    /// Letter first, 2-27 further chars from [A-Za-z0-9_.@-], alphanumeric
    /// last, and not a reserved route word.
    Username,
    /// Integer member of the privilege tier enumeration.
    PrivilegeTier,
    /// Integer member of the resource kind enumeration.
    ResourceKind,
    /// RFC 3339 date-time, or a plain YYYY-MM-DD date.
    IsoDate,
    /// 1-254 chars, not entirely whitespace.
    BoundedText,
    /// Array whose elements all satisfy [`Rule::BoundedText`].
    TextList,
}

impl Rule {
    pub fn check(self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        match self {
            Rule::Present => true,
            Rule::Numeric => is_numeric(value),
            Rule::Boolean => value.is_boolean(),
            Rule::Uuid => value.as_str().is_some_and(is_uuid),
            Rule::Email => value.as_str().is_some_and(is_email),
            Rule::Password => value.as_str().is_some_and(is_password),
            Rule::Username => value.as_str().is_some_and(is_username),
            Rule::PrivilegeTier => {
                is_enum_member(value, |n| PrivilegeTier::try_from(n).is_ok())
            }
            Rule::ResourceKind => is_enum_member(value, |n| ResourceKind::try_from(n).is_ok()),
            Rule::IsoDate => value.as_str().is_some_and(is_iso_date),
            Rule::BoundedText => value.as_str().is_some_and(is_bounded_text),
            Rule::TextList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| Rule::BoundedText.check(v))),
        }
    }
}

fn is_numeric(value: &Value) -> bool {
    if value.is_number() {
        return true;
    }
    value.as_str().is_some_and(|s| {
        let trimmed = s.trim();
        !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(|n| n.is_finite())
    })
}

fn is_uuid(s: &str) -> bool {
    static UUID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = UUID_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("Failed to compile UUID regex")
    });
    regex.is_match(s)
}

fn is_email(s: &str) -> bool {
    match s.find('@') {
        Some(at) => at > 0 && at < s.len() - 1,
        None => false,
    }
}

fn is_password(s: &str) -> bool {
    let len = s.chars().count();
    (PASSWORD_MIN..=PASSWORD_MAX).contains(&len)
        && s.chars().any(|c| c.is_ascii_alphabetic())
        && s.chars().any(|c| c.is_ascii_digit())
}

fn is_username(s: &str) -> bool {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_.@-]{1,26}[A-Za-z0-9]$")
            .expect("Failed to compile username regex")
    });
    regex.is_match(s) && !RESERVED_USERNAMES.iter().any(|r| r.eq_ignore_ascii_case(s))
}

fn is_enum_member(value: &Value, member: impl Fn(i16) -> bool) -> bool {
    value
        .as_i64()
        .and_then(|n| i16::try_from(n).ok())
        .is_some_and(member)
}

fn is_iso_date(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_bounded_text(s: &str) -> bool {
    !s.trim().is_empty() && s.chars().count() <= TEXT_FIELD_MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence_accepts_every_defined_value() {
        for value in [json!(0), json!(false), json!(""), json!([]), json!({})] {
            assert!(Rule::Present.check(&value), "{value} should be present");
        }
        assert!(!Rule::Present.check(&Value::Null));
    }

    #[test]
    fn numeric_accepts_numbers_and_numeric_strings() {
        assert!(Rule::Numeric.check(&json!(42)));
        assert!(Rule::Numeric.check(&json!(-1.5)));
        assert!(Rule::Numeric.check(&json!("42")));
        assert!(Rule::Numeric.check(&json!("  3.14  ")));
        assert!(!Rule::Numeric.check(&json!("")));
        assert!(!Rule::Numeric.check(&json!("   ")));
        assert!(!Rule::Numeric.check(&json!(true)));
        assert!(!Rule::Numeric.check(&json!([1])));
        assert!(!Rule::Numeric.check(&json!("abc")));
    }

    #[test]
    fn boolean_is_strict() {
        assert!(Rule::Boolean.check(&json!(true)));
        assert!(Rule::Boolean.check(&json!(false)));
        assert!(!Rule::Boolean.check(&json!("true")));
        assert!(!Rule::Boolean.check(&json!(1)));
        assert!(!Rule::Boolean.check(&json!(0)));
    }

    #[test]
    fn uuid_requires_canonical_form() {
        assert!(Rule::Uuid.check(&json!("6f2a0bdc-9f6e-4d38-8a5b-5d9a3c3b2e1f")));
        assert!(Rule::Uuid.check(&json!("6F2A0BDC-9F6E-4D38-8A5B-5D9A3C3B2E1F")));
        assert!(!Rule::Uuid.check(&json!("6f2a0bdc9f6e4d388a5b5d9a3c3b2e1f")));
        assert!(!Rule::Uuid.check(&json!("not-a-uuid")));
        assert!(!Rule::Uuid.check(&json!(42)));
    }

    #[test]
    fn email_only_requires_a_non_edge_at_sign() {
        assert!(Rule::Email.check(&json!("a@b.com")));
        // permissive on purpose: no TLD required
        assert!(Rule::Email.check(&json!("what@that")));
        assert!(!Rule::Email.check(&json!("@nope")));
        assert!(!Rule::Email.check(&json!("nope@")));
        assert!(!Rule::Email.check(&json!("plain")));
        assert!(!Rule::Email.check(&json!(42)));
    }

    #[test]
    fn password_needs_letter_digit_and_bounds() {
        assert!(Rule::Password.check(&json!("abc123")));
        assert!(Rule::Password.check(&json!("A1bcde")));
        assert!(!Rule::Password.check(&json!("abc12"))); // too short
        assert!(!Rule::Password.check(&json!("a".repeat(28) + "1"))); // too long
        assert!(!Rule::Password.check(&json!("abcdef"))); // no digit
        assert!(!Rule::Password.check(&json!("123456"))); // no letter
    }

    #[test]
    fn username_shape() {
        assert!(Rule::Username.check(&json!("alice")));
        assert!(Rule::Username.check(&json!("a.b-c_d@e")));
        assert!(Rule::Username.check(&json!("x2z")));
        assert!(!Rule::Username.check(&json!("ab"))); // too short
        assert!(!Rule::Username.check(&json!("1abc"))); // digit first
        assert!(!Rule::Username.check(&json!("abc-"))); // non-alnum last
        assert!(!Rule::Username.check(&json!("a".repeat(30)))); // too long
    }

    #[test]
    fn reserved_usernames_are_rejected() {
        for reserved in RESERVED_USERNAMES {
            assert!(!Rule::Username.check(&json!(reserved)), "{reserved}");
        }
        assert!(!Rule::Username.check(&json!("Admin")));
    }

    #[test]
    fn enum_membership_is_integer_only() {
        assert!(Rule::PrivilegeTier.check(&json!(0)));
        assert!(Rule::PrivilegeTier.check(&json!(2)));
        assert!(!Rule::PrivilegeTier.check(&json!(3)));
        assert!(!Rule::PrivilegeTier.check(&json!("1")));
        assert!(Rule::ResourceKind.check(&json!(1)));
        assert!(!Rule::ResourceKind.check(&json!(2)));
    }

    #[test]
    fn iso_date_shapes() {
        assert!(Rule::IsoDate.check(&json!("2024-06-01")));
        assert!(Rule::IsoDate.check(&json!("2024-06-01T10:30:00Z")));
        assert!(Rule::IsoDate.check(&json!("2024-06-01T10:30:00+02:00")));
        assert!(!Rule::IsoDate.check(&json!("01/06/2024")));
        assert!(!Rule::IsoDate.check(&json!("tomorrow")));
    }

    #[test]
    fn bounded_text_rejects_blank_and_oversize() {
        assert!(Rule::BoundedText.check(&json!("x")));
        assert!(Rule::BoundedText.check(&json!("a".repeat(254))));
        assert!(!Rule::BoundedText.check(&json!("a".repeat(255))));
        assert!(!Rule::BoundedText.check(&json!("   ")));
        assert!(!Rule::BoundedText.check(&json!("")));
    }

    #[test]
    fn text_list_checks_every_element() {
        assert!(Rule::TextList.check(&json!(["rust", "web"])));
        assert!(Rule::TextList.check(&json!([])));
        assert!(!Rule::TextList.check(&json!(["ok", "   "])));
        assert!(!Rule::TextList.check(&json!("not-a-list")));
    }

    #[test]
    fn every_rule_rejects_null() {
        for rule in [
            Rule::Numeric,
            Rule::Boolean,
            Rule::Uuid,
            Rule::Email,
            Rule::Password,
            Rule::Username,
            Rule::PrivilegeTier,
            Rule::ResourceKind,
            Rule::IsoDate,
            Rule::BoundedText,
            Rule::TextList,
        ] {
            assert!(!rule.check(&Value::Null), "{rule:?}");
        }
    }
}
