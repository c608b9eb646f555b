//! Entity lifecycle services
//!
//! Each service orchestrates one entity's create/read/update/delete against
//! the field policy, uniqueness rules, ownership checks, and soft-delete
//! semantics. Derivations and password hashing happen here, as explicit
//! pre-persist steps, never inside the storage layer.

pub mod article;
pub mod todo;
pub mod user;

// Re-export for convenience
pub use article::ArticleService;
pub use todo::TodoService;
pub use user::UserService;

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::validation::Rule;

/// A string field from a screened request body; null reads as absent.
pub(crate) fn str_field<'a>(body: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    body.get(name).and_then(Value::as_str)
}

/// A mandatory string field: screening has checked the shape of whatever was
/// supplied, this checks that something was.
pub(crate) fn require_str<'a>(
    body: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a str, ApiError> {
    body.get(name)
        .filter(|v| Rule::Present.check(v))
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Validation(format!("{name} is required")))
}

pub(crate) fn bool_field(body: &Map<String, Value>, name: &str) -> Option<bool> {
    body.get(name).and_then(Value::as_bool)
}

pub(crate) fn string_list_field(body: &Map<String, Value>, name: &str) -> Option<Vec<String>> {
    body.get(name).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// Apply an optional, nullable field: a present string replaces the value,
/// an explicit null clears it, absence leaves it untouched.
pub(crate) fn apply_nullable(target: &mut Option<String>, body: &Map<String, Value>, name: &str) {
    match body.get(name) {
        Some(Value::Null) => *target = None,
        Some(Value::String(s)) => *target = Some(s.clone()),
        _ => {}
    }
}
