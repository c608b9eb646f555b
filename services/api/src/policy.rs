//! Field policy resolver
//!
//! Maps (entity, operation, access tier) to the set of request fields the
//! actor may supply, each bound to its validation rule. Screening checks
//! every key in the request body: unknown keys are rejected outright rather
//! than ignored.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::models::AccessTier;
use crate::validation::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Todo,
    Article,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// One permitted request field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rule: Rule,
    /// Explicit null clears the field instead of failing validation.
    pub nullable: bool,
}

const fn field(name: &'static str, rule: Rule) -> FieldSpec {
    FieldSpec {
        name,
        rule,
        nullable: false,
    }
}

const fn nullable(name: &'static str, rule: Rule) -> FieldSpec {
    FieldSpec {
        name,
        rule,
        nullable: true,
    }
}

const NO_FIELDS: &[FieldSpec] = &[];

const USER_ANONYMOUS_CREATE: &[FieldSpec] = &[
    field("email", Rule::Email),
    field("password", Rule::Password),
];

const USER_SELF: &[FieldSpec] = &[
    field("email", Rule::Email),
    field("password", Rule::Password),
    field("username", Rule::Username),
];

const USER_ADMIN: &[FieldSpec] = &[
    field("email", Rule::Email),
    field("password", Rule::Password),
    field("username", Rule::Username),
    field("activated", Rule::Boolean),
    field("type", Rule::PrivilegeTier),
];

const TODO_FIELDS: &[FieldSpec] = &[
    field("title", Rule::BoundedText),
    field("completed", Rule::Boolean),
    nullable("content", Rule::BoundedText),
    nullable("dueDate", Rule::IsoDate),
    nullable("scope", Rule::BoundedText),
    nullable("scopeDate", Rule::IsoDate),
];

const ARTICLE_FIELDS: &[FieldSpec] = &[
    field("title", Rule::BoundedText),
    field("content", Rule::BoundedText),
    field("categories", Rule::TextList),
    field("tags", Rule::TextList),
    field("isPublic", Rule::Boolean),
];

/// The ordered set of fields an actor may supply for one operation.
pub fn allowed_fields(entity: EntityKind, op: Operation, tier: AccessTier) -> &'static [FieldSpec] {
    match (entity, tier) {
        (EntityKind::User, AccessTier::Anonymous) => match op {
            Operation::Create => USER_ANONYMOUS_CREATE,
            Operation::Update => NO_FIELDS,
        },
        (EntityKind::User, AccessTier::Owner) => USER_SELF,
        (EntityKind::User, AccessTier::Admin) => USER_ADMIN,
        // Todos and articles have no anonymous surface and no admin-only
        // fields; the grant/ownership checks live in the services.
        (EntityKind::Todo, AccessTier::Anonymous) => NO_FIELDS,
        (EntityKind::Todo, _) => TODO_FIELDS,
        (EntityKind::Article, AccessTier::Anonymous) => NO_FIELDS,
        (EntityKind::Article, _) => ARTICLE_FIELDS,
    }
}

/// Screen a request body against the resolved field set.
///
/// Any key outside the set fails with a forbidden-field error; any permitted
/// key whose value fails its rule fails with a validation error.
pub fn screen(
    entity: EntityKind,
    op: Operation,
    tier: AccessTier,
    body: &Map<String, Value>,
) -> Result<(), ApiError> {
    let specs = allowed_fields(entity, op, tier);
    for (key, value) in body {
        let Some(spec) = specs.iter().find(|s| s.name == key.as_str()) else {
            return Err(ApiError::ForbiddenField(key.clone()));
        };
        if value.is_null() && spec.nullable {
            continue;
        }
        if !spec.rule.check(value) {
            return Err(ApiError::Validation(format!(
                "invalid value for field '{key}'"
            )));
        }
    }
    Ok(())
}
