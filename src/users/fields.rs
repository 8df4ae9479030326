//! Custom profile fields: definitions and the validation pipeline.
//!
//! Field definitions are administrator-controlled. Validation itself is a
//! pure pass over (definitions, submitted values, caller reputation) and
//! fails fast on the first violated rule: reputation gate, then length
//! gate, then the type-specific gate.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateUrl;

use super::error::{UserError, UserResult};
use super::types::ProfileData;
use crate::groups;
use crate::state::Forum;
use crate::store::Store;
use crate::util::is_number;

/// Sorted set holding the ordered custom field keys.
const FIELDS_INDEX: &str = "user-custom-fields";

fn field_key(key: &str) -> String {
    format!("user-custom-field:{key}")
}

/// Input widget type of a custom field.
///
/// Matched exhaustively everywhere, so adding a type is a compile error
/// until every consumer handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Numeric input.
    #[serde(rename = "input-number")]
    InputNumber,
    /// Free-text input; must not contain a URL.
    #[serde(rename = "input-text")]
    InputText,
    /// Calendar date input.
    #[serde(rename = "input-date")]
    InputDate,
    /// URL input.
    #[serde(rename = "input-link")]
    InputLink,
    /// Single-choice select.
    #[serde(rename = "select")]
    Select,
    /// Multi-choice select; submitted as a JSON array.
    #[serde(rename = "select-multi")]
    SelectMulti,
}

impl FieldType {
    /// Stable string form, as stored on the definition hash.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputNumber => "input-number",
            Self::InputText => "input-text",
            Self::InputDate => "input-date",
            Self::InputLink => "input-link",
            Self::Select => "select",
            Self::SelectMulti => "select-multi",
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input-number" => Ok(Self::InputNumber),
            "input-text" => Ok(Self::InputText),
            "input-date" => Ok(Self::InputDate),
            "input-link" => Ok(Self::InputLink),
            "select" => Ok(Self::Select),
            "select-multi" => Ok(Self::SelectMulti),
            _ => Err(()),
        }
    }
}

/// Administrator-defined custom profile field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    /// Unique field key, used as the hash field on user records.
    pub key: String,
    /// Display name, interpolated into validation errors.
    pub name: String,
    /// Input type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Minimum reputation required to set the field. Zero always passes.
    #[serde(rename = "min:rep", default)]
    pub min_rep: i64,
    /// Allowed options for select types, in display order.
    #[serde(rename = "select-options", default)]
    pub select_options: Vec<String>,
}

impl CustomFieldDefinition {
    fn to_hash(&self) -> HashMap<String, String> {
        let mut hash = HashMap::new();
        hash.insert("key".into(), self.key.clone());
        hash.insert("name".into(), self.name.clone());
        hash.insert("type".into(), self.field_type.as_str().into());
        hash.insert("min:rep".into(), self.min_rep.to_string());
        hash.insert("select-options".into(), self.select_options.join("\n"));
        hash
    }

    fn from_hash(hash: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            key: hash.get("key")?.clone(),
            name: hash.get("name")?.clone(),
            field_type: hash.get("type")?.parse().ok()?,
            min_rep: hash
                .get("min:rep")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            select_options: hash
                .get("select-options")
                .map(|v| {
                    v.split('\n')
                        .filter(|opt| !opt.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Validate a profile submission against the custom field definitions.
///
/// Only definitions whose key is present in `data` are evaluated. Pure:
/// the caller resolves and passes reputation.
pub fn validate_fields(
    definitions: &[CustomFieldDefinition],
    data: &ProfileData,
    reputation: i64,
    reputation_disabled: bool,
) -> UserResult<()> {
    for definition in definitions {
        if let Some(value) = data.get(&definition.key) {
            validate_field(definition, value, reputation, reputation_disabled)?;
        }
    }
    Ok(())
}

fn validate_field(
    definition: &CustomFieldDefinition,
    value: &str,
    reputation: i64,
    reputation_disabled: bool,
) -> UserResult<()> {
    if reputation < definition.min_rep && !reputation_disabled {
        return Err(UserError::NotEnoughReputationCustomField {
            required: definition.min_rep,
            field: definition.name.clone(),
        });
    }

    if value.chars().count() > 255 {
        return Err(UserError::CustomFieldValueTooLong {
            field: definition.name.clone(),
        });
    }

    match definition.field_type {
        FieldType::InputNumber => {
            if !is_number(value) {
                return Err(UserError::CustomFieldInvalidNumber {
                    field: definition.name.clone(),
                });
            }
        }
        FieldType::InputText => {
            if !value.is_empty() && value.validate_url() {
                return Err(UserError::CustomFieldInvalidText {
                    field: definition.name.clone(),
                });
            }
        }
        FieldType::InputDate => {
            if !value.is_empty() && !is_date(value) {
                return Err(UserError::CustomFieldInvalidDate {
                    field: definition.name.clone(),
                });
            }
        }
        FieldType::InputLink => {
            if !value.is_empty() && !value.validate_url() {
                return Err(UserError::CustomFieldInvalidLink {
                    field: definition.name.clone(),
                });
            }
        }
        FieldType::Select => {
            if !value.is_empty() && !definition.select_options.iter().any(|opt| opt == value) {
                return Err(UserError::CustomFieldInvalidSelect {
                    field: definition.name.clone(),
                });
            }
        }
        FieldType::SelectMulti => {
            // Unparseable submissions count as an empty selection.
            let values: Vec<String> = serde_json::from_str(value).unwrap_or_default();
            let all_allowed = values
                .iter()
                .all(|v| definition.select_options.iter().any(|opt| opt == v));
            if !all_allowed {
                return Err(UserError::CustomFieldInvalidSelect {
                    field: definition.name.clone(),
                });
            }
        }
    }

    Ok(())
}

fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(value, "%Y/%m/%d").is_ok()
}

/// Replace the custom field definitions. Administrators only.
#[tracing::instrument(skip(forum, definitions))]
pub async fn save_custom_fields(
    forum: &Forum,
    caller_uid: Uuid,
    definitions: &[CustomFieldDefinition],
) -> UserResult<()> {
    if !groups::is_administrator(forum, caller_uid).await? {
        return Err(UserError::NoPrivileges);
    }

    for key in forum.store.sorted_set_range(FIELDS_INDEX, 0, -1).await? {
        forum.store.delete(&field_key(&key)).await?;
        forum.store.sorted_set_remove(FIELDS_INDEX, &key).await?;
    }

    for (position, definition) in definitions.iter().enumerate() {
        forum
            .store
            .sorted_set_add(FIELDS_INDEX, position as i64, &definition.key)
            .await?;
        forum
            .store
            .set_object(&field_key(&definition.key), &definition.to_hash())
            .await?;
    }
    Ok(())
}

/// Load the custom field definitions in display order.
pub async fn load_custom_fields(forum: &Forum) -> UserResult<Vec<CustomFieldDefinition>> {
    let keys = forum.store.sorted_set_range(FIELDS_INDEX, 0, -1).await?;
    let hash_keys: Vec<String> = keys.iter().map(|k| field_key(k)).collect();
    let hashes = forum.store.get_objects(&hash_keys).await?;
    Ok(hashes
        .iter()
        .flatten()
        .filter_map(CustomFieldDefinition::from_hash)
        .collect())
}

/// Ordered custom field keys.
pub async fn custom_field_keys(forum: &Forum) -> UserResult<Vec<String>> {
    Ok(forum.store.sorted_set_range(FIELDS_INDEX, 0, -1).await?)
}
