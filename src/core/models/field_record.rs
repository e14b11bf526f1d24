use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::global_constants;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRecord {
    fields: BTreeMap<String, String>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field_name: &str, value: String) {
        if let Some(previous) = self.fields.insert(field_name.to_string(), value) {
            log::debug!(
                "[FIELD_RECORD] overwrote '{}' (previous value had {} characters)",
                field_name,
                previous.len()
            );
        }
    }

    pub fn get(&self, field_name: &str) -> Option<&str> {
        self.fields.get(field_name).map(String::as_str)
    }

    pub fn identifier(&self) -> Option<&str> {
        self.get(global_constants::IDENTIFIER_FIELD_KEY)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
