use crate::core::models::{DetectionBox, FieldRecord};
use crate::global_constants;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFields {
    pub record: FieldRecord,
    pub identifier: String,
}

#[derive(Debug, Clone)]
pub struct FieldAssembler {
    identifier_label: String,
}

impl Default for FieldAssembler {
    fn default() -> Self {
        Self::build(global_constants::IDENTIFIER_LABEL)
    }
}

impl FieldAssembler {
    pub fn build(identifier_label: &str) -> Self {
        Self {
            identifier_label: identifier_label.to_string(),
        }
    }

    pub fn is_identifier_label(&self, label: &str) -> bool {
        label == self.identifier_label
    }

    pub fn assemble<'a, I>(&self, recognized: I) -> AssembledFields
    where
        I: IntoIterator<Item = (&'a DetectionBox, String)>,
    {
        let mut record = FieldRecord::new();
        let mut identifier = String::new();
        let mut identifier_seen = false;

        for (detection, text) in recognized {
            if self.is_identifier_label(&detection.label) {
                identifier_seen = true;
                let digits = keep_digits(&text);
                if digits.is_empty() {
                    log::warn!(
                        "[FIELD_ASSEMBLER] identifier box yielded no digits, keeping previous value"
                    );
                    continue;
                }
                identifier = digits;
                continue;
            }

            let field_name = detection.label.to_lowercase();
            if field_name == global_constants::IDENTIFIER_FIELD_KEY {
                log::warn!(
                    "[FIELD_ASSEMBLER] ignoring '{}' box, its field name is reserved",
                    detection.label
                );
                continue;
            }
            record.insert(&field_name, text);
        }

        if identifier_seen {
            record.insert(global_constants::IDENTIFIER_FIELD_KEY, identifier.clone());
        }

        log::debug!(
            "[FIELD_ASSEMBLER] assembled {} fields, identifier has {} digits",
            record.len(),
            identifier.len()
        );

        AssembledFields { record, identifier }
    }
}

pub fn keep_digits(text: &str) -> String {
    text.chars().filter(|character| character.is_ascii_digit()).collect()
}
