use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::FieldRecord;
use crate::global_constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    #[error("unreadable image")]
    UnreadableImage,
    #[error("detection failed")]
    DetectionFailed,
    #[error("extraction failed")]
    ExtractionFailed,
    #[error("checksum precondition violated")]
    ChecksumPreconditionViolated,
    #[error("timeout")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    Valid(String),
    Invalid(String),
    NotDetected,
    Error(FailureReason),
}

impl Verdict {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Verdict::Valid(identifier) | Verdict::Invalid(identifier) => Some(identifier),
            Verdict::NotDetected | Verdict::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Verdict::Error(_))
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            Verdict::Valid(_) => global_constants::USER_MESSAGE_VALID,
            Verdict::Invalid(_) => global_constants::USER_MESSAGE_INVALID,
            Verdict::NotDetected => global_constants::USER_MESSAGE_NOT_DETECTED,
            Verdict::Error(_) => global_constants::USER_MESSAGE_ERROR,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid(identifier) => write!(f, "Valid({})", identifier),
            Verdict::Invalid(identifier) => write!(f, "Invalid({})", identifier),
            Verdict::NotDetected => write!(f, "NotDetected"),
            Verdict::Error(reason) => write!(f, "Error({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub run_id: String,
    pub verdict: Verdict,
    pub fields: FieldRecord,
}

impl VerificationReport {
    pub fn failed(run_id: String, reason: FailureReason) -> Self {
        Self {
            run_id,
            verdict: Verdict::Error(reason),
            fields: FieldRecord::new(),
        }
    }
}
