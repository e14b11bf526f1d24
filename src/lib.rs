pub mod adapters;
pub mod core;
pub mod global_constants;


pub use crate::core::models::{
    DetectionBox, FailureReason, FieldRecord, PipelineSettings, Verdict, VerificationReport,
};
pub use crate::core::orchestrators::VerificationOrchestrator;
