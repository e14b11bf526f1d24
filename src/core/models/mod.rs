mod detection_box;
mod document_image;
mod field_record;
mod pipeline_settings;
mod verdict;

pub use detection_box::DetectionBox;
pub use document_image::DocumentImage;
pub use field_record::FieldRecord;
pub use pipeline_settings::PipelineSettings;
pub use verdict::{FailureReason, Verdict, VerificationReport};
