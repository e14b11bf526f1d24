pub const APPLICATION_NAME: &str = "id-document-verifier";

pub const LOG_TAG_MAIN: &str = "[MAIN]";
pub const LOG_TAG_PIPELINE: &str = "[PIPELINE]";

pub const IDENTIFIER_LABEL: &str = "AADHAR_NUMBER";
pub const IDENTIFIER_FIELD_KEY: &str = "aadhar_number";

pub const DEFAULT_LABEL_VOCABULARY: [&str; 5] =
    ["AADHAR_NUMBER", "DATE_OF_BIRTH", "GENDER", "NAME", "ADDRESS"];

pub const DEFAULT_MODEL_FILE_NAME: &str = "aadhar-card-yolov8n.rten";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const DEFAULT_DETECTOR_INPUT_SIZE: u32 = 640;
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const ACCEPTED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub const USER_MESSAGE_VALID: &str = "Document number verified.";
pub const USER_MESSAGE_INVALID: &str = "Document number failed verification.";
pub const USER_MESSAGE_NOT_DETECTED: &str = "No document number could be read from the image.";
pub const USER_MESSAGE_ERROR: &str = "An unexpected error occurred.";
