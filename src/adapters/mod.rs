mod exclusive_region_detector;
mod tesseract_text_extractor;
mod yolo_region_detector;

pub use exclusive_region_detector::ExclusiveRegionDetector;
pub use tesseract_text_extractor::TesseractTextExtractor;
pub use yolo_region_detector::YoloRegionDetector;
