mod region_detector;
mod text_extractor;

pub use region_detector::RegionDetector;
pub use text_extractor::TextExtractor;
