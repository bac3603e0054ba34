// OCR extraction: image decoding, text detection, confidence aggregation.
// Detection backends plug in behind `detector::TextDetector`.

pub mod detector;
pub mod handlers;
pub mod models;
pub mod service;
pub mod tesseract;
