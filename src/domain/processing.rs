use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bytes sent so far against the expected total of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Whole-number percentage, clamped to 100. Zero when the total is unknown.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.loaded as f64 / self.total as f64 * 100.0).round();
        percent.min(100.0) as u8
    }
}

/// A file to send as one multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum ImageType {
    L3,
    #[serde(rename = "middle")]
    Middle,
    #[default]
    #[serde(rename = "auto")]
    Auto,
}

impl ImageType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::L3 => "L3",
            ImageType::Middle => "middle",
            ImageType::Auto => "auto",
        }
    }
}

/// A prompt point for SAM2. `label` is 1 for foreground, 0 for background.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct ClickPoint {
    pub x: f64,
    pub y: f64,
    pub label: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationRequest {
    pub image: FileUpload,
    pub image_type: ImageType,
    pub patient_id: Option<String>,
    pub slice_index: Option<String>,
    pub click_points: Vec<ClickPoint>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SegmentationResult {
    /// Base64 encoded PNG mask.
    pub mask_data: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub processing_time_ms: Option<f64>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Sam2Health {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub cache_stats: Value,
}

/// Identifies one study of one patient on the processing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRef {
    pub patient_name: String,
    pub study_date: String,
}

impl CaseRef {
    pub fn new(patient_name: impl Into<String>, study_date: impl Into<String>) -> Self {
        Self {
            patient_name: patient_name.into(),
            study_date: study_date.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_reports_zero_percent() {
        let progress = UploadProgress {
            loaded: 512,
            total: 0,
        };
        assert_eq!(progress.percent(), 0);
    }

    #[test]
    fn test_percent_rounds_and_clamps() {
        assert_eq!(UploadProgress { loaded: 1, total: 3 }.percent(), 33);
        assert_eq!(UploadProgress { loaded: 2, total: 3 }.percent(), 67);
        assert_eq!(UploadProgress { loaded: 10, total: 10 }.percent(), 100);
        assert_eq!(UploadProgress { loaded: 15, total: 10 }.percent(), 100);
    }

    #[test]
    fn test_image_type_wire_names() {
        assert_eq!(ImageType::L3.as_str(), "L3");
        assert_eq!(ImageType::default().as_str(), "auto");
        assert_eq!(serde_json::to_value(ImageType::Middle).unwrap(), "middle");
    }
}
