use crate::application::client::AuthenticatedHttpClient;
use crate::application::request::{MultipartField, PendingRequest};
use crate::domain::processing::{Sam2Health, SegmentationRequest, SegmentationResult};
use crate::error::{ClientError, RequestFailure, Result};
use std::time::Duration;
use tracing::{info, warn};

const SEGMENT_PATH: &str = "/api/segmentation/sam2";
const HEALTH_PATH: &str = "/api/segmentation/sam2/health";

/// SAM2 interactive segmentation on the iDoctor backend.
#[derive(Clone)]
pub struct SegmentationService {
    client: AuthenticatedHttpClient,
    segment_timeout: Duration,
    health_timeout: Duration,
}

impl SegmentationService {
    pub fn new(
        client: AuthenticatedHttpClient,
        segment_timeout: Duration,
        health_timeout: Duration,
    ) -> Self {
        Self {
            client,
            segment_timeout,
            health_timeout,
        }
    }

    pub async fn segment(&self, request: SegmentationRequest) -> Result<SegmentationResult> {
        let mut fields = vec![
            MultipartField::file("file", request.image),
            MultipartField::text("image_type", request.image_type.as_str()),
        ];
        if let Some(patient_id) = request.patient_id {
            fields.push(MultipartField::text("patient_id", patient_id));
        }
        if let Some(slice_index) = request.slice_index {
            fields.push(MultipartField::text("slice_index", slice_index));
        }
        if !request.click_points.is_empty() {
            let points = serde_json::to_string(&request.click_points).map_err(|e| {
                ClientError::ValidationError(format!("unserializable click points: {e}"))
            })?;
            fields.push(MultipartField::text("click_points", points));
        }

        let pending = PendingRequest::post(SEGMENT_PATH)
            .multipart(fields)
            .timeout(self.segment_timeout);
        let result: SegmentationResult = self.client.send_json(pending).await?;
        if result.mask_data.is_empty() {
            return Err(RequestFailure::Decode("segmentation result has no mask_data".to_string()).into());
        }

        info!(
            confidence = result.confidence_score,
            cached = result.cached,
            "segmentation finished"
        );
        Ok(result)
    }

    /// Never fails: an unreachable or broken service reports as disabled.
    pub async fn health(&self) -> Sam2Health {
        let request = PendingRequest::get(HEALTH_PATH).timeout(self.health_timeout);
        match self.client.send_json(request).await {
            Ok(health) => health,
            Err(e) => {
                warn!(error = %e, "sam2 health check failed");
                Sam2Health::default()
            }
        }
    }
}
