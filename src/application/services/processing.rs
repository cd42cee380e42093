use crate::application::client::AuthenticatedHttpClient;
use crate::application::request::{MultipartField, PendingRequest};
use crate::domain::processing::{CaseRef, FileUpload, UploadProgress};
use crate::error::{ClientError, Result};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use url::Url;

use super::encode_segment;

/// Case upload and the processing pipeline on the iDoctor backend.
///
/// Response schemas of this backend are loose, so most calls return the raw
/// JSON document.
#[derive(Clone)]
pub struct ProcessingService {
    client: AuthenticatedHttpClient,
}

impl ProcessingService {
    pub fn new(client: AuthenticatedHttpClient) -> Self {
        Self { client }
    }

    /// Uploads a zipped DICOM study, reporting progress after every chunk.
    pub async fn upload_dicom_zip<F>(
        &self,
        case: &CaseRef,
        file: FileUpload,
        on_progress: F,
    ) -> Result<Value>
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        let size = file.bytes.len();
        let request = PendingRequest::post("/upload_dicom_zip")
            .multipart(vec![
                MultipartField::text("patient_name", case.patient_name.clone()),
                MultipartField::text("study_date", case.study_date.clone()),
                MultipartField::file("file", file),
                MultipartField::text("file_size", size.to_string()),
            ])
            .on_upload_progress(on_progress);
        let response = self.client.send_json(request).await?;
        info!(patient = %case.patient_name, study_date = %case.study_date, bytes = size, "dicom archive uploaded");
        Ok(response)
    }

    pub async fn process_case(&self, case: &CaseRef) -> Result<Value> {
        let request = PendingRequest::post(case_path("/process", case));
        self.client.send_json(request).await
    }

    pub async fn list_patients(&self) -> Result<Value> {
        self.client
            .send_json(PendingRequest::get("/list_patients"))
            .await
    }

    pub async fn key_results(&self, case: &CaseRef) -> Result<Value> {
        let request = PendingRequest::get(case_path("/get_key_results", case));
        self.client.send_json(request).await
    }

    pub async fn l3_detect(&self, case: &CaseRef) -> Result<Value> {
        let request = PendingRequest::post(case_path("/l3_detect", case));
        self.client.send_json(request).await
    }

    pub async fn upload_l3_mask(&self, case: &CaseRef, mask: FileUpload) -> Result<Value> {
        let request = PendingRequest::post(case_path("/upload_l3_mask", case))
            .multipart(vec![MultipartField::file("file", mask)]);
        self.client.send_json(request).await
    }

    pub async fn continue_after_l3(&self, case: &CaseRef) -> Result<Value> {
        let request = PendingRequest::post(case_path("/continue_after_l3", case));
        self.client.send_json(request).await
    }

    pub async fn generate_sagittal(&self, case: &CaseRef, force: bool) -> Result<Value> {
        let request = PendingRequest::post(case_path("/generate_sagittal", case))
            .query("force", u8::from(force));
        self.client.send_json(request).await
    }

    /// Uploads hand-drawn psoas and/or combo masks for the middle slice.
    pub async fn upload_middle_manual_mask(
        &self,
        case: &CaseRef,
        psoas_mask: Option<FileUpload>,
        combo_mask: Option<FileUpload>,
    ) -> Result<Value> {
        let mut fields = Vec::new();
        if let Some(mask) = psoas_mask {
            fields.push(MultipartField::file("psoas_mask", mask));
        }
        if let Some(mask) = combo_mask {
            fields.push(MultipartField::file("combo_mask", mask));
        }
        if fields.is_empty() {
            return Err(ClientError::ValidationError(
                "at least one of psoas_mask or combo_mask is required".to_string(),
            ));
        }

        let request = PendingRequest::post(case_path("/upload_middle_manual_mask", case))
            .header("accept", "application/json")?
            .multipart(fields);
        self.client.send_json(request).await
    }

    pub async fn task_status(&self, task_id: &str) -> Result<Value> {
        let path = format!("/task_status/{}", encode_segment(task_id));
        self.client.send_json(PendingRequest::get(path)).await
    }

    pub async fn list_tasks(&self) -> Result<Value> {
        self.client.send_json(PendingRequest::get("/list_tasks")).await
    }

    pub async fn upload_status(&self, upload_id: &str) -> Result<Value> {
        let path = format!("/upload_status/{}", encode_segment(upload_id));
        self.client.send_json(PendingRequest::get(path)).await
    }

    /// Direct link to an input image, usable without an Authorization header.
    pub async fn image_url(&self, case: &CaseRef, filename: &str) -> Result<String> {
        let path = format!("{}/{}", case_path("/get_image", case), encode_segment(filename));
        self.signed_url(&path).await
    }

    /// Direct link to a pipeline output image inside `folder`.
    pub async fn output_image_url(
        &self,
        case: &CaseRef,
        folder: &str,
        filename: &str,
    ) -> Result<String> {
        let path = format!(
            "{}/{}/{}",
            case_path("/get_output_image", case),
            encode_segment(folder),
            encode_segment(filename)
        );
        self.signed_url(&path).await
    }

    async fn signed_url(&self, path: &str) -> Result<String> {
        let mut url = Url::parse(&self.client.url(path))
            .map_err(|e| ClientError::ValidationError(format!("invalid image url: {e}")))?;
        let token = self.client.session().access_token().await?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("t", &cache_buster().to_string());
            if let Some(token) = token {
                query.append_pair("token", &token);
            }
        }
        Ok(url.into())
    }
}

fn case_path(prefix: &str, case: &CaseRef) -> String {
    format!(
        "{}/{}/{}",
        prefix,
        encode_segment(&case.patient_name),
        encode_segment(&case.study_date)
    )
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_path_encodes_patient_name() {
        let case = CaseRef::new("Zhang San", "20240101");
        assert_eq!(
            case_path("/process", &case),
            "/process/Zhang%20San/20240101"
        );
    }
}
