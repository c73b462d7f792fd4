use cbio_providers::upload::UploadFile;

use crate::StudyService;

pub const UPLOAD_SUCCESS: &str = "File uploaded successfully";

impl StudyService {
	/// Relays an uploaded file to the processing service and describes the outcome.
	///
	/// Failures are reported in the returned text, never as an error.
	pub async fn process_file(&self, file: Option<UploadFile>) -> String {
		let filename = file.as_ref().map(|file| file.filename.clone());
		let outcome = self.collaborators.upload.upload(&self.cfg.upload, file).await;

		match outcome {
			Ok(res) if res.status == 200 => UPLOAD_SUCCESS.to_string(),
			Ok(res) => format!("File upload failed: {}", res.status_line()),
			Err(cbio_providers::Error::Status { status, body }) => {
				tracing::warn!(?filename, status, "Upload rejected by processing service.");

				body
			},
			Err(err) => {
				tracing::warn!(?filename, error = %err, "Upload relay failed.");

				err.to_string()
			},
		}
	}
}
