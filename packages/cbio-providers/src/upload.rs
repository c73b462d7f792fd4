use std::time::Duration;

use reqwest::{
	Body, Client, StatusCode,
	multipart::{Form, Part},
};

use crate::{Error, Result};

pub const FILE_FIELD: &str = "file";

/// An uploaded file on its way to the processing service.
///
/// `body` should be a streaming body; it is sent with an unknown length so the transport never
/// has to hold the whole file.
pub struct UploadFile {
	pub filename: String,
	pub body: Body,
}
impl UploadFile {
	pub fn new(filename: impl Into<String>, body: impl Into<Body>) -> Self {
		Self { filename: filename.into(), body: body.into() }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
	pub status: u16,
	pub body: String,
}
impl UploadResponse {
	/// Status code followed by its reason in constant case, e.g. `202 ACCEPTED`.
	pub fn status_line(&self) -> String {
		let reason = StatusCode::from_u16(self.status).ok().and_then(|status| status.canonical_reason());

		match reason {
			Some(reason) => {
				format!("{} {}", self.status, reason.to_ascii_uppercase().replace([' ', '-'], "_"))
			},
			None => self.status.to_string(),
		}
	}
}

pub async fn upload(cfg: &cbio_config::Upload, file: Option<UploadFile>) -> Result<UploadResponse> {
	let Some(url) = cfg.service_url.as_deref() else {
		return Err(Error::InvalidConfig {
			message: "upload.service_url is not configured.".to_string(),
		});
	};
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client.post(url).multipart(upload_form(file)).send().await?;
	let status = res.status();
	let body = res.text().await?;

	tracing::debug!(status = status.as_u16(), "Upload relayed.");

	if status.is_client_error() || status.is_server_error() {
		return Err(Error::Status { status: status.as_u16(), body });
	}

	Ok(UploadResponse { status: status.as_u16(), body })
}

fn upload_form(file: Option<UploadFile>) -> Form {
	let form = Form::new();
	let Some(file) = file else {
		return form;
	};

	// `Part::stream` leaves the length unset, which keeps the request chunked.
	form.part(FILE_FIELD, Part::stream(file.body).file_name(file.filename))
}
