use std::{io, str::FromStr};

use axum::{
	Json, Router,
	body::Bytes,
	extract::{Multipart, Path, Query, State, multipart::Field},
	http::{HeaderMap, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use cbio_providers::{
	Body,
	upload::{FILE_FIELD, UploadFile},
};
use cbio_service::{AccessLevel, Error, Principal, StudyItem, StudyMeta, StudyTagsItem};
use cbio_storage::queries::{Direction, Projection, StudyQuery, StudySortBy};

use crate::state::AppState;

pub const HEADER_USER: &str = "x-cbio-user";
pub const HEADER_AUTHORITIES: &str = "x-cbio-authorities";
pub const HEADER_TOTAL_COUNT: &str = "total-count";

const UPLOAD_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyListParams {
	pub keyword: Option<String>,
	pub projection: Option<String>,
	pub page_size: Option<u32>,
	pub page_number: Option<u32>,
	pub sort_by: Option<String>,
	pub direction: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectionParams {
	pub projection: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}

	fn bad_request(message: impl Into<String>, field: &str) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "invalid_request", message, Some(vec![field.to_string()]))
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => {
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message, None)
			},
			Error::StudyNotFound { study_id } => Self::new(
				StatusCode::NOT_FOUND,
				"study_not_found",
				format!("Study {study_id} was not found."),
				None,
			),
			Error::AccessDenied { message } => {
				Self::new(StatusCode::FORBIDDEN, "access_denied", message, None)
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Study storage failed.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_error",
					"Study storage is unavailable.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/studies", get(get_all_studies))
		.route("/api/studies/fetch", post(fetch_studies))
		.route("/api/studies/tags/fetch", post(fetch_tags))
		.route("/api/studies/upload", post(upload))
		.route("/api/studies/{study_id}", get(get_study))
		.route("/api/studies/{study_id}/tags", get(get_tags))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn get_all_studies(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<StudyListParams>,
) -> Result<Response, ApiError> {
	let projection = parse_param::<Projection>(params.projection.as_deref(), "projection")?
		.unwrap_or_default();

	if projection == Projection::Meta {
		let meta = state.service.get_meta_studies(params.keyword.as_deref()).await?;

		return Ok(total_count_response(meta));
	}

	let query = StudyQuery {
		keyword: params.keyword,
		projection,
		page_size: params.page_size,
		page_number: params.page_number,
		sort_by: parse_param::<StudySortBy>(params.sort_by.as_deref(), "sortBy")?,
		direction: parse_param::<Direction>(params.direction.as_deref(), "direction")?,
	};
	let principal = principal_from_headers(&headers);
	let items: Vec<StudyItem> = state.service.get_all_studies(query, principal.as_ref()).await?;

	Ok(Json(items).into_response())
}

async fn get_study(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(study_id): Path<String>,
) -> Result<Json<StudyItem>, ApiError> {
	let principal = principal_from_headers(&headers);
	let item = state.service.read_study(&study_id, principal.as_ref()).await?;

	Ok(Json(item))
}

async fn fetch_studies(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<ProjectionParams>,
	Json(study_ids): Json<Vec<String>>,
) -> Result<Response, ApiError> {
	let projection = parse_param::<Projection>(params.projection.as_deref(), "projection")?
		.unwrap_or_default();

	if projection == Projection::Meta {
		let meta = state.service.fetch_meta_studies(&study_ids).await?;

		return Ok(total_count_response(meta));
	}

	let principal = principal_from_headers(&headers);
	let items = state
		.service
		.fetch_readable_studies(&study_ids, projection, principal.as_ref())
		.await?;

	Ok(Json(items).into_response())
}

async fn get_tags(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(study_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
	let principal = principal_from_headers(&headers);
	let tags = state.service.get_tags(&study_id, principal.as_ref(), AccessLevel::Read).await?;

	Ok(Json(tags.map(|tags| tags.tags).unwrap_or_else(|| Value::Object(Default::default()))))
}

async fn fetch_tags(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(study_ids): Json<Vec<String>>,
) -> Result<Json<Vec<StudyTagsItem>>, ApiError> {
	let principal = principal_from_headers(&headers);
	let tags =
		state.service.get_tags_for_multiple_studies(&study_ids, principal.as_ref()).await?;

	Ok(Json(tags.into_iter().map(StudyTagsItem::from).collect()))
}

async fn upload(
	State(state): State<AppState>,
	mut multipart: Multipart,
) -> Result<String, ApiError> {
	while let Some(mut field) = multipart
		.next_field()
		.await
		.map_err(|err| ApiError::bad_request(err.body_text(), FILE_FIELD))?
	{
		if field.name() != Some(FILE_FIELD) {
			continue;
		}

		let filename = field.file_name().unwrap_or(FILE_FIELD).to_string();
		let Some(first) = first_chunk(&mut field).await? else {
			return Ok(state.service.process_file(None).await);
		};
		let (tx, rx) = mpsc::channel(UPLOAD_CHANNEL_CAPACITY);
		let file = UploadFile::new(filename, Body::wrap_stream(ReceiverStream::new(rx)));
		let (status, ()) =
			tokio::join!(state.service.process_file(Some(file)), forward_chunks(first, field, tx));

		return Ok(status);
	}

	Ok(state.service.process_file(None).await)
}

/// The first non-empty chunk of `field`, or `None` for an empty file.
async fn first_chunk(field: &mut Field<'_>) -> Result<Option<Bytes>, ApiError> {
	loop {
		match field.chunk().await {
			Ok(Some(chunk)) if chunk.is_empty() => continue,
			Ok(chunk) => return Ok(chunk),
			Err(err) => return Err(ApiError::bad_request(err.body_text(), FILE_FIELD)),
		}
	}
}

/// Feeds the multipart field into the outgoing upload body as it arrives.
async fn forward_chunks(
	first: Bytes,
	mut field: Field<'_>,
	tx: mpsc::Sender<Result<Bytes, io::Error>>,
) {
	if tx.send(Ok(first)).await.is_err() {
		return;
	}

	loop {
		let next = match field.chunk().await {
			Ok(Some(chunk)) => Ok(chunk),
			Ok(None) => return,
			Err(err) => Err(io::Error::other(err.body_text())),
		};
		let failed = next.is_err();

		// The relay stops reading once it has an answer.
		if tx.send(next).await.is_err() || failed {
			return;
		}
	}
}

/// Principal set by the authenticating proxy, if any.
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
	let name = header_str(headers.get(HEADER_USER))?.trim();

	if name.is_empty() {
		return None;
	}

	let authorities = header_str(headers.get(HEADER_AUTHORITIES))
		.unwrap_or_default()
		.split(',')
		.map(str::trim)
		.filter(|authority| !authority.is_empty())
		.map(str::to_string)
		.collect();

	Some(Principal::new(name, authorities))
}

fn header_str(value: Option<&HeaderValue>) -> Option<&str> {
	value.and_then(|value| value.to_str().ok())
}

fn parse_param<T>(raw: Option<&str>, field: &str) -> Result<Option<T>, ApiError>
where
	T: FromStr<Err = cbio_storage::Error>,
{
	let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
		return Ok(None);
	};

	raw.parse().map(Some).map_err(|err: cbio_storage::Error| {
		ApiError::bad_request(err.to_string(), field)
	})
}

fn total_count_response(meta: StudyMeta) -> Response {
	let mut res = StatusCode::OK.into_response();

	res.headers_mut().insert(HEADER_TOTAL_COUNT, HeaderValue::from(meta.total_count));

	res
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn principal_needs_a_user_header() {
		let mut headers = HeaderMap::new();

		headers.insert(HEADER_AUTHORITIES, HeaderValue::from_static("s1"));

		assert!(principal_from_headers(&headers).is_none());

		headers.insert(HEADER_USER, HeaderValue::from_static(" alice "));

		let principal = principal_from_headers(&headers).expect("Expected a principal.");

		assert_eq!(principal.name, "alice");
		assert_eq!(principal.authorities, vec!["s1".to_string()]);
	}

	#[test]
	fn authorities_are_split_on_commas() {
		let mut headers = HeaderMap::new();

		headers.insert(HEADER_USER, HeaderValue::from_static("bob"));
		headers.insert(HEADER_AUTHORITIES, HeaderValue::from_static("brca_tcga, LAB_X,,"));

		let principal = principal_from_headers(&headers).expect("Expected a principal.");

		assert_eq!(principal.authorities, vec!["brca_tcga".to_string(), "LAB_X".to_string()]);
	}

	#[test]
	fn blank_params_are_absent_and_bad_ones_rejected() {
		assert_eq!(parse_param::<Projection>(Some(" "), "projection").ok(), Some(None));
		assert_eq!(
			parse_param::<Projection>(Some("meta"), "projection").ok(),
			Some(Some(Projection::Meta))
		);
		assert!(parse_param::<StudySortBy>(Some("nope"), "sortBy").is_err());
	}
}
