pub mod catalog;
pub mod compose;
pub mod permission;
pub mod repository;
pub mod studies;
pub mod tags;
pub mod upload;
pub mod visibility;

mod error;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use cbio_config::{Config, Upload};
use cbio_providers::upload::{UploadFile, UploadResponse};
use cbio_storage::{
	db::Db,
	models::{CancerStudy, CancerStudyTags, TypeOfCancer},
	queries::{Projection, StudyQuery},
};

pub use error::{Error, Result};
pub use permission::{AccessLevel, GroupPermission, Principal};
pub use repository::{PgCancerTypeCatalog, PgStudyRepository};
pub use studies::{CancerTypeItem, StudyItem, StudyMeta};
pub use tags::StudyTagsItem;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage-side study queries.
///
/// List results are shared handles that an implementation may also keep in a cache. Callers
/// copy records out before filtering and never hand the shared slice back to a client.
pub trait StudyRepository
where
	Self: Send + Sync,
{
	/// Keyword filtered, sorted, paginated list. `StudyQuery::unfiltered` is the full scan.
	fn get_all_studies<'a>(
		&'a self,
		query: &'a StudyQuery,
	) -> BoxFuture<'a, Result<Arc<[CancerStudy]>>>;

	fn get_meta_studies<'a>(&'a self, keyword: Option<&'a str>) -> BoxFuture<'a, Result<i64>>;

	fn get_study<'a>(
		&'a self,
		study_id: &'a str,
		projection: Projection,
	) -> BoxFuture<'a, Result<Option<CancerStudy>>>;

	fn fetch_studies<'a>(
		&'a self,
		study_ids: &'a [String],
		projection: Projection,
	) -> BoxFuture<'a, Result<Vec<CancerStudy>>>;

	fn fetch_meta_studies<'a>(&'a self, study_ids: &'a [String]) -> BoxFuture<'a, Result<i64>>;

	fn get_tags<'a>(&'a self, study_id: &'a str)
	-> BoxFuture<'a, Result<Option<CancerStudyTags>>>;

	fn get_tags_for_multiple_studies<'a>(
		&'a self,
		study_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<CancerStudyTags>>>;
}

pub trait CancerTypeCatalog
where
	Self: Send + Sync,
{
	/// Cancer type id mapped to the primary site it belongs to.
	fn get_primary_site_map<'a>(&'a self) -> BoxFuture<'a, Result<HashMap<String, TypeOfCancer>>>;
}

/// The read decision for one study. Implementations must be pure with respect to the study.
pub trait ReadPermission
where
	Self: Send + Sync,
{
	fn has_permission(
		&self,
		principal: Option<&Principal>,
		study: &CancerStudy,
		access_level: AccessLevel,
	) -> bool;
}

pub trait UploadProvider
where
	Self: Send + Sync,
{
	fn upload<'a>(
		&'a self,
		cfg: &'a Upload,
		file: Option<UploadFile>,
	) -> BoxFuture<'a, cbio_providers::Result<UploadResponse>>;
}

#[derive(Clone)]
pub struct Collaborators {
	pub studies: Arc<dyn StudyRepository>,
	pub cancer_types: Arc<dyn CancerTypeCatalog>,
	pub permissions: Arc<dyn ReadPermission>,
	pub upload: Arc<dyn UploadProvider>,
}
impl Collaborators {
	pub fn new(
		studies: Arc<dyn StudyRepository>,
		cancer_types: Arc<dyn CancerTypeCatalog>,
		permissions: Arc<dyn ReadPermission>,
	) -> Self {
		Self { studies, cancer_types, permissions, upload: Arc::new(HttpUpload) }
	}

	pub fn with_upload(mut self, upload: Arc<dyn UploadProvider>) -> Self {
		self.upload = upload;

		self
	}
}

pub struct StudyService {
	pub cfg: Config,
	pub collaborators: Collaborators,
}
impl StudyService {
	/// Postgres-backed service with the group permission rule from `[security]`.
	pub fn new(cfg: Config, db: Db) -> Self {
		let db = Arc::new(db);
		let collaborators = Collaborators::new(
			Arc::new(PgStudyRepository::new(db.clone(), &cfg.storage.cache)),
			Arc::new(PgCancerTypeCatalog::new(db)),
			Arc::new(GroupPermission::new(&cfg.security)),
		);

		Self { cfg, collaborators }
	}

	pub fn with_collaborators(cfg: Config, collaborators: Collaborators) -> Self {
		Self { cfg, collaborators }
	}

	/// The access level a study listing should be checked at.
	///
	/// Listing everything is allowed when unauthorized studies are shown flagged instead of
	/// hidden.
	pub fn listing_access_level(&self) -> AccessLevel {
		if self.cfg.security.show_unauthorized_studies { AccessLevel::List } else { AccessLevel::Read }
	}
}

struct HttpUpload;
impl UploadProvider for HttpUpload {
	fn upload<'a>(
		&'a self,
		cfg: &'a Upload,
		file: Option<UploadFile>,
	) -> BoxFuture<'a, cbio_providers::Result<UploadResponse>> {
		Box::pin(cbio_providers::upload::upload(cfg, file))
	}
}
