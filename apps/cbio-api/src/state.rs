use std::sync::Arc;

use cbio_service::StudyService;
use cbio_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<StudyService>,
}
impl AppState {
	pub async fn new(config: cbio_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(StudyService::new(config, db)))
	}

	pub fn from_service(service: StudyService) -> Self {
		Self { service: Arc::new(service) }
	}
}
