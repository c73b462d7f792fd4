use std::{collections::HashMap, sync::Arc};

use cbio_storage::{
	cache::QueryCache,
	db::Db,
	models::{CancerStudy, CancerStudyTags, TypeOfCancer},
	queries::{self, Projection, StudyQuery},
};

use crate::{BoxFuture, CancerTypeCatalog, Result, StudyRepository, catalog};

type StudyCache = QueryCache<StudyQuery, Arc<[CancerStudy]>>;

/// Postgres study repository with an optional read-through cache on list queries.
pub struct PgStudyRepository {
	db: Arc<Db>,
	cache: Option<StudyCache>,
}
impl PgStudyRepository {
	pub fn new(db: Arc<Db>, cfg: &cbio_config::QueryCache) -> Self {
		let cache = cfg.enabled.then(|| QueryCache::new(cfg.max_entries));

		Self { db, cache }
	}

	async fn load_all(&self, query: &StudyQuery) -> Result<Arc<[CancerStudy]>> {
		let studies = queries::get_all_studies(&self.db, query).await?;

		Ok(studies.into())
	}
}
impl StudyRepository for PgStudyRepository {
	fn get_all_studies<'a>(
		&'a self,
		query: &'a StudyQuery,
	) -> BoxFuture<'a, Result<Arc<[CancerStudy]>>> {
		Box::pin(async move {
			match self.cache.as_ref() {
				Some(cache) => cache.get_or_load(query.clone(), || self.load_all(query)).await,
				None => self.load_all(query).await,
			}
		})
	}

	fn get_meta_studies<'a>(&'a self, keyword: Option<&'a str>) -> BoxFuture<'a, Result<i64>> {
		Box::pin(async move { Ok(queries::get_meta_studies(&self.db, keyword).await?) })
	}

	fn get_study<'a>(
		&'a self,
		study_id: &'a str,
		projection: Projection,
	) -> BoxFuture<'a, Result<Option<CancerStudy>>> {
		Box::pin(async move { Ok(queries::get_study(&self.db, study_id, projection).await?) })
	}

	fn fetch_studies<'a>(
		&'a self,
		study_ids: &'a [String],
		projection: Projection,
	) -> BoxFuture<'a, Result<Vec<CancerStudy>>> {
		Box::pin(async move { Ok(queries::fetch_studies(&self.db, study_ids, projection).await?) })
	}

	fn fetch_meta_studies<'a>(&'a self, study_ids: &'a [String]) -> BoxFuture<'a, Result<i64>> {
		Box::pin(async move { Ok(queries::fetch_meta_studies(&self.db, study_ids).await?) })
	}

	fn get_tags<'a>(
		&'a self,
		study_id: &'a str,
	) -> BoxFuture<'a, Result<Option<CancerStudyTags>>> {
		Box::pin(async move { Ok(queries::get_tags(&self.db, study_id).await?) })
	}

	fn get_tags_for_multiple_studies<'a>(
		&'a self,
		study_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<CancerStudyTags>>> {
		Box::pin(
			async move { Ok(queries::get_tags_for_multiple_studies(&self.db, study_ids).await?) },
		)
	}
}

pub struct PgCancerTypeCatalog {
	db: Arc<Db>,
}
impl PgCancerTypeCatalog {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}
}
impl CancerTypeCatalog for PgCancerTypeCatalog {
	fn get_primary_site_map<'a>(
		&'a self,
	) -> BoxFuture<'a, Result<HashMap<String, TypeOfCancer>>> {
		Box::pin(async move {
			let types = queries::get_cancer_types(&self.db).await?;

			Ok(catalog::primary_site_map(&types))
		})
	}
}
