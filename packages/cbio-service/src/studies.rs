use time::OffsetDateTime;

use cbio_storage::{
	models::{CancerStudy, TypeOfCancer},
	queries::{Projection, StudyQuery},
};

use crate::{
	AccessLevel, Error, Principal, Result, StudyService, compose,
	visibility::{filter_readable, mark_readable},
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
	pub study_id: String,
	pub cancer_type_id: String,
	pub name: String,
	pub short_name: Option<String>,
	pub description: Option<String>,
	pub public_study: bool,
	pub pmid: Option<String>,
	pub citation: Option<String>,
	pub groups: Option<String>,
	pub status: i32,
	#[serde(with = "time::serde::rfc3339::option")]
	pub import_date: Option<OffsetDateTime>,
	pub reference_genome: Option<String>,
	pub all_sample_count: Option<i64>,
	pub cancer_type: Option<CancerTypeItem>,
	pub read_permission: bool,
}
impl StudyItem {
	pub fn from_study(study: CancerStudy, read_permission: bool) -> Self {
		Self {
			study_id: study.cancer_study_identifier,
			cancer_type_id: study.type_of_cancer_id,
			name: study.name,
			short_name: study.short_name,
			description: study.description,
			public_study: study.public_study,
			pmid: study.pmid,
			citation: study.citation,
			groups: study.groups,
			status: study.status,
			import_date: study.import_date,
			reference_genome: study.reference_genome,
			all_sample_count: study.all_sample_count,
			cancer_type: study.type_of_cancer.map(CancerTypeItem::from),
			read_permission,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancerTypeItem {
	pub cancer_type_id: String,
	pub name: String,
	pub dedicated_color: Option<String>,
	pub short_name: Option<String>,
	pub parent: Option<String>,
}
impl From<TypeOfCancer> for CancerTypeItem {
	fn from(toc: TypeOfCancer) -> Self {
		Self {
			cancer_type_id: toc.type_of_cancer_id,
			name: toc.name,
			dedicated_color: toc.dedicated_color,
			short_name: toc.short_name,
			parent: toc.parent,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMeta {
	pub total_count: i64,
}

impl StudyService {
	/// Primary keyword results topped up with primary site matches. No visibility step.
	pub async fn compose(&self, query: &StudyQuery) -> Result<Vec<CancerStudy>> {
		compose::compose(
			self.collaborators.studies.as_ref(),
			self.collaborators.cancer_types.as_ref(),
			query,
		)
		.await
	}

	/// The study listing as `principal` should see it.
	///
	/// Unreadable studies are dropped, or kept and flagged when
	/// `security.show_unauthorized_studies` is set.
	pub async fn get_all_studies(
		&self,
		mut query: StudyQuery,
		principal: Option<&Principal>,
	) -> Result<Vec<StudyItem>> {
		query.keyword = normalize_keyword(query.keyword);

		let composed = self.compose(&query).await?;
		let permissions = self.collaborators.permissions.as_ref();
		let visible = filter_readable(&composed, principal, self.listing_access_level(), permissions);

		if self.cfg.security.show_unauthorized_studies {
			return Ok(mark_readable(&visible, principal, AccessLevel::Read, permissions));
		}

		Ok(visible.into_iter().map(|study| StudyItem::from_study(study, true)).collect())
	}

	/// Total number of studies a keyword search would compose, before visibility filtering.
	pub async fn get_meta_studies(&self, keyword: Option<&str>) -> Result<StudyMeta> {
		let Some(keyword) = normalize_keyword(keyword.map(str::to_string)) else {
			let total_count = self.collaborators.studies.get_meta_studies(None).await?;

			return Ok(StudyMeta { total_count });
		};
		let query = StudyQuery { keyword: Some(keyword), ..StudyQuery::unfiltered(Projection::Summary) };
		let composed = self.compose(&query).await?;

		Ok(StudyMeta { total_count: composed.len() as i64 })
	}

	pub async fn get_study(&self, study_id: &str) -> Result<CancerStudy> {
		let study_id = required_study_id(study_id)?;

		self.collaborators
			.studies
			.get_study(study_id, Projection::Detailed)
			.await?
			.ok_or_else(|| Error::StudyNotFound { study_id: study_id.to_string() })
	}

	/// A single study, refused unless `principal` can read it.
	pub async fn read_study(&self, study_id: &str, principal: Option<&Principal>) -> Result<StudyItem> {
		let study = self.get_study(study_id).await?;

		if !self.collaborators.permissions.has_permission(principal, &study, AccessLevel::Read) {
			return Err(Error::AccessDenied {
				message: format!("No read access to study {}.", study.cancer_study_identifier),
			});
		}

		Ok(StudyItem::from_study(study, true))
	}

	pub async fn fetch_studies(
		&self,
		study_ids: &[String],
		projection: Projection,
	) -> Result<Vec<CancerStudy>> {
		self.collaborators.studies.fetch_studies(study_ids, projection).await
	}

	/// `fetch_studies` restricted to what `principal` can read.
	pub async fn fetch_readable_studies(
		&self,
		study_ids: &[String],
		projection: Projection,
		principal: Option<&Principal>,
	) -> Result<Vec<StudyItem>> {
		let studies = self.fetch_studies(study_ids, projection).await?;
		let readable = filter_readable(
			&studies,
			principal,
			AccessLevel::Read,
			self.collaborators.permissions.as_ref(),
		);

		Ok(readable.into_iter().map(|study| StudyItem::from_study(study, true)).collect())
	}

	pub async fn fetch_meta_studies(&self, study_ids: &[String]) -> Result<StudyMeta> {
		let total_count = self.collaborators.studies.fetch_meta_studies(study_ids).await?;

		Ok(StudyMeta { total_count })
	}
}

pub(crate) fn required_study_id(study_id: &str) -> Result<&str> {
	let study_id = study_id.trim();

	if study_id.is_empty() {
		return Err(Error::InvalidRequest { message: "study_id is required.".to_string() });
	}

	Ok(study_id)
}

fn normalize_keyword(keyword: Option<String>) -> Option<String> {
	keyword.map(|keyword| keyword.trim().to_string()).filter(|keyword| !keyword.is_empty())
}
