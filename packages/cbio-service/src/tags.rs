use serde_json::Value;

use cbio_storage::{models::CancerStudyTags, queries::Projection};

use crate::{AccessLevel, Error, Principal, Result, StudyService, studies::required_study_id};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyTagsItem {
	pub study_id: String,
	pub tags: Value,
}
impl From<CancerStudyTags> for StudyTagsItem {
	fn from(tags: CancerStudyTags) -> Self {
		Self { study_id: tags.study_id, tags: tags.tags }
	}
}

impl StudyService {
	/// Tags of one study. The study must exist and be readable at `access_level`.
	pub async fn get_tags(
		&self,
		study_id: &str,
		principal: Option<&Principal>,
		access_level: AccessLevel,
	) -> Result<Option<CancerStudyTags>> {
		let study_id = required_study_id(study_id)?;
		let Some(study) = self.collaborators.studies.get_study(study_id, Projection::Id).await?
		else {
			return Err(Error::StudyNotFound { study_id: study_id.to_string() });
		};

		if !self.collaborators.permissions.has_permission(principal, &study, access_level) {
			tracing::debug!(study_id, "Tag lookup denied.");

			return Err(Error::AccessDenied {
				message: format!("No access to the tags of study {study_id}."),
			});
		}

		self.collaborators.studies.get_tags(study_id).await
	}

	/// Tags of every listed study that `principal` can read. Unknown identifiers are skipped.
	pub async fn get_tags_for_multiple_studies(
		&self,
		study_ids: &[String],
		principal: Option<&Principal>,
	) -> Result<Vec<CancerStudyTags>> {
		let studies = self.collaborators.studies.fetch_studies(study_ids, Projection::Id).await?;
		let permissions = self.collaborators.permissions.as_ref();
		let readable: Vec<String> = studies
			.into_iter()
			.filter(|study| permissions.has_permission(principal, study, AccessLevel::Read))
			.map(|study| study.cancer_study_identifier)
			.collect();

		if readable.is_empty() {
			return Ok(Vec::new());
		}

		self.collaborators.studies.get_tags_for_multiple_studies(&readable).await
	}
}
