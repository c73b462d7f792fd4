use serde_json::Value;
use time::OffsetDateTime;

/// One row of `cancer_study`, shaped by the projection it was fetched with.
///
/// Columns a projection does not load come back as `None`. `type_of_cancer` is only attached by
/// the DETAILED projection.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CancerStudy {
	pub cancer_study_id: i32,
	pub cancer_study_identifier: String,
	pub type_of_cancer_id: String,
	pub name: String,
	pub short_name: Option<String>,
	pub description: Option<String>,
	pub public_study: bool,
	pub pmid: Option<String>,
	pub citation: Option<String>,
	pub groups: Option<String>,
	pub status: i32,
	pub import_date: Option<OffsetDateTime>,
	pub reference_genome: Option<String>,
	pub all_sample_count: Option<i64>,
	#[sqlx(skip)]
	pub type_of_cancer: Option<TypeOfCancer>,
}
impl CancerStudy {
	/// Semicolon separated permission groups, trimmed and without empties.
	pub fn group_names(&self) -> impl Iterator<Item = &str> {
		self.groups
			.as_deref()
			.unwrap_or_default()
			.split(';')
			.map(str::trim)
			.filter(|group| !group.is_empty())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TypeOfCancer {
	pub type_of_cancer_id: String,
	pub name: String,
	pub dedicated_color: Option<String>,
	pub short_name: Option<String>,
	pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CancerStudyTags {
	pub cancer_study_id: i32,
	pub study_id: String,
	pub tags: Value,
}
