use std::{collections::HashMap, fmt, str::FromStr};

use sqlx::{Postgres, QueryBuilder};

use crate::{
	Error, Result,
	db::Db,
	models::{CancerStudy, CancerStudyTags, TypeOfCancer},
};

const ID_COLUMNS: &str = "\
cs.cancer_study_id,
cs.cancer_study_identifier,
cs.type_of_cancer_id,
cs.name,
NULL::text AS short_name,
NULL::text AS description,
cs.public_study,
NULL::text AS pmid,
NULL::text AS citation,
cs.groups,
cs.status,
NULL::timestamptz AS import_date,
NULL::text AS reference_genome,
NULL::bigint AS all_sample_count";
const SUMMARY_COLUMNS: &str = "\
cs.cancer_study_id,
cs.cancer_study_identifier,
cs.type_of_cancer_id,
cs.name,
cs.short_name,
cs.description,
cs.public_study,
cs.pmid,
cs.citation,
cs.groups,
cs.status,
cs.import_date,
cs.reference_genome,
NULL::bigint AS all_sample_count";
const DETAILED_COLUMNS: &str = "\
cs.cancer_study_id,
cs.cancer_study_identifier,
cs.type_of_cancer_id,
cs.name,
cs.short_name,
cs.description,
cs.public_study,
cs.pmid,
cs.citation,
cs.groups,
cs.status,
cs.import_date,
cs.reference_genome,
(SELECT count(*) FROM sample s WHERE s.cancer_study_id = cs.cancer_study_id) AS all_sample_count";
const STUDY_FROM: &str = "
FROM cancer_study cs
LEFT JOIN type_of_cancer toc ON toc.type_of_cancer_id = cs.type_of_cancer_id";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Projection {
	Id,
	#[default]
	Summary,
	Detailed,
	/// Counts only. List queries treat it like SUMMARY.
	Meta,
}
impl Projection {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Id => "ID",
			Self::Summary => "SUMMARY",
			Self::Detailed => "DETAILED",
			Self::Meta => "META",
		}
	}

	fn columns(self) -> &'static str {
		match self {
			Self::Id => ID_COLUMNS,
			Self::Summary | Self::Meta => SUMMARY_COLUMNS,
			Self::Detailed => DETAILED_COLUMNS,
		}
	}
}
impl FromStr for Projection {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"ID" => Ok(Self::Id),
			"SUMMARY" => Ok(Self::Summary),
			"DETAILED" => Ok(Self::Detailed),
			"META" => Ok(Self::Meta),
			_ => Err(Error::InvalidArgument(format!("Unknown projection {raw:?}."))),
		}
	}
}
impl fmt::Display for Projection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
	#[default]
	Asc,
	Desc,
}
impl Direction {
	fn sql(self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}
}
impl FromStr for Direction {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"ASC" => Ok(Self::Asc),
			"DESC" => Ok(Self::Desc),
			_ => Err(Error::InvalidArgument(format!("Unknown sort direction {raw:?}."))),
		}
	}
}

/// Sortable study attributes, named the way the HTTP API spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudySortBy {
	StudyId,
	CancerTypeId,
	Name,
	ShortName,
	Description,
	PublicStudy,
	Pmid,
	Citation,
	Groups,
	Status,
	ImportDate,
}
impl StudySortBy {
	fn column(self) -> &'static str {
		match self {
			Self::StudyId => "cs.cancer_study_identifier",
			Self::CancerTypeId => "cs.type_of_cancer_id",
			Self::Name => "cs.name",
			Self::ShortName => "cs.short_name",
			Self::Description => "cs.description",
			Self::PublicStudy => "cs.public_study",
			Self::Pmid => "cs.pmid",
			Self::Citation => "cs.citation",
			Self::Groups => "cs.groups",
			Self::Status => "cs.status",
			Self::ImportDate => "cs.import_date",
		}
	}
}
impl FromStr for StudySortBy {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw.trim() {
			"studyId" => Ok(Self::StudyId),
			"cancerTypeId" => Ok(Self::CancerTypeId),
			"name" => Ok(Self::Name),
			"shortName" => Ok(Self::ShortName),
			"description" => Ok(Self::Description),
			"publicStudy" => Ok(Self::PublicStudy),
			"pmid" => Ok(Self::Pmid),
			"citation" => Ok(Self::Citation),
			"groups" => Ok(Self::Groups),
			"status" => Ok(Self::Status),
			"importDate" => Ok(Self::ImportDate),
			_ => Err(Error::InvalidArgument(format!("Unknown sort attribute {raw:?}."))),
		}
	}
}

/// Parameters of one study list query. Doubles as the query cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StudyQuery {
	pub keyword: Option<String>,
	pub projection: Projection,
	pub page_size: Option<u32>,
	pub page_number: Option<u32>,
	pub sort_by: Option<StudySortBy>,
	pub direction: Option<Direction>,
}
impl StudyQuery {
	/// Every study, unsorted beyond insertion order, unpaginated.
	pub fn unfiltered(projection: Projection) -> Self {
		Self { projection, ..Default::default() }
	}
}

pub async fn get_all_studies(db: &Db, query: &StudyQuery) -> Result<Vec<CancerStudy>> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT ");

	builder.push(query.projection.columns());
	builder.push(STUDY_FROM);
	push_keyword_filter(&mut builder, query.keyword.as_deref());

	match query.sort_by {
		Some(sort_by) => {
			builder.push(" ORDER BY ");
			builder.push(sort_by.column());
			builder.push(" ");
			builder.push(query.direction.unwrap_or_default().sql());
			builder.push(", cs.cancer_study_id");
		},
		None => {
			builder.push(" ORDER BY cs.cancer_study_id");
		},
	}

	if let Some(page_size) = query.page_size {
		let offset = i64::from(page_size) * i64::from(query.page_number.unwrap_or(0));

		builder.push(" LIMIT ");
		builder.push_bind(i64::from(page_size));
		builder.push(" OFFSET ");
		builder.push_bind(offset);
	}

	let mut studies: Vec<CancerStudy> = builder.build_query_as().fetch_all(&db.pool).await?;

	if query.projection == Projection::Detailed {
		attach_cancer_types(db, &mut studies).await?;
	}

	Ok(studies)
}

pub async fn get_meta_studies(db: &Db, keyword: Option<&str>) -> Result<i64> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT count(*)");

	builder.push(STUDY_FROM);
	push_keyword_filter(&mut builder, keyword);

	let count: i64 = builder.build_query_scalar().fetch_one(&db.pool).await?;

	Ok(count)
}

pub async fn get_study(
	db: &Db,
	study_id: &str,
	projection: Projection,
) -> Result<Option<CancerStudy>> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT ");

	builder.push(projection.columns());
	builder.push(STUDY_FROM);
	builder.push(" WHERE cs.cancer_study_identifier = ");
	builder.push_bind(study_id);

	let Some(study) = builder.build_query_as::<CancerStudy>().fetch_optional(&db.pool).await?
	else {
		return Ok(None);
	};
	let mut studies = vec![study];

	if projection == Projection::Detailed {
		attach_cancer_types(db, &mut studies).await?;
	}

	Ok(studies.pop())
}

pub async fn fetch_studies(
	db: &Db,
	study_ids: &[String],
	projection: Projection,
) -> Result<Vec<CancerStudy>> {
	if study_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut builder = QueryBuilder::<Postgres>::new("SELECT ");

	builder.push(projection.columns());
	builder.push(STUDY_FROM);
	builder.push(" WHERE cs.cancer_study_identifier = ANY(");
	builder.push_bind(study_ids);
	builder.push(") ORDER BY cs.cancer_study_identifier");

	let mut studies: Vec<CancerStudy> = builder.build_query_as().fetch_all(&db.pool).await?;

	if projection == Projection::Detailed {
		attach_cancer_types(db, &mut studies).await?;
	}

	Ok(studies)
}

pub async fn fetch_meta_studies(db: &Db, study_ids: &[String]) -> Result<i64> {
	if study_ids.is_empty() {
		return Ok(0);
	}

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM cancer_study WHERE cancer_study_identifier = ANY($1)",
	)
	.bind(study_ids)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}

pub async fn get_tags(db: &Db, study_id: &str) -> Result<Option<CancerStudyTags>> {
	let tags = sqlx::query_as::<_, CancerStudyTags>(
		"\
SELECT t.cancer_study_id, cs.cancer_study_identifier AS study_id, t.tags
FROM cancer_study_tags t
JOIN cancer_study cs ON cs.cancer_study_id = t.cancer_study_id
WHERE cs.cancer_study_identifier = $1",
	)
	.bind(study_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(tags)
}

pub async fn get_tags_for_multiple_studies(
	db: &Db,
	study_ids: &[String],
) -> Result<Vec<CancerStudyTags>> {
	if study_ids.is_empty() {
		return Ok(Vec::new());
	}

	let tags = sqlx::query_as::<_, CancerStudyTags>(
		"\
SELECT t.cancer_study_id, cs.cancer_study_identifier AS study_id, t.tags
FROM cancer_study_tags t
JOIN cancer_study cs ON cs.cancer_study_id = t.cancer_study_id
WHERE cs.cancer_study_identifier = ANY($1)
ORDER BY cs.cancer_study_identifier",
	)
	.bind(study_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(tags)
}

pub async fn get_cancer_types(db: &Db) -> Result<Vec<TypeOfCancer>> {
	let types = sqlx::query_as::<_, TypeOfCancer>(
		"\
SELECT type_of_cancer_id, name, dedicated_color, short_name, parent
FROM type_of_cancer
ORDER BY type_of_cancer_id",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(types)
}

async fn attach_cancer_types(db: &Db, studies: &mut [CancerStudy]) -> Result<()> {
	if studies.is_empty() {
		return Ok(());
	}

	let mut type_ids: Vec<String> =
		studies.iter().map(|study| study.type_of_cancer_id.clone()).collect();

	type_ids.sort();
	type_ids.dedup();

	let rows = sqlx::query_as::<_, TypeOfCancer>(
		"\
SELECT type_of_cancer_id, name, dedicated_color, short_name, parent
FROM type_of_cancer
WHERE type_of_cancer_id = ANY($1)",
	)
	.bind(type_ids.as_slice())
	.fetch_all(&db.pool)
	.await?;
	let by_id: HashMap<String, TypeOfCancer> =
		rows.into_iter().map(|row| (row.type_of_cancer_id.clone(), row)).collect();

	for study in studies {
		study.type_of_cancer = by_id.get(&study.type_of_cancer_id).cloned();
	}

	Ok(())
}

/// Every whitespace separated term must match the identifier, name, description, or cancer type
/// name of the study.
fn push_keyword_filter(builder: &mut QueryBuilder<'_, Postgres>, keyword: Option<&str>) {
	let terms = keyword_terms(keyword);

	if terms.is_empty() {
		return;
	}

	builder.push(" WHERE ");

	for (i, term) in terms.iter().enumerate() {
		if i > 0 {
			builder.push(" AND ");
		}

		let pattern = like_pattern(term);

		builder.push("(cs.cancer_study_identifier ILIKE ");
		builder.push_bind(pattern.clone());
		builder.push(" OR cs.name ILIKE ");
		builder.push_bind(pattern.clone());
		builder.push(" OR cs.description ILIKE ");
		builder.push_bind(pattern.clone());
		builder.push(" OR toc.name ILIKE ");
		builder.push_bind(pattern);
		builder.push(")");
	}
}

fn keyword_terms(keyword: Option<&str>) -> Vec<&str> {
	keyword.map(|keyword| keyword.split_whitespace().collect()).unwrap_or_default()
}

fn like_pattern(term: &str) -> String {
	let mut out = String::with_capacity(term.len() + 2);

	out.push('%');

	for ch in term.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('%');

	out
}
