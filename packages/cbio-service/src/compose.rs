use indexmap::IndexMap;

use cbio_storage::{
	models::CancerStudy,
	queries::{Projection, StudyQuery},
};

use crate::{CancerTypeCatalog, Result, StudyRepository, catalog};

/// Runs the primary query and tops the page up with studies whose primary site matches the
/// keyword.
///
/// Primary results keep their storage order and always win over fallback matches with the same
/// identifier. Fallback matches follow in full-scan order until the page is full. The returned
/// `Vec` is always freshly allocated; nothing in it aliases a repository cache entry.
pub async fn compose(
	studies: &dyn StudyRepository,
	cancer_types: &dyn CancerTypeCatalog,
	query: &StudyQuery,
) -> Result<Vec<CancerStudy>> {
	let primary = studies.get_all_studies(query).await?;
	let mut result_set: IndexMap<String, CancerStudy> = IndexMap::with_capacity(primary.len());

	for study in primary.iter() {
		result_set.insert(study.cancer_study_identifier.clone(), study.clone());
	}

	let Some(keyword) = fallback_keyword(query, result_set.len()) else {
		return Ok(result_set.into_values().collect());
	};
	let primary_sites = cancer_types.get_primary_site_map().await?;
	let categories = catalog::matching_categories(&primary_sites, keyword);

	if categories.is_empty() {
		tracing::debug!(keyword, "No primary site matches the keyword; skipping full scan.");

		return Ok(result_set.into_values().collect());
	}

	tracing::debug!(
		keyword,
		primary = result_set.len(),
		categories = categories.len(),
		"Filling page with primary site matches."
	);

	let scan = studies.get_all_studies(&StudyQuery::unfiltered(Projection::Summary)).await?;

	for study in scan.iter() {
		if page_full(result_set.len(), query.page_size) {
			break;
		}
		if !categories.contains(&study.type_of_cancer_id)
			|| result_set.contains_key(&study.cancer_study_identifier)
		{
			continue;
		}

		result_set.insert(study.cancer_study_identifier.clone(), study.clone());
	}

	Ok(result_set.into_values().collect())
}

/// The keyword to fall back on, if the page still has room for fallback matches.
///
/// A page size of zero leaves no room, so it never falls back.
fn fallback_keyword(query: &StudyQuery, primary_len: usize) -> Option<&str> {
	let keyword = query.keyword.as_deref().map(str::trim).filter(|keyword| !keyword.is_empty())?;

	match query.page_size {
		None => Some(keyword),
		Some(page_size) => (primary_len < page_size as usize).then_some(keyword),
	}
}

fn page_full(len: usize, page_size: Option<u32>) -> bool {
	page_size.map(|page_size| len >= page_size as usize).unwrap_or(false)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn query(keyword: Option<&str>, page_size: Option<u32>) -> StudyQuery {
		StudyQuery {
			keyword: keyword.map(str::to_string),
			page_size,
			..StudyQuery::unfiltered(Projection::Summary)
		}
	}

	#[test]
	fn falls_back_only_with_a_keyword_and_room_left() {
		assert_eq!(fallback_keyword(&query(Some("lung"), Some(5)), 2), Some("lung"));
		assert_eq!(fallback_keyword(&query(Some(" lung "), None), 100), Some("lung"));
		assert_eq!(fallback_keyword(&query(Some("lung"), Some(5)), 5), None);
		assert_eq!(fallback_keyword(&query(Some("   "), Some(5)), 0), None);
		assert_eq!(fallback_keyword(&query(None, None), 0), None);
	}

	#[test]
	fn zero_page_size_never_falls_back() {
		assert_eq!(fallback_keyword(&query(Some("lung"), Some(0)), 0), None);
	}

	#[test]
	fn page_is_never_full_without_a_page_size() {
		assert!(!page_full(usize::MAX, None));
		assert!(page_full(3, Some(3)));
		assert!(!page_full(2, Some(3)));
	}
}
