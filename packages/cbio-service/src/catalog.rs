use std::collections::{HashMap, HashSet};

use cbio_storage::models::TypeOfCancer;

/// Root of the cancer type tree. Its direct children are the primary sites.
pub const TISSUE_ROOT: &str = "tissue";

/// Maps every cancer type id to its primary site.
///
/// The primary site is found by following `parent` links until the next parent is the tissue
/// root, is missing, or would revisit a type already on the path.
pub fn primary_site_map(types: &[TypeOfCancer]) -> HashMap<String, TypeOfCancer> {
	let by_id: HashMap<&str, &TypeOfCancer> =
		types.iter().map(|toc| (toc.type_of_cancer_id.as_str(), toc)).collect();
	let mut primary_sites = HashMap::with_capacity(types.len());

	for toc in types {
		let mut site = toc;
		let mut path = HashSet::from([site.type_of_cancer_id.as_str()]);

		while let Some(parent_id) = site.parent.as_deref()
			&& !parent_id.eq_ignore_ascii_case(TISSUE_ROOT)
			&& let Some(&parent) = by_id.get(parent_id)
			&& path.insert(parent.type_of_cancer_id.as_str())
		{
			site = parent;
		}

		primary_sites.insert(toc.type_of_cancer_id.clone(), site.clone());
	}

	primary_sites
}

/// Cancer type ids whose primary site id or name contains `keyword`, ignoring case.
pub fn matching_categories(
	primary_sites: &HashMap<String, TypeOfCancer>,
	keyword: &str,
) -> HashSet<String> {
	let needle = keyword.to_lowercase();

	primary_sites
		.iter()
		.filter(|(_, site)| {
			site.type_of_cancer_id.to_lowercase().contains(&needle)
				|| site.name.to_lowercase().contains(&needle)
		})
		.map(|(type_of_cancer_id, _)| type_of_cancer_id.clone())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn toc(id: &str, name: &str, parent: Option<&str>) -> TypeOfCancer {
		TypeOfCancer {
			type_of_cancer_id: id.to_string(),
			name: name.to_string(),
			dedicated_color: None,
			short_name: None,
			parent: parent.map(str::to_string),
		}
	}

	fn sample_types() -> Vec<TypeOfCancer> {
		vec![
			toc("tissue", "Tissue", None),
			toc("breast", "Breast", Some("tissue")),
			toc("brca", "Invasive Breast Carcinoma", Some("breast")),
			toc("idc", "Breast Invasive Ductal Carcinoma", Some("brca")),
			toc("lung", "Lung", Some("tissue")),
			toc("luad", "Lung Adenocarcinoma", Some("lung")),
		]
	}

	#[test]
	fn walks_up_to_the_primary_site() {
		let sites = primary_site_map(&sample_types());

		assert_eq!(sites["idc"].type_of_cancer_id, "breast");
		assert_eq!(sites["brca"].type_of_cancer_id, "breast");
		assert_eq!(sites["breast"].type_of_cancer_id, "breast");
		assert_eq!(sites["luad"].name, "Lung");
		assert_eq!(sites["tissue"].type_of_cancer_id, "tissue");
	}

	#[test]
	fn unknown_parent_stops_the_walk() {
		let sites = primary_site_map(&[toc("orphan", "Orphan", Some("gone"))]);

		assert_eq!(sites["orphan"].type_of_cancer_id, "orphan");
	}

	#[test]
	fn parent_cycles_terminate() {
		let sites = primary_site_map(&[toc("a", "A", Some("b")), toc("b", "B", Some("a"))]);

		assert_eq!(sites["a"].type_of_cancer_id, "b");
		assert_eq!(sites["b"].type_of_cancer_id, "a");
	}

	#[test]
	fn matches_primary_site_id_or_name_ignoring_case() {
		let sites = primary_site_map(&sample_types());
		let mut matched: Vec<String> = matching_categories(&sites, "BREAST").into_iter().collect();

		matched.sort();

		assert_eq!(matched, vec!["brca", "breast", "idc"]);
		assert!(matching_categories(&sites, "lun").contains("luad"));
	}

	#[test]
	fn matching_uses_the_site_not_the_type_itself() {
		let sites = primary_site_map(&sample_types());

		assert!(matching_categories(&sites, "adenocarcinoma").is_empty());
	}
}
