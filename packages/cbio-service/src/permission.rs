use serde::{Deserialize, Serialize};

use cbio_storage::models::CancerStudy;

use crate::ReadPermission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
	Read,
	List,
}

/// The caller as identified by the upstream authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
	pub name: String,
	/// Study identifiers and permission groups granted to the caller.
	pub authorities: Vec<String>,
}
impl Principal {
	pub fn new(name: impl Into<String>, authorities: Vec<String>) -> Self {
		Self { name: name.into(), authorities }
	}

	pub fn holds(&self, authority: &str) -> bool {
		self.authorities.iter().any(|granted| granted.eq_ignore_ascii_case(authority))
	}
}

/// Grants by study identifier or by permission group.
#[derive(Debug, Clone)]
pub struct GroupPermission {
	authenticate: bool,
	public_study_group: Option<String>,
	list_unauthorized: bool,
}
impl GroupPermission {
	pub fn new(cfg: &cbio_config::Security) -> Self {
		Self {
			authenticate: cfg.authenticate,
			public_study_group: cfg.public_study_group.clone(),
			list_unauthorized: cfg.show_unauthorized_studies,
		}
	}

	fn is_public(&self, study: &CancerStudy) -> bool {
		if study.public_study {
			return true;
		}

		let Some(public_group) = self.public_study_group.as_deref() else {
			return false;
		};

		study.group_names().any(|group| group.eq_ignore_ascii_case(public_group))
	}
}
impl ReadPermission for GroupPermission {
	fn has_permission(
		&self,
		principal: Option<&Principal>,
		study: &CancerStudy,
		access_level: AccessLevel,
	) -> bool {
		if !self.authenticate {
			return true;
		}
		if access_level == AccessLevel::List && self.list_unauthorized {
			return true;
		}
		if self.is_public(study) {
			return true;
		}

		let Some(principal) = principal else {
			return false;
		};

		principal.holds(&study.cancer_study_identifier)
			|| study.group_names().any(|group| principal.holds(group))
	}
}
