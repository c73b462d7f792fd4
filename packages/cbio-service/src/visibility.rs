use cbio_storage::models::CancerStudy;

use crate::{AccessLevel, Principal, ReadPermission, studies::StudyItem};

/// Studies `principal` may see at `access_level`, in input order.
///
/// The input is never touched; callers may pass a slice that also lives in a shared cache.
pub fn filter_readable(
	studies: &[CancerStudy],
	principal: Option<&Principal>,
	access_level: AccessLevel,
	permissions: &dyn ReadPermission,
) -> Vec<CancerStudy> {
	studies
		.iter()
		.filter(|study| permissions.has_permission(principal, study, access_level))
		.cloned()
		.collect()
}

/// Every study, flagged with whether `principal` has `access_level` on it.
pub fn mark_readable(
	studies: &[CancerStudy],
	principal: Option<&Principal>,
	access_level: AccessLevel,
	permissions: &dyn ReadPermission,
) -> Vec<StudyItem> {
	studies
		.iter()
		.map(|study| {
			let readable = permissions.has_permission(principal, study, access_level);

			StudyItem::from_study(study.clone(), readable)
		})
		.collect()
}
