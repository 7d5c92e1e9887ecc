//! Version reconciliation: deployed vs. declared service versions.

use crate::catalog::ServiceCatalog;
use crate::domain::{ChangeRecord, ServiceInput, ServiceVersionMap};

/// Compare two version maps.
///
/// Produces one [`ChangeRecord`] per service in the union of both maps:
/// services in `deployed` order first, then services only `declared`
/// knows, in their order.
pub fn reconcile(deployed: &ServiceVersionMap, declared: &ServiceVersionMap) -> Vec<ChangeRecord> {
    let mut records: Vec<ChangeRecord> = deployed
        .iter()
        .map(|entry| {
            ChangeRecord::new(
                entry.service.clone(),
                Some(entry.version.clone()),
                declared.version(&entry.service).map(str::to_string),
            )
        })
        .collect();

    records.extend(
        declared
            .iter()
            .filter(|entry| !deployed.contains(&entry.service))
            .map(|entry| ChangeRecord::new(entry.service.clone(), None, Some(entry.version.clone()))),
    );

    records
}

/// Turn change records into `input.json` rows.
///
/// Missing versions become empty tags; repositories and version keys come
/// from the catalog (see [`ServiceCatalog::repository_for`]).
pub fn plan_service_inputs(
    changes: &[ChangeRecord],
    catalog: &ServiceCatalog,
    github_org: Option<&str>,
) -> Vec<ServiceInput> {
    changes
        .iter()
        .map(|change| ServiceInput {
            service: change.service.clone(),
            repository: catalog.repository_for(&change.service, github_org),
            version_key: catalog
                .get(&change.service)
                .and_then(|e| e.version_key.clone()),
            current_tag: change.current_version.clone().unwrap_or_default(),
            new_tag: change.new_version.clone().unwrap_or_default(),
        })
        .collect()
}
