//! The three harvest stages: gather, fetch and import.
//!
//! Each stage is invoked by an external scheduler, once per job (gather) or
//! once per unit (fetch, import). Failures are recorded in the store and the
//! unit is moved to its failure state; nothing is retried here.

use serde::Serialize;

use crate::catalog::{find_or_create_groups, Catalog};
use crate::error::{HarvesterError, Result};
use crate::metadata::ReaderRegistry;
use crate::names::{CkanNames, NameSanitizer};
use crate::normalize::{normalize, NoPostProcessing, NormalizedRecord, PostProcessor};
use crate::oai::OaiClient;
use crate::store::{ErrorRecord, HarvestStore};
use crate::types::{HarvestJob, HarvestUnit, Record, Stage, UnitContent, UnitStatus};

/// Static description of this harvester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvesterInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Hooks around the `GetRecord` call of the fetch stage.
///
/// An error from either hook fails the unit like any other fetch error.
pub trait FetchHooks: Send + Sync {
    fn before_fetch(&self, _unit: &HarvestUnit) -> Result<()> {
        Ok(())
    }

    fn after_fetch(&self, _record: &Record) -> Result<()> {
        Ok(())
    }
}

/// No-op hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl FetchHooks for NoHooks {}

/// OAI-PMH harvester.
pub struct Harvester {
    registry: ReaderRegistry,
    sanitizer: Box<dyn NameSanitizer>,
    post_processor: Box<dyn PostProcessor>,
    hooks: Box<dyn FetchHooks>,
}

impl Harvester {
    /// Harvester using CKAN naming rules, no post-processing and no hooks.
    #[must_use]
    pub fn new(registry: ReaderRegistry) -> Self {
        Self {
            registry,
            sanitizer: Box::new(CkanNames),
            post_processor: Box::new(NoPostProcessing),
            hooks: Box::new(NoHooks),
        }
    }

    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: impl NameSanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    #[must_use]
    pub fn with_post_processor(mut self, post_processor: impl PostProcessor + 'static) -> Self {
        self.post_processor = Box::new(post_processor);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: impl FetchHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    #[must_use]
    pub fn info() -> HarvesterInfo {
        HarvesterInfo {
            name: "OAI-PMH",
            title: "OAI-PMH",
            description: "Harvester for OAI-PMH data sources",
        }
    }

    /// Discover the records of a job's source and save one unit per header.
    ///
    /// Any failure aborts the whole gather and is recorded once against the
    /// job. Units saved before the failure are kept. Returns the number of
    /// units created.
    pub fn gather(&self, job: &HarvestJob, store: &mut dyn HarvestStore) -> Result<usize> {
        let source = &job.source;
        tracing::info!(
            job_id = %job.id,
            url = %source.url,
            metadata_prefix = %source.config.metadata_prefix,
            set = ?source.config.set_spec,
            "gather started"
        );

        match self.gather_units(job, store) {
            Ok(count) => {
                tracing::info!(job_id = %job.id, units = count, "gather finished");
                Ok(count)
            }
            Err(e) => {
                let message = format!("Gather from {} failed: {e}", source.url);
                report(store, ErrorRecord::for_job(job, Stage::Gather, message));
                Err(e)
            }
        }
    }

    fn gather_units(&self, job: &HarvestJob, store: &mut dyn HarvestStore) -> Result<usize> {
        let config = &job.source.config;
        // Unknown formats fail here, before any request is sent.
        self.registry.lookup(&config.metadata_prefix)?;

        let client = OaiClient::new(&job.source.url, config)?;
        let identify = client.identify()?;
        tracing::debug!(repository = %identify.repository_name, "identified repository");

        let mut created = 0;
        for header in client.list_identifiers(&config.metadata_prefix, config.set_spec.as_deref()) {
            let header = header?;
            if header.deleted {
                tracing::debug!(identifier = %header.identifier, "header marked deleted");
            }
            store.save_unit(&HarvestUnit::new(header.identifier, &job.id))?;
            created += 1;
        }
        Ok(created)
    }

    /// Retrieve one record, extract its fields and store them on the unit.
    ///
    /// On failure the unit is left in `fetch_failed` without content.
    pub fn fetch(
        &self,
        job: &HarvestJob,
        unit: &mut HarvestUnit,
        store: &mut dyn HarvestStore,
    ) -> Result<()> {
        match self.fetch_content(job, unit) {
            Ok(content) => {
                unit.content = Some(content);
                unit.status = UnitStatus::Fetched;
                store.save_unit(unit)?;
                tracing::debug!(guid = %unit.guid, "fetched record");
                Ok(())
            }
            Err(e) => {
                unit.content = None;
                unit.status = UnitStatus::FetchFailed;
                report(store, ErrorRecord::for_unit(unit, Stage::Fetch, e.to_string()));
                store.save_unit(unit)?;
                Err(e)
            }
        }
    }

    fn fetch_content(&self, job: &HarvestJob, unit: &HarvestUnit) -> Result<String> {
        let config = &job.source.config;
        let reader = self.registry.lookup(&config.metadata_prefix)?;
        let client = OaiClient::new(&job.source.url, config)?;

        self.hooks.before_fetch(unit)?;
        let record = client.get_record(&unit.guid, &config.metadata_prefix)?;
        self.hooks.after_fetch(&record)?;

        let fields = reader.extract_record(&record)?;
        let content = UnitContent {
            set_spec: record.header.set_specs.clone(),
            metadata_modified: record.header.datestamp.map(|d| d.to_rfc3339()),
            fields,
        };
        Ok(content.to_json()?)
    }

    /// Normalize a fetched unit and create or update its catalog package.
    ///
    /// Units that were never fetched successfully are rejected without a
    /// state change. Any other failure moves the unit to `import_failed`.
    pub fn import(
        &self,
        job: &HarvestJob,
        unit: &mut HarvestUnit,
        store: &mut dyn HarvestStore,
        catalog: &mut dyn Catalog,
    ) -> Result<NormalizedRecord> {
        let content = match (&unit.content, unit.status.is_importable()) {
            (Some(content), true) => content.clone(),
            (_, false) => {
                let e = HarvesterError::InvalidUnitState {
                    guid: unit.guid.clone(),
                    status: unit.status.to_string(),
                    action: "imported",
                };
                report(store, ErrorRecord::for_unit(unit, Stage::Import, e.to_string()));
                return Err(e);
            }
            (None, true) => {
                let e = HarvesterError::MissingContent(unit.guid.clone());
                report(store, ErrorRecord::for_unit(unit, Stage::Import, e.to_string()));
                return Err(e);
            }
        };

        match self.import_content(job, &unit.guid, &content, catalog) {
            Ok(record) => {
                unit.status = UnitStatus::Imported;
                unit.package_id = Some(record.id.clone());
                store.save_unit(unit)?;
                Ok(record)
            }
            Err(e) => {
                unit.status = UnitStatus::ImportFailed;
                report(store, ErrorRecord::for_unit(unit, Stage::Import, e.to_string()));
                store.save_unit(unit)?;
                Err(e)
            }
        }
    }

    fn import_content(
        &self,
        job: &HarvestJob,
        guid: &str,
        content: &str,
        catalog: &mut dyn Catalog,
    ) -> Result<NormalizedRecord> {
        let dialect = self.registry.dialect(&job.source.config.metadata_prefix)?;
        let content = UnitContent::from_json(content).map_err(|e| HarvesterError::ContentFormat {
            guid: guid.to_string(),
            message: e.to_string(),
        })?;

        let mut record = normalize(dialect, guid, &content, self.sanitizer.as_ref());
        record.owner_org = catalog
            .package_show(&job.source.id)?
            .and_then(|source| source.owner_org);
        record.groups = find_or_create_groups(catalog, self.sanitizer.as_ref(), &record.groups)?;

        let record = self.post_processor.post_process(&content, record)?;

        if catalog.package_show(&record.id)?.is_some() {
            catalog.package_update(&record)?;
            tracing::info!(guid, package = %record.name, "updated package");
        } else {
            catalog.package_create(&record)?;
            tracing::info!(guid, package = %record.name, "created package");
        }
        Ok(record)
    }
}

/// Log a failure and record it in the store.
fn report(store: &mut dyn HarvestStore, error: ErrorRecord) {
    tracing::error!(
        job_id = %error.job_id,
        guid = ?error.guid,
        stage = %error.stage,
        error = %error.message,
        "harvest error"
    );
    if let Err(e) = store.record_error(error) {
        tracing::error!(error = %e, "could not record harvest error");
    }
}
