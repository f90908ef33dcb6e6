//! Persistence of harvest units and recorded errors.

use std::collections::HashMap;

use crate::error::Result;
use crate::types::{HarvestJob, HarvestUnit, Stage, UnitStatus};

/// A failure recorded against a job or one of its units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub job_id: String,

    /// `None` for job-level errors.
    pub guid: Option<String>,

    pub stage: Stage,
    pub message: String,
}

impl ErrorRecord {
    /// Error affecting a whole job.
    #[must_use]
    pub fn for_job(job: &HarvestJob, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            job_id: job.id.clone(),
            guid: None,
            stage,
            message: message.into(),
        }
    }

    /// Error affecting one unit.
    #[must_use]
    pub fn for_unit(unit: &HarvestUnit, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            job_id: unit.job_id.clone(),
            guid: Some(unit.guid.clone()),
            stage,
            message: message.into(),
        }
    }
}

/// Where the stages persist units and errors.
pub trait HarvestStore {
    /// Insert or replace a unit, keyed by job id and guid.
    fn save_unit(&mut self, unit: &HarvestUnit) -> Result<()>;

    fn record_error(&mut self, error: ErrorRecord) -> Result<()>;
}

/// Store held in memory, preserving insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    units: Vec<HarvestUnit>,
    index: HashMap<(String, String), usize>,
    errors: Vec<ErrorRecord>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn units(&self) -> &[HarvestUnit] {
        &self.units
    }

    #[must_use]
    pub fn unit(&self, job_id: &str, guid: &str) -> Option<&HarvestUnit> {
        self.index
            .get(&(job_id.to_string(), guid.to_string()))
            .map(|&i| &self.units[i])
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Number of units in a given state.
    #[must_use]
    pub fn count(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status == status).count()
    }
}

impl HarvestStore for InMemoryStore {
    fn save_unit(&mut self, unit: &HarvestUnit) -> Result<()> {
        let key = (unit.job_id.clone(), unit.guid.clone());
        match self.index.get(&key) {
            Some(&i) => self.units[i] = unit.clone(),
            None => {
                self.index.insert(key, self.units.len());
                self.units.push(unit.clone());
            }
        }
        Ok(())
    }

    fn record_error(&mut self, error: ErrorRecord) -> Result<()> {
        self.errors.push(error);
        Ok(())
    }
}
