//! Accepted mappings remembered per tenant and template, with use counts.
//!
//! Callers consult the memory around the mapping stage; the mapper itself
//! never reads it.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::mapper::ColumnMapping;
use crate::error::{IntakeError, Result};
use crate::template::TemplateType;

/// A mapping accepted for a tenant's files of one template type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub id: String,
    pub tenant: String,
    pub template_type: TemplateType,
    pub column_mapping: ColumnMapping,
    /// Date layout accepted per canonical date field.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub date_formats: IndexMap<String, String>,
    pub use_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MemoryState {
    next_id: u64,
    records: Vec<MappingRecord>,
}

/// Thread-safe store of accepted mappings.
#[derive(Debug, Default)]
pub struct MappingMemory {
    state: Mutex<MemoryState>,
}

impl MappingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an accepted mapping.
    ///
    /// An identical mapping for the same tenant and template has its use
    /// count incremented; otherwise a new record starts at one.
    pub fn remember(
        &self,
        tenant: &str,
        template: TemplateType,
        mapping: &ColumnMapping,
        date_formats: &IndexMap<String, String>,
    ) -> MappingRecord {
        let mut state = self.lock();
        let now = Utc::now();

        if let Some(record) = state.records.iter_mut().find(|r| {
            r.tenant == tenant && r.template_type == template && r.column_mapping == *mapping
        }) {
            record.use_count += 1;
            record.last_used_at = now;
            if !date_formats.is_empty() {
                record.date_formats = date_formats.clone();
            }
            tracing::debug!(
                "Reused mapping {} for {}/{} (use count {})",
                record.id,
                tenant,
                template,
                record.use_count
            );
            return record.clone();
        }

        state.next_id += 1;
        let record = MappingRecord {
            id: format!("map_{:04}", state.next_id),
            tenant: tenant.to_string(),
            template_type: template,
            column_mapping: mapping.clone(),
            date_formats: date_formats.clone(),
            use_count: 1,
            created_at: now,
            last_used_at: now,
        };
        tracing::debug!("Stored new mapping {} for {}/{}", record.id, tenant, template);
        state.records.push(record.clone());
        record
    }

    /// Records for a tenant and template, most used first.
    pub fn lookup(&self, tenant: &str, template: TemplateType) -> Vec<MappingRecord> {
        let state = self.lock();
        let mut records: Vec<MappingRecord> = state
            .records
            .iter()
            .filter(|r| r.tenant == tenant && r.template_type == template)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.use_count
                .cmp(&a.use_count)
                .then(b.last_used_at.cmp(&a.last_used_at))
        });
        records
    }

    /// The most used record for a tenant and template.
    pub fn best(&self, tenant: &str, template: TemplateType) -> Option<MappingRecord> {
        self.lookup(tenant, template).into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save the memory to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    IntakeError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            IntakeError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let state = self.lock();
        serde_json::to_writer_pretty(BufWriter::new(file), &*state).map_err(|e| {
            IntakeError::Persistence(format!("Failed to serialize mapping memory: {}", e))
        })?;

        Ok(())
    }

    /// Load a memory from a JSON file. A missing file gives an empty memory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let file = File::open(path).map_err(|e| {
            IntakeError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let state: MemoryState = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            IntakeError::Persistence(format!(
                "Failed to parse mapping memory '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self {
            state: Mutex::new(state),
        })
    }
}
