//! Canonical field schema for the two feeds, user mappings from canonical
//! fields to source headers, and named mapping presets.

use crate::error::PipelineError;
use crate::types::{Cell, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Name of the preset every store starts with.
pub const DEFAULT_PRESET_NAME: &str = "Default (exact headers)";

/// Internal attribute names that source headers are mapped onto. The string
/// form doubles as the expected header when no explicit mapping exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    #[serde(rename = "ProjectID")]
    ProjectId,
    ProjectName,
    State,
    Corridor,
    Contractor,
    LengthKm,
    Date,
    PlannedPhysicalPct,
    ActualPhysicalPct,
    Milestone,
    PlannedAmount,
    ActualAmount,
    CumulativePlanned,
    CumulativeActual,
    FundingSource,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 15] = [
        CanonicalField::ProjectId,
        CanonicalField::ProjectName,
        CanonicalField::State,
        CanonicalField::Corridor,
        CanonicalField::Contractor,
        CanonicalField::LengthKm,
        CanonicalField::Date,
        CanonicalField::PlannedPhysicalPct,
        CanonicalField::ActualPhysicalPct,
        CanonicalField::Milestone,
        CanonicalField::PlannedAmount,
        CanonicalField::ActualAmount,
        CanonicalField::CumulativePlanned,
        CanonicalField::CumulativeActual,
        CanonicalField::FundingSource,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::ProjectId => "ProjectID",
            CanonicalField::ProjectName => "ProjectName",
            CanonicalField::State => "State",
            CanonicalField::Corridor => "Corridor",
            CanonicalField::Contractor => "Contractor",
            CanonicalField::LengthKm => "LengthKm",
            CanonicalField::Date => "Date",
            CanonicalField::PlannedPhysicalPct => "PlannedPhysicalPct",
            CanonicalField::ActualPhysicalPct => "ActualPhysicalPct",
            CanonicalField::Milestone => "Milestone",
            CanonicalField::PlannedAmount => "PlannedAmount",
            CanonicalField::ActualAmount => "ActualAmount",
            CanonicalField::CumulativePlanned => "CumulativePlanned",
            CanonicalField::CumulativeActual => "CumulativeActual",
            CanonicalField::FundingSource => "FundingSource",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Physical,
    Financial,
}

impl FeedKind {
    pub fn label(self) -> &'static str {
        match self {
            FeedKind::Physical => "Physical",
            FeedKind::Financial => "Financial",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The numeric check applied to each preview row of a feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRule {
    pub field: CanonicalField,
    /// Inclusive bounds; `None` only requires a finite number.
    pub bounds: Option<(f64, f64)>,
}

/// Everything that differs between the physical and financial feeds,
/// passed as data so mapping, validation and normalization stay generic.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSchema {
    pub kind: FeedKind,
    /// Fields that must be mapped before the feed can be used.
    pub required: Vec<CanonicalField>,
    /// Per-row numeric check.
    pub numeric_rule: NumericRule,
    /// Point attributes this feed can supply.
    pub point_fields: Vec<CanonicalField>,
    /// Project metadata this feed can supply (used only by enrichment).
    pub project_fields: Vec<CanonicalField>,
}

impl FeedSchema {
    pub fn physical() -> Self {
        Self {
            kind: FeedKind::Physical,
            required: vec![
                CanonicalField::ProjectId,
                CanonicalField::Date,
                CanonicalField::ActualPhysicalPct,
            ],
            numeric_rule: NumericRule {
                field: CanonicalField::ActualPhysicalPct,
                bounds: Some((0.0, 100.0)),
            },
            point_fields: vec![
                CanonicalField::PlannedPhysicalPct,
                CanonicalField::ActualPhysicalPct,
                CanonicalField::Milestone,
            ],
            project_fields: vec![
                CanonicalField::ProjectName,
                CanonicalField::State,
                CanonicalField::Corridor,
                CanonicalField::Contractor,
                CanonicalField::LengthKm,
            ],
        }
    }

    pub fn financial() -> Self {
        Self {
            kind: FeedKind::Financial,
            required: vec![
                CanonicalField::ProjectId,
                CanonicalField::Date,
                CanonicalField::ActualAmount,
            ],
            numeric_rule: NumericRule {
                field: CanonicalField::ActualAmount,
                bounds: None,
            },
            point_fields: vec![
                CanonicalField::PlannedAmount,
                CanonicalField::ActualAmount,
                CanonicalField::CumulativePlanned,
                CanonicalField::CumulativeActual,
                CanonicalField::FundingSource,
            ],
            project_fields: Vec::new(),
        }
    }

    /// Mapping where each required field points at the header of the same name.
    pub fn identity_mapping(&self) -> FieldMapping {
        let mut m = FieldMapping::default();
        for f in &self.required {
            m.set(*f, f.as_str());
        }
        m
    }
}

/// Canonical field -> source header. Unset and blank entries mean "unmapped".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<CanonicalField, String>);

impl FieldMapping {
    pub fn set(&mut self, field: CanonicalField, header: impl Into<String>) {
        self.0.insert(field, header.into());
    }

    pub fn clear(&mut self, field: CanonicalField) {
        self.0.remove(&field);
    }

    /// Explicitly mapped header, ignoring blank entries.
    pub fn mapped(&self, field: CanonicalField) -> Option<&str> {
        self.0
            .get(&field)
            .map(String::as_str)
            .filter(|h| !h.trim().is_empty())
    }

    /// Header to read for `field`: the explicit mapping, else the header whose
    /// text equals the canonical name.
    pub fn header_for(&self, field: CanonicalField) -> &str {
        self.mapped(field).unwrap_or_else(|| field.as_str())
    }

    /// Cell for `field` in `row`, following `header_for`.
    pub fn cell<'r>(&self, row: &'r Row, field: CanonicalField) -> Option<&'r Cell> {
        row.get(self.header_for(field))
    }

    /// Apply a `FIELD=HEADER` override as given on the command line.
    pub fn apply_override(&mut self, raw: &str) -> Result<(), PipelineError> {
        let (field, header) = raw
            .split_once('=')
            .ok_or_else(|| PipelineError::InvalidMappingOverride(raw.to_string()))?;
        let field = CanonicalField::parse(field)
            .ok_or_else(|| PipelineError::InvalidMappingOverride(raw.to_string()))?;
        let header = header.trim();
        if header.is_empty() {
            self.clear(field);
        } else {
            self.set(field, header);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingPreset {
    pub name: String,
    pub physical_mapping: FieldMapping,
    pub financial_mapping: FieldMapping,
}

impl MappingPreset {
    pub fn identity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physical_mapping: FeedSchema::physical().identity_mapping(),
            financial_mapping: FeedSchema::financial().identity_mapping(),
        }
    }
}

pub fn default_presets() -> Vec<MappingPreset> {
    vec![MappingPreset::identity(DEFAULT_PRESET_NAME)]
}

/// Replace any preset with the same name and append `preset` at the end.
pub fn upsert_preset(presets: &mut Vec<MappingPreset>, preset: MappingPreset) {
    presets.retain(|p| p.name != preset.name);
    presets.push(preset);
}

/// Put the default preset first when a stored list lacks it.
pub fn with_default_preset(mut presets: Vec<MappingPreset>) -> Vec<MappingPreset> {
    if find_preset(&presets, DEFAULT_PRESET_NAME).is_none() {
        presets.insert(0, MappingPreset::identity(DEFAULT_PRESET_NAME));
    }
    presets
}

pub fn find_preset<'a>(presets: &'a [MappingPreset], name: &str) -> Option<&'a MappingPreset> {
    presets.iter().find(|p| p.name == name)
}

/// Key-value storage for mapping presets. Core logic never touches storage
/// directly; the composing application hands presets in and out.
pub trait PresetStore {
    fn load(&self) -> Result<Vec<MappingPreset>, PipelineError>;
    fn save(&self, presets: &[MappingPreset]) -> Result<(), PipelineError>;
}

/// Presets persisted as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFilePresetStore {
    path: PathBuf,
}

impl JsonFilePresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PresetStore for JsonFilePresetStore {
    /// Never fails: a missing, unreadable or malformed file yields the
    /// defaults, and the default preset is always present.
    fn load(&self) -> Result<Vec<MappingPreset>, PipelineError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no preset file, using defaults");
            return Ok(default_presets());
        }
        let parsed = std::fs::read(&self.path)
            .map_err(PipelineError::from)
            .and_then(|bytes| Ok(serde_json::from_slice::<Vec<MappingPreset>>(&bytes)?));
        match parsed {
            Ok(presets) => Ok(with_default_preset(presets)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable preset file, using defaults");
                Ok(default_presets())
            }
        }
    }

    fn save(&self, presets: &[MappingPreset]) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(presets)?)?;
        Ok(())
    }
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug)]
pub struct MemoryPresetStore {
    presets: Mutex<Vec<MappingPreset>>,
}

impl Default for MemoryPresetStore {
    fn default() -> Self {
        Self {
            presets: Mutex::new(default_presets()),
        }
    }
}

impl PresetStore for MemoryPresetStore {
    fn load(&self) -> Result<Vec<MappingPreset>, PipelineError> {
        Ok(self
            .presets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, presets: &[MappingPreset]) -> Result<(), PipelineError> {
        *self.presets.lock().unwrap_or_else(PoisonError::into_inner) = presets.to_vec();
        Ok(())
    }
}
