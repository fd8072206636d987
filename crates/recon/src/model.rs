use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_serial;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A device identity as recorded by the provisioning directory.
///
/// Only `id`, `serial_number` and `current_name` take part in
/// classification. The remaining fields are carried for `export`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDevice {
    pub id: String,
    pub serial_number: String,
    pub current_name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub group_tag: String,
    #[serde(default)]
    pub enrollment_state: String,
    #[serde(default)]
    pub last_contacted: String,
}

impl RemoteDevice {
    pub fn new(
        id: impl Into<String>,
        serial_number: impl Into<String>,
        current_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            serial_number: serial_number.into(),
            current_name: current_name.into(),
            ..Self::default()
        }
    }
}

/// One desired-name request. `serial_number` is already normalized and
/// `desired_name` already trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub serial_number: String,
    pub desired_name: String,
}

/// Result of inserting a row into a [`DirectiveSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Added,
    /// Serial already present; the desired name was overwritten in place.
    Replaced,
    /// Blank serial or blank name; nothing stored.
    Skipped,
}

/// Directives keyed by normalized serial, in first-insertion order.
///
/// Last write wins on a repeated serial, but the directive keeps the
/// position of its first occurrence so output order stays stable.
#[derive(Debug, Clone, Default)]
pub struct DirectiveSet {
    entries: Vec<Directive>,
    index: HashMap<String, usize>,
}

impl DirectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, serial: &str, desired_name: &str) -> Insert {
        let serial = normalize_serial(serial);
        let desired_name = desired_name.trim();
        if serial.is_empty() || desired_name.is_empty() {
            return Insert::Skipped;
        }

        if let Some(&pos) = self.index.get(&serial) {
            self.entries[pos].desired_name = desired_name.to_string();
            return Insert::Replaced;
        }

        self.index.insert(serial.clone(), self.entries.len());
        self.entries.push(Directive {
            serial_number: serial,
            desired_name: desired_name.to_string(),
        });
        Insert::Added
    }

    /// Look up by serial (normalized on the way in).
    pub fn get(&self, serial: &str) -> Option<&Directive> {
        self.index
            .get(&normalize_serial(serial))
            .map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.entries.iter()
    }
}

impl<S: AsRef<str>, N: AsRef<str>> FromIterator<(S, N)> for DirectiveSet {
    fn from_iter<I: IntoIterator<Item = (S, N)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (serial, name) in iter {
            set.insert(serial.as_ref(), name.as_ref());
        }
        set
    }
}

impl<'a> IntoIterator for &'a DirectiveSet {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Update action outcome
// ---------------------------------------------------------------------------

/// What the action executor reports for one attempted update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// Simulate-only mode, or the operator declined to confirm.
    NotApplied,
    /// Transport or remote error, message kept verbatim.
    Failed(String),
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DecisionStatus {
    DuplicateName,
    NoDeviceFound,
    AlreadyNamed,
    NoChange,
    Updated,
    Simulated,
    Failed,
}

impl DecisionStatus {
    /// All statuses in report order.
    pub const ALL: [DecisionStatus; 7] = [
        Self::DuplicateName,
        Self::NoDeviceFound,
        Self::AlreadyNamed,
        Self::NoChange,
        Self::Updated,
        Self::Simulated,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateName => "DuplicateName",
            Self::NoDeviceFound => "NoDeviceFound",
            Self::AlreadyNamed => "AlreadyNamed",
            Self::NoChange => "NoChange",
            Self::Updated => "Updated",
            Self::Simulated => "Simulated",
            Self::Failed => "Failed",
        }
    }

    /// True for statuses that required a remote update attempt.
    pub fn attempted_update(&self) -> bool {
        matches!(self, Self::Updated | Self::Simulated | Self::Failed)
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's classification of one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub serial_number: String,
    pub desired_name: String,
    pub status: DecisionStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total: usize,
    pub duplicate_name: usize,
    pub no_device_found: usize,
    pub already_named: usize,
    pub no_change: usize,
    pub updated: usize,
    pub simulated: usize,
    pub failed: usize,
}

impl ReconSummary {
    pub fn count(&self, status: DecisionStatus) -> usize {
        match status {
            DecisionStatus::DuplicateName => self.duplicate_name,
            DecisionStatus::NoDeviceFound => self.no_device_found,
            DecisionStatus::AlreadyNamed => self.already_named,
            DecisionStatus::NoChange => self.no_change,
            DecisionStatus::Updated => self.updated,
            DecisionStatus::Simulated => self.simulated,
            DecisionStatus::Failed => self.failed,
        }
    }
}

/// A desired name shared (case-insensitively) by more than one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub name_key: String,
    /// Serial of the first directive using this name, in input order.
    pub first_serial: String,
    pub count: usize,
}

/// A remote device hidden behind an earlier device with the same serial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowedDevice {
    pub serial_number: String,
    pub kept_id: String,
    pub shadowed_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub decisions: Vec<Decision>,
    pub duplicates: Vec<DuplicateGroup>,
    pub shadowed: Vec<ShadowedDevice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub force_update: bool,
    pub device_count: usize,
    pub directive_count: usize,
}
