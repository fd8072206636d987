use std::collections::HashMap;

use crate::action::UpdateAction;
use crate::classify::{classify, resolve_update, Plan};
use crate::config::ReconPolicy;
use crate::duplicates::{find_duplicate_names, DuplicateReport};
use crate::evidence::compute_summary;
use crate::model::{
    Decision, DirectiveSet, ReconMeta, ReconResult, RemoteDevice, ShadowedDevice,
};
use crate::normalize::normalize_serial;

/// Remote devices keyed by normalized serial. First device seen wins.
pub struct DeviceIndex<'a> {
    by_serial: HashMap<String, &'a RemoteDevice>,
    shadowed: Vec<ShadowedDevice>,
}

impl<'a> DeviceIndex<'a> {
    pub fn build(devices: &'a [RemoteDevice]) -> Self {
        let mut by_serial: HashMap<String, &'a RemoteDevice> = HashMap::with_capacity(devices.len());
        let mut shadowed = Vec::new();

        for device in devices {
            let key = normalize_serial(&device.serial_number);
            if key.is_empty() {
                continue;
            }
            match by_serial.get(&key) {
                Some(kept) => shadowed.push(ShadowedDevice {
                    serial_number: key,
                    kept_id: kept.id.clone(),
                    shadowed_id: device.id.clone(),
                }),
                None => {
                    by_serial.insert(key, device);
                }
            }
        }

        Self { by_serial, shadowed }
    }

    /// Look up by an already-normalized serial.
    pub fn get(&self, normalized_serial: &str) -> Option<&'a RemoteDevice> {
        self.by_serial.get(normalized_serial).copied()
    }

    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }

    /// Devices dropped from the index because an earlier device shared their serial.
    pub fn shadowed(&self) -> &[ShadowedDevice] {
        &self.shadowed
    }
}

/// The classification pass on its own, before any update is attempted.
pub struct ReconPlan<'a> {
    pub entries: Vec<Plan<'a>>,
    pub duplicates: DuplicateReport,
    pub shadowed: Vec<ShadowedDevice>,
}

impl ReconPlan<'_> {
    /// Number of directives that need a remote update.
    pub fn pending_updates(&self) -> usize {
        self.entries.iter().filter(|p| p.is_update()).count()
    }
}

/// Classify every directive without touching the remote directory.
///
/// The duplicate-name set is computed in full before any directive is
/// classified.
pub fn plan<'a>(
    devices: &'a [RemoteDevice],
    directives: &'a DirectiveSet,
    policy: &ReconPolicy,
) -> ReconPlan<'a> {
    let duplicates = find_duplicate_names(
        directives
            .iter()
            .map(|d| (d.serial_number.as_str(), d.desired_name.as_str())),
    );
    let index = DeviceIndex::build(devices);

    let entries = directives
        .iter()
        .map(|d| classify(d, index.get(&d.serial_number), &duplicates, policy))
        .collect();

    ReconPlan {
        entries,
        duplicates,
        shadowed: index.shadowed,
    }
}

/// Run reconciliation: classify every directive, then hand each pending
/// update to `action`. Returns one decision per directive, in input order.
pub fn run(
    devices: &[RemoteDevice],
    directives: &DirectiveSet,
    policy: &ReconPolicy,
    action: &mut dyn UpdateAction,
) -> ReconResult {
    let ReconPlan {
        entries,
        duplicates,
        shadowed,
    } = plan(devices, directives, policy);

    let decisions: Vec<Decision> = entries
        .into_iter()
        .map(|entry| match entry {
            Plan::Settled(decision) => decision,
            Plan::Update { directive, device } => {
                let outcome = action.apply_name(&device.id, &directive.desired_name);
                resolve_update(directive, device, outcome)
            }
        })
        .collect();

    let summary = compute_summary(&decisions);

    ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            force_update: policy.force_update,
            device_count: devices.len(),
            directive_count: directives.len(),
        },
        summary,
        decisions,
        duplicates: duplicates.into_groups(),
        shadowed,
    }
}
