use std::collections::{HashMap, HashSet};

use crate::model::DuplicateGroup;
use crate::normalize::name_key;

/// Desired names used by more than one directive.
#[derive(Debug, Clone, Default)]
pub struct DuplicateReport {
    keys: HashSet<String>,
    groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// True when `desired_name` (case-insensitive) belongs to a duplicate group.
    pub fn contains(&self, desired_name: &str) -> bool {
        name_key(desired_name).is_some_and(|k| self.keys.contains(&k))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups ordered by first occurrence in the input.
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        self.groups
    }
}

/// Find every desired name whose case-insensitive form occurs more than once.
///
/// Input is `(serial, desired_name)` pairs in input order. Blank names are
/// never compared.
pub fn find_duplicate_names<'a, I>(pairs: I) -> DuplicateReport
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    // key -> (first serial, count); order tracks first occurrence
    let mut seen: HashMap<String, (String, usize)> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (serial, name) in pairs {
        let Some(key) = name_key(name) else {
            continue;
        };
        match seen.get_mut(&key) {
            Some((_, count)) => *count += 1,
            None => {
                order.push(key.clone());
                seen.insert(key, (serial.to_string(), 1));
            }
        }
    }

    let mut keys = HashSet::new();
    let mut groups = Vec::new();
    for key in order {
        let (first_serial, count) = &seen[&key];
        if *count > 1 {
            groups.push(DuplicateGroup {
                name_key: key.clone(),
                first_serial: first_serial.clone(),
                count: *count,
            });
            keys.insert(key);
        }
    }

    DuplicateReport { keys, groups }
}
