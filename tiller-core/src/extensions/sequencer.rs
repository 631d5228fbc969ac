//! Dependency sequencer - computes a safe activation order
//!
//! Pure function over descriptors; no IO. If extension A declares a
//! dependency on extension B and both are present, B precedes A in the
//! returned order. Dependencies on ids that were never discovered are
//! ignored. A cycle is a fault naming the ids involved.

use std::collections::{BTreeMap, BTreeSet};
use tiller_extension_api::ExtensionDescriptor;

use super::error::ExtensionHostError;

/// Order descriptors so every present dependency activates before its
/// dependent (Kahn's algorithm). Ties between unrelated extensions are
/// broken by lexicographic id order, so the result is deterministic and
/// reproducible across runs and platforms.
pub fn activation_order(
    descriptors: &[ExtensionDescriptor],
) -> Result<Vec<String>, ExtensionHostError> {
    let present: BTreeSet<&str> = descriptors.iter().map(|d| d.id.as_str()).collect();

    // dependency -> dependents; indegree counts resolved dependencies
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();

    for descriptor in descriptors {
        indegree.entry(descriptor.id.as_str()).or_insert(0);
        for dep in &descriptor.dependencies {
            if !present.contains(dep.as_str()) {
                tracing::debug!(
                    extension = %descriptor.id,
                    dependency = %dep,
                    "Declared dependency is not present; ignoring for ordering"
                );
                continue;
            }
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(descriptor.id.as_str());
            *indegree.entry(descriptor.id.as_str()).or_insert(0) += 1;
        }
    }

    // BTreeSet keeps the ready pool lexicographically sorted
    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(descriptors.len());
    while let Some(id) = ready.pop_first() {
        order.push(id.to_string());
        if let Some(next) = dependents.get(id) {
            for dependent in next {
                let degree = indegree
                    .get_mut(dependent)
                    .expect("dependent was seeded in indegree map");
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() < descriptors.len() {
        let ids: Vec<String> = indegree
            .iter()
            .filter(|(id, _)| !order.iter().any(|o| o == *id))
            .map(|(id, _)| (*id).to_string())
            .collect();
        return Err(ExtensionHostError::DependencyCycle { ids });
    }

    Ok(order)
}
