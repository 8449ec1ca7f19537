use crate::config::ComplianceConfig;
use crate::detection::Detection;
use std::collections::HashSet;

/// Compliance verdict for one detected person within a single detection
/// cycle. `missing` follows the configured required-classes order so the
/// rendered status string is stable between cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonAssignment {
    pub person: Detection,
    pub found: HashSet<String>,
    pub missing: Vec<String>,
}

impl PersonAssignment {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Partitions detections into persons and PPE candidates by exact label-set
/// membership. Labels in neither set drop out of the matching entirely.
pub fn split_person_ppe(
    dets: &[Detection],
    cfg: &ComplianceConfig,
) -> (Vec<Detection>, Vec<Detection>) {
    let persons = dets
        .iter()
        .filter(|d| cfg.is_person(&d.canonical_label))
        .cloned()
        .collect();
    let ppes = dets
        .iter()
        .filter(|d| cfg.is_required(&d.canonical_label))
        .cloned()
        .collect();
    (persons, ppes)
}

/// For each person, claims every PPE candidate whose box lies inside the
/// padded person box by at least the containment threshold. A candidate may
/// satisfy several persons at once; there is no one-to-one assignment.
pub fn assign_ppe_to_persons(
    persons: &[Detection],
    ppe_candidates: &[Detection],
    cfg: &ComplianceConfig,
) -> Vec<PersonAssignment> {
    persons
        .iter()
        .map(|p| {
            let padded = p.bbox.pad(cfg.person_pad_px);
            let mut found = HashSet::new();
            for q in ppe_candidates {
                if q.bbox.containment_ratio(&padded) >= cfg.containment_threshold {
                    found.insert(q.canonical_label.clone());
                }
            }
            let missing = cfg
                .required_classes
                .iter()
                .filter(|c| !found.contains(*c))
                .cloned()
                .collect();
            PersonAssignment {
                person: p.clone(),
                found,
                missing,
            }
        })
        .collect()
}
