use crate::config::ComplianceConfig;
use crate::geometry::PixelBox;
use crate::labels::normalize;

/// One row of raw detector output, in the frame's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: i64,
}

/// A parsed, confidence-filtered detection. `raw_label` is kept for
/// display; all matching logic runs on `canonical_label`.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub raw_label: String,
    pub canonical_label: String,
    pub bbox: PixelBox,
    pub confidence: f32,
}

/// Converts raw detector output into `Detection` records. Entries below the
/// configured confidence threshold are dropped silently; the rest come out
/// in input order. A class id outside the label table gets a placeholder
/// label rather than failing the whole batch.
pub fn parse_detections(
    raw: &[RawDetection],
    class_names: &[String],
    cfg: &ComplianceConfig,
) -> Vec<Detection> {
    raw.iter()
        .filter(|r| r.confidence >= cfg.confidence_threshold)
        .map(|r| {
            let raw_label = match usize::try_from(r.class_id)
                .ok()
                .and_then(|id| class_names.get(id))
            {
                Some(name) => name.clone(),
                None => {
                    tracing::warn!("Detection with unknown class id {}", r.class_id);
                    format!("unknown class {}", r.class_id)
                }
            };
            let canonical_label = normalize(&raw_label, &cfg.class_synonyms);
            Detection {
                raw_label,
                canonical_label,
                bbox: PixelBox::new(r.x1 as i32, r.y1 as i32, r.x2 as i32, r.y2 as i32),
                confidence: r.confidence,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn config() -> ComplianceConfig {
        ComplianceConfig {
            confidence_threshold: 0.5,
            containment_threshold: 0.5,
            person_pad_px: 10,
            person_aliases: HashSet::from(["person".to_string(), "human".to_string()]),
            required_classes: vec!["mask".to_string()],
            class_synonyms: HashMap::from([(
                "ppe_overall".to_string(),
                "ppe_coverall".to_string(),
            )]),
        }
    }

    fn class_names() -> Vec<String> {
        vec!["mask".to_string(), "person".to_string(), "glove".to_string()]
    }

    fn raw(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: i64) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
        }
    }

    #[test]
    fn test_low_confidence_filtered() {
        let input = vec![
            raw(10.0, 20.0, 30.0, 40.0, 0.8, 0),
            raw(50.0, 60.0, 70.0, 80.0, 0.3, 1),
            raw(90.0, 100.0, 110.0, 120.0, 0.9, 2),
        ];
        let dets = parse_detections(&input, &class_names(), &config());

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].raw_label, "mask");
        assert_eq!(dets[0].canonical_label, "mask");
        assert_eq!(dets[0].bbox, PixelBox::new(10, 20, 30, 40));
        assert_eq!(dets[0].confidence, 0.8);
        assert_eq!(dets[1].raw_label, "glove");
        assert_eq!(dets[1].bbox, PixelBox::new(90, 100, 110, 120));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let input = vec![raw(0.0, 0.0, 10.0, 10.0, 0.5, 0)];
        let dets = parse_detections(&input, &class_names(), &config());
        assert_eq!(dets.len(), 1);
    }

    #[test]
    fn test_input_order_preserved() {
        let input = vec![
            raw(0.0, 0.0, 1.0, 1.0, 0.9, 2),
            raw(0.0, 0.0, 1.0, 1.0, 0.6, 0),
            raw(0.0, 0.0, 1.0, 1.0, 0.99, 1),
        ];
        let dets = parse_detections(&input, &class_names(), &config());
        let labels: Vec<&str> = dets.iter().map(|d| d.raw_label.as_str()).collect();
        assert_eq!(labels, vec!["glove", "mask", "person"]);
    }

    #[test]
    fn test_labels_normalized() {
        let names = vec!["PPE_OVERALL".to_string()];
        let input = vec![raw(0.0, 0.0, 5.0, 5.0, 0.9, 0)];
        let dets = parse_detections(&input, &names, &config());
        assert_eq!(dets[0].raw_label, "PPE_OVERALL");
        assert_eq!(dets[0].canonical_label, "ppe_coverall");
    }

    #[test]
    fn test_unknown_class_id() {
        let input = vec![raw(0.0, 0.0, 5.0, 5.0, 0.9, 42), raw(0.0, 0.0, 5.0, 5.0, 0.9, -1)];
        let dets = parse_detections(&input, &class_names(), &config());
        assert_eq!(dets[0].raw_label, "unknown class 42");
        assert_eq!(dets[1].raw_label, "unknown class -1");
    }

    #[test]
    fn test_coordinates_truncated_to_pixels() {
        let input = vec![raw(10.7, 20.2, 30.9, 40.1, 0.9, 0)];
        let dets = parse_detections(&input, &class_names(), &config());
        assert_eq!(dets[0].bbox, PixelBox::new(10, 20, 30, 40));
    }
}
