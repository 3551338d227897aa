//! Detection class policy
//!
//! Maps detector class ids to the actions configured for their labels. The
//! policy is immutable after construction; the id index is derived once from
//! the detector's vocabulary on first use and kept for the policy's lifetime.

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info};
use whisker_cns::Action;
use whisker_core::{ClassId, ConfigError, Detection, DetectionClass};
use whisker_eye::LabelMap;

/// Detector class id → configured class, restricted to the registry
#[derive(Debug, Clone, Default)]
pub struct ClassIdIndex {
    entries: HashMap<ClassId, usize>,
}

impl ClassIdIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, class_id: ClassId) -> bool {
        self.entries.contains_key(&class_id)
    }
}

pub struct DetectionClassPolicy {
    classes: Vec<DetectionClass>,
    labels: LabelMap,
    buzz_duration: Duration,
    index: OnceCell<ClassIdIndex>,
}

impl DetectionClassPolicy {
    /// Build from the ordered registry and the detector's full vocabulary
    ///
    /// Duplicate labels are rejected.
    pub fn new(
        classes: Vec<DetectionClass>,
        labels: &LabelMap,
        buzz_duration: Duration,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for class in &classes {
            class.validate()?;
            if !seen.insert(class.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate detection class label: '{}'",
                    class.label
                )));
            }
        }
        if buzz_duration.is_zero() {
            return Err(ConfigError::Invalid("Buzz duration must be non-zero".to_string()));
        }

        Ok(Self {
            classes,
            labels: labels.clone(),
            buzz_duration,
            index: OnceCell::new(),
        })
    }

    pub fn classes(&self) -> &[DetectionClass] {
        &self.classes
    }

    /// Class id index, computed on first call and cached
    ///
    /// Registry labels the detector does not know are dropped silently.
    pub fn resolve_index(&self) -> &ClassIdIndex {
        self.index.get_or_init(|| {
            let mut entries = HashMap::new();
            for (position, class) in self.classes.iter().enumerate() {
                match self.labels.get(&class.label) {
                    Some(id) => {
                        entries.insert(*id, position);
                    }
                    None => debug!("Class '{}' not in detector vocabulary, ignored", class.label),
                }
            }
            info!(
                "Resolved {} of {} detection classes against the detector",
                entries.len(),
                self.classes.len()
            );
            ClassIdIndex { entries }
        })
    }

    /// Configured class for a detector id, if the registry covers it
    pub fn class_for(&self, class_id: ClassId) -> Option<&DetectionClass> {
        self.resolve_index()
            .entries
            .get(&class_id)
            .map(|&position| &self.classes[position])
    }

    /// Actions for one frame's detections, in detection order
    ///
    /// A qualifying detection emits its buzz request first, then its color.
    /// When several classes set a color in one frame, the last one applied
    /// is what the indicator shows.
    pub fn actions_for(&self, detections: &[Detection]) -> Vec<Action> {
        let mut actions = Vec::new();
        for detection in detections {
            let Some(class) = self.class_for(detection.class_id) else {
                continue;
            };
            if !class.accepts(detection.confidence) {
                continue;
            }

            debug!(
                "Detected {} ({:.2} >= {:.2})",
                class.label, detection.confidence, class.confidence_threshold
            );
            if class.triggers_buzzer {
                actions.push(Action::PulseBuzzer(self.buzz_duration));
            }
            if let Some(color) = class.indicator_color {
                actions.push(Action::SetIndicator(color));
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use whisker_core::Color;
    use whisker_eye::detector::label_map_from_names;

    const BUZZ: Duration = Duration::from_millis(100);

    fn labels() -> LabelMap {
        label_map_from_names(&["person", "bicycle", "cat", "dog", "teddy bear"])
    }

    fn cat() -> DetectionClass {
        DetectionClass::new("cat", 0.5).with_color(Color::RED)
    }

    #[test]
    fn test_qualifying_detection_buzzes_then_colors() {
        let policy = DetectionClassPolicy::new(vec![cat()], &labels(), BUZZ).unwrap();
        let actions = policy.actions_for(&[Detection::new(ClassId(2), 0.7)]);
        assert_eq!(
            actions,
            vec![Action::PulseBuzzer(BUZZ), Action::SetIndicator(Color::RED)]
        );
    }

    #[test]
    fn test_below_threshold_emits_nothing() {
        let policy = DetectionClassPolicy::new(vec![cat()], &labels(), BUZZ).unwrap();
        assert!(policy.actions_for(&[Detection::new(ClassId(2), 0.3)]).is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = DetectionClassPolicy::new(vec![cat()], &labels(), BUZZ).unwrap();
        assert_eq!(policy.actions_for(&[Detection::new(ClassId(2), 0.5)]).len(), 2);
    }

    #[test]
    fn test_unknown_labels_are_dropped_from_index() {
        let classes = vec![cat(), DetectionClass::new("giraffe", 0.1)];
        let policy = DetectionClassPolicy::new(classes, &labels(), BUZZ).unwrap();
        let index = policy.resolve_index();
        assert_eq!(index.len(), 1);
        assert!(index.contains(ClassId(2)));
    }

    #[test]
    fn test_index_is_cached() {
        let policy = DetectionClassPolicy::new(vec![cat()], &labels(), BUZZ).unwrap();
        let first = policy.resolve_index() as *const ClassIdIndex;
        let second = policy.resolve_index() as *const ClassIdIndex;
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let classes = vec![cat(), DetectionClass::new("cat", 0.9)];
        assert!(DetectionClassPolicy::new(classes, &labels(), BUZZ).is_err());
    }

    #[test]
    fn test_zero_buzz_duration_rejected() {
        assert!(DetectionClassPolicy::new(vec![cat()], &labels(), Duration::ZERO).is_err());
    }

    #[test]
    fn test_last_color_in_frame_wins() {
        let classes = vec![
            DetectionClass::new("cat", 0.5).with_color(Color::BLUE).with_buzzer(false),
            DetectionClass::new("dog", 0.5).with_color(Color::GREEN).with_buzzer(false),
        ];
        let policy = DetectionClassPolicy::new(classes, &labels(), BUZZ).unwrap();
        let actions = policy.actions_for(&[
            Detection::new(ClassId(2), 0.9),
            Detection::new(ClassId(3), 0.9),
        ]);
        assert_eq!(actions.last(), Some(&Action::SetIndicator(Color::GREEN)));
    }

    #[test]
    fn test_each_detection_acts_independently() {
        let policy = DetectionClassPolicy::new(vec![cat()], &labels(), BUZZ).unwrap();
        let actions = policy.actions_for(&[
            Detection::new(ClassId(2), 0.8),
            Detection::new(ClassId(2), 0.6),
        ]);
        assert_eq!(actions.len(), 4);
    }

    #[test]
    fn test_suppress_class_emits_nothing() {
        let person = DetectionClass::new("person", 0.8).with_buzzer(false);
        let policy = DetectionClassPolicy::new(vec![person], &labels(), BUZZ).unwrap();
        assert!(policy.actions_for(&[Detection::new(ClassId(0), 0.99)]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_below_threshold_never_acts(threshold in 0.0f32..=1.0, gap in 0.0001f32..1.0) {
            let confidence = threshold - gap;
            prop_assume!(confidence >= 0.0);
            let class = DetectionClass::new("cat", threshold).with_color(Color::RED);
            let policy = DetectionClassPolicy::new(vec![class], &labels(), BUZZ).unwrap();
            prop_assert!(policy.actions_for(&[Detection::new(ClassId(2), confidence)]).is_empty());
        }

        #[test]
        fn prop_unregistered_ids_never_act(id in 0usize..1000, confidence in 0.0f32..=1.0) {
            prop_assume!(id != 2);
            let policy = DetectionClassPolicy::new(vec![cat()], &labels(), BUZZ).unwrap();
            prop_assert!(policy.actions_for(&[Detection::new(ClassId(id), confidence)]).is_empty());
        }
    }
}
