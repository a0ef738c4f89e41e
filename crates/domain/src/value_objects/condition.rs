//! Actor condition identifiers and the legacy status icon table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean conditions tracked under `data.conditions.<id>.value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionId {
    CriticalWounds,
    Unconscious,
    Dying,
    Dead,
    Prone,
    TempoInsane,
    IndefInsane,
}

impl ConditionId {
    /// Every condition, in the order the legacy status block listed them.
    pub const ALL: [ConditionId; 7] = [
        ConditionId::CriticalWounds,
        ConditionId::Unconscious,
        ConditionId::Dying,
        ConditionId::Dead,
        ConditionId::Prone,
        ConditionId::TempoInsane,
        ConditionId::IndefInsane,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionId::CriticalWounds => "criticalWounds",
            ConditionId::Unconscious => "unconscious",
            ConditionId::Dying => "dying",
            ConditionId::Dead => "dead",
            ConditionId::Prone => "prone",
            ConditionId::TempoInsane => "tempoInsane",
            ConditionId::IndefInsane => "indefInsane",
        }
    }

    /// Path of the condition flag in actor data.
    pub fn value_path(&self) -> String {
        format!("data.conditions.{}.value", self.as_str())
    }

    /// Path of the legacy status flag in actor data.
    pub fn legacy_status_path(&self) -> String {
        format!("data.status.{}.value", self.as_str())
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Icon file stems used by legacy status effects, and the condition each one
/// stands for. Matched against `/<stem>.` in an effect icon path.
pub const STATUS_ICON_CONDITIONS: &[(&str, ConditionId)] = &[
    ("hanging-spider", ConditionId::TempoInsane),
    ("tentacles-skull", ConditionId::IndefInsane),
    ("arm-sling", ConditionId::CriticalWounds),
    ("heart-beats", ConditionId::Dying),
    ("tombstone", ConditionId::Dead),
    ("knocked-out-stars", ConditionId::Unconscious),
    ("falling", ConditionId::Prone),
    ("skull", ConditionId::Dead),
    ("unconscious", ConditionId::Unconscious),
];

/// Condition for an icon stem from [`STATUS_ICON_CONDITIONS`].
pub fn condition_for_icon_stem(stem: &str) -> Option<ConditionId> {
    STATUS_ICON_CONDITIONS
        .iter()
        .find(|(candidate, _)| *candidate == stem)
        .map(|(_, condition)| *condition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_path() {
        assert_eq!(ConditionId::TempoInsane.value_path(), "data.conditions.tempoInsane.value");
        assert_eq!(ConditionId::Dying.legacy_status_path(), "data.status.dying.value");
    }

    #[test]
    fn test_icon_stems_map_to_conditions() {
        assert_eq!(condition_for_icon_stem("heart-beats"), Some(ConditionId::Dying));
        assert_eq!(condition_for_icon_stem("skull"), Some(ConditionId::Dead));
        assert_eq!(condition_for_icon_stem("tombstone"), Some(ConditionId::Dead));
        assert_eq!(condition_for_icon_stem("bandage"), None);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        assert_eq!(
            serde_json::to_string(&ConditionId::CriticalWounds).unwrap(),
            "\"criticalWounds\""
        );
    }
}
