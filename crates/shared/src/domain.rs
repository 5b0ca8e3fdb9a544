use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locale::Locale;

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_newtype!(OvenId);
string_id_newtype!(ProgramId);
string_id_newtype!(FaultId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(pub i64);

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logged-in shop-floor worker as returned by the login action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub identifier: String,
    pub display_name: String,
}

impl Operator {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Prepared,
    Running,
    Idle,
    Finished,
    Deleted,
    /// Any status this client does not know about. Never active.
    #[serde(other)]
    Unknown,
}

impl ProcessStatus {
    /// Running and prepared processes pin the oven to a program.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Prepared)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvenProcess {
    pub id: String,
    pub status: ProcessStatus,
    pub hydra_batch: String,
    pub article: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

pub fn has_active_process(processes: &[OvenProcess]) -> bool {
    processes.iter().any(|process| process.status.is_active())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultReport {
    pub id: FaultId,
    pub oven: OvenId,
    pub fault_key: String,
    pub start_time: DateTime<Utc>,
    /// Operator identifiers in the order they were logged in when reporting.
    pub reported_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultType {
    pub key: String,
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

impl FaultType {
    pub fn label(&self, locale: Locale) -> &str {
        self.translations
            .get(locale.code())
            .or_else(|| self.translations.get(Locale::default().code()))
            .map(String::as_str)
            .unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPosition {
    pub position: u32,
    pub identifier: String,
    pub time: DateTime<Utc>,
    pub article_number: String,
    pub article_name: String,
    pub quantity: f64,
    pub unit: String,
    pub wip: bool,
    #[serde(default)]
    pub bin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<DateTime<Utc>>,
}

/// Number the next position on a card gets: one past the highest existing
/// number, or 1 for an empty card. Saturates at `u32::MAX`.
pub fn next_position_number(positions: &[CardPosition]) -> u32 {
    positions
        .iter()
        .map(|position| position.position)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub number: CardNumber,
    pub creators: Vec<String>,
    pub warehouse: String,
    pub sector: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub positions: Vec<CardPosition>,
}

impl CardSummary {
    pub fn positions_len(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn position(number: u32) -> CardPosition {
        CardPosition {
            position: number,
            identifier: "1001".into(),
            time: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            article_number: "A-1".into(),
            article_name: "Bolt".into(),
            quantity: 1.0,
            unit: "pcs".into(),
            wip: false,
            bin: String::new(),
            delivery_date: None,
        }
    }

    #[test]
    fn next_position_follows_highest_number() {
        assert_eq!(next_position_number(&[]), 1);
        assert_eq!(
            next_position_number(&[position(1), position(2), position(3)]),
            4
        );
        assert_eq!(next_position_number(&[position(5), position(2)]), 6);
        assert_eq!(next_position_number(&[position(u32::MAX)]), u32::MAX);
    }

    #[test]
    fn only_prepared_and_running_processes_are_active() {
        let process = |status| OvenProcess {
            id: "1".into(),
            status,
            hydra_batch: "HB-1".into(),
            article: "ART-1".into(),
            start_time: None,
        };
        assert!(has_active_process(&[
            process(ProcessStatus::Finished),
            process(ProcessStatus::Prepared)
        ]));
        assert!(has_active_process(&[process(ProcessStatus::Running)]));
        assert!(!has_active_process(&[
            process(ProcessStatus::Finished),
            process(ProcessStatus::Deleted)
        ]));
        assert!(!has_active_process(&[]));
    }

    #[test]
    fn fault_label_falls_back_to_polish_then_key() {
        let fault: FaultType = serde_json::from_str(
            r#"{"key":"overheat","translations":{"pl":"Przegrzanie","en":"Overheating"}}"#,
        )
        .expect("fault type");
        assert_eq!(fault.label(Locale::En), "Overheating");
        assert_eq!(fault.label(Locale::De), "Przegrzanie");

        let bare = FaultType {
            key: "door".into(),
            translations: BTreeMap::new(),
        };
        assert_eq!(bare.label(Locale::Uk), "door");
    }

    #[test]
    fn process_status_uses_snake_case_on_the_wire() {
        let status: ProcessStatus = serde_json::from_str("\"running\"").expect("status");
        assert_eq!(status, ProcessStatus::Running);
        let status: ProcessStatus = serde_json::from_str("\"idle\"").expect("idle");
        assert_eq!(status, ProcessStatus::Idle);
        assert_eq!(CardNumber(42).to_string(), "42");
    }

    #[test]
    fn unlisted_status_does_not_break_the_snapshot() {
        let processes: Vec<OvenProcess> = serde_json::from_str(
            r#"[
                {"id":"1","status":"cooling","hydraBatch":"HB-1","article":"ART-1"},
                {"id":"2","status":"running","hydraBatch":"HB-2","article":"ART-2",
                 "startTime":"2024-03-01T08:00:00Z"}
            ]"#,
        )
        .expect("processes");

        assert_eq!(processes[0].status, ProcessStatus::Unknown);
        assert!(!processes[0].status.is_active());
        assert!(!ProcessStatus::Idle.is_active());
        assert!(has_active_process(&processes));
    }

    #[test]
    fn records_use_camel_case_fields() {
        let fault: FaultReport = serde_json::from_str(
            r#"{"id":"f-1","oven":"oven-1","faultKey":"door",
                "startTime":"2024-03-01T08:00:00Z","reportedBy":["1001","1002"]}"#,
        )
        .expect("fault");
        assert_eq!(fault.fault_key, "door");
        assert_eq!(fault.reported_by, vec!["1001", "1002"]);
        assert_eq!(fault.fault_label, None);

        let encoded = serde_json::to_value(position(3)).expect("encode");
        assert_eq!(encoded["articleNumber"], "A-1");
        assert_eq!(encoded["articleName"], "Bolt");
    }
}
