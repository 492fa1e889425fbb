//! Parameter sets, the completion policy and the apply policies

use chrono::NaiveDateTime;
use report_engine::ReportDocument;
use report_types::{CellValue, ParameterKind, ParameterSlot};

use crate::error::ReportError;

/// Slot name that defaults to a truthy value instead of its kind's default
pub const LETTER_HEAD: &str = "Letter head";

/// Named parameter values in caller order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, CellValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any value already set under `name`
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a caller's JSON object. Strings stay text; the slot kind
    /// decides whether one becomes a date.
    pub fn from_json(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        object
            .iter()
            .map(|(name, value)| (name.clone(), CellValue::from_json_literal(value)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut set = ParameterSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

/// The value a free slot receives when the caller does not supply one
pub fn policy_default(slot: &ParameterSlot, now: NaiveDateTime) -> CellValue {
    if slot.name.eq_ignore_ascii_case(LETTER_HEAD) {
        return match slot.kind {
            ParameterKind::Boolean => CellValue::Boolean(true),
            ParameterKind::Text => CellValue::from("True"),
            ParameterKind::Number => CellValue::Integer(1),
            ParameterKind::Date => CellValue::Date(now),
        };
    }

    match slot.kind {
        ParameterKind::Text => CellValue::from(""),
        ParameterKind::Number => CellValue::Integer(0),
        ParameterKind::Date => CellValue::Date(now),
        ParameterKind::Boolean => CellValue::Boolean(false),
    }
}

/// The caller's parameters plus a policy default for every free slot the
/// caller left out. Linked slots are never defaulted.
pub fn complete_parameters(
    slots: &[ParameterSlot],
    supplied: ParameterSet,
    now: NaiveDateTime,
) -> ParameterSet {
    let mut completed = supplied;
    for slot in slots {
        if slot.is_linked() || completed.contains(&slot.name) {
            continue;
        }
        let value = policy_default(slot, now);
        tracing::debug!(parameter = %slot.name, value = %value, "Defaulted parameter");
        completed.insert(slot.name.clone(), value);
    }
    completed
}

/// How failures to apply a single parameter are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPolicy {
    /// The first failure aborts the pipeline
    FailFast,
    /// Failures are logged and skipped
    BestEffort,
}

/// Apply every parameter to a document. Returns the number applied.
pub fn apply_parameters<D: ReportDocument>(
    document: &mut D,
    parameters: &ParameterSet,
    policy: ApplyPolicy,
) -> Result<usize, ReportError> {
    let mut applied = 0;
    for (name, value) in parameters.iter() {
        match document.set_parameter(name, value) {
            Ok(()) => applied += 1,
            Err(source) => match policy {
                ApplyPolicy::FailFast => {
                    return Err(ReportError::ParameterApplication {
                        name: name.to_string(),
                        source,
                    })
                }
                ApplyPolicy::BestEffort => {
                    tracing::warn!(
                        report = %document.name(),
                        parameter = %name,
                        "Skipping parameter: {}",
                        source
                    );
                }
            },
        }
    }
    Ok(applied)
}
