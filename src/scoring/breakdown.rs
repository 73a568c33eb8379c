use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::signals::types::SignalType;

/// Summed contribution per signal type, in the order each type was first seen.
///
/// Serialized as a JSON object; deserialization keeps document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakdown {
    entries: Vec<(SignalType, f64)>,
}

impl Breakdown {
    pub fn add(&mut self, signal_type: &SignalType, value: f64) {
        match self.entries.iter_mut().find(|(t, _)| t == signal_type) {
            Some((_, total)) => *total += value,
            None => self.entries.push((signal_type.clone(), value)),
        }
    }

    pub fn get(&self, signal_type: &SignalType) -> Option<f64> {
        self.entries
            .iter()
            .find(|(t, _)| t == signal_type)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SignalType, f64)> {
        self.entries.iter().map(|(t, v)| (t, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    /// The `n` largest contributors. Ties keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<(&SignalType, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (signal_type, value) in &self.entries {
            map.serialize_entry(signal_type.as_str(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Breakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = Breakdown;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of signal type to contribution")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Breakdown, A::Error> {
                let mut breakdown = Breakdown::default();
                while let Some((key, value)) = access.next_entry::<String, f64>()? {
                    breakdown.add(&SignalType::from(key), value);
                }
                Ok(breakdown)
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}
