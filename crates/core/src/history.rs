//! Per-step records of stock values.

use std::{fmt, sync::Arc};

/// The value of every stock at the end of one step, in insertion order.
///
/// Stock names are shared between snapshots taken while the set of stocks is
/// unchanged, so recording a step only copies the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl Snapshot {
    pub(crate) fn new(names: Arc<[String]>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Returns the recorded value for `name`.
    ///
    /// If several stocks share a name, the last one in insertion order wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.iter()
            .rev()
            .find_map(|(n, value)| (n == name).then_some(value))
    }

    /// Returns the number of entries, one per stock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the stock names in insertion order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the values in insertion order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Formats as `{name: value, ...}`.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Snapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Append-only sequence of snapshots, one per executed step.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub(crate) fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    /// Returns the number of recorded steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if no step has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Returns the snapshot recorded at `step` (zero-based).
    #[must_use]
    pub fn get(&self, step: usize) -> Option<&Snapshot> {
        self.snapshots.get(step)
    }

    /// Returns the most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Iterates over snapshots in step order.
    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    /// Returns one stock's value at every step.
    ///
    /// Steps where `name` was not recorded are `None`; the result is `None`
    /// only when no snapshot contains `name`.
    #[must_use]
    pub fn trajectory(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let values: Vec<_> = self.iter().map(|snapshot| snapshot.get(name)).collect();
        values.iter().any(Option::is_some).then_some(values)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Formats one `Step {i}: {name: value, ...}` line per recorded step.
impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (step, snapshot) in self.iter().enumerate() {
            writeln!(f, "Step {step}: {snapshot}")?;
        }
        Ok(())
    }
}
