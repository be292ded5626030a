use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use log::*;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VariableError {
    #[error("could not read variables: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct VariableRecord {
    name: String,
    value: String,
}

/// A snapshot of the named string values that `$Name` references resolve to.
///
/// The snapshot is owned by whoever drives the dialogue; the compiler only
/// reads it. Entries iterate in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GlobalVariables {
    values: BTreeMap<String, String>,
}

impl GlobalVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads variables from CSV with a `name,value` header row.
    pub fn from_csv_path(path: &Path) -> Result<Self, VariableError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_records(reader)
    }

    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, VariableError> {
        Self::from_records(csv::Reader::from_reader(reader))
    }

    fn from_records<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, VariableError> {
        let mut variables = Self::new();
        for record in reader.deserialize() {
            let record: VariableRecord = record?;
            if let Some(previous) = variables.set(record.name.clone(), record.value) {
                warn!("Variable \"{}\" is defined more than once, replacing \"{}\"", record.name, previous);
            }
        }
        debug!("Loaded {} global variables", variables.len());
        Ok(variables)
    }

    /// Sets a variable, returning its previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for GlobalVariables {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> std::iter::FromIterator<(K, V)> for GlobalVariables {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut variables = Self::new();
        variables.extend(iter);
        variables
    }
}
