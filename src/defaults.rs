//! Run defaults
//!
//! Default colour scale bounds per run, variable and operator, loaded from a
//! CSV file with the header `run,variable,operator,vmin,vmax`.
//! Empty `operator`, `vmin` or `vmax` fields are allowed.

use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

use serde::Deserialize;

use crate::reader::Operator;

#[derive(Debug, thiserror::Error)]
pub enum DefaultsError {
    #[error("failed to open the defaults file")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize the defaults CSV file")]
    Csv(#[from] csv::Error),
}
type Result<T> = std::result::Result<T, DefaultsError>;

#[derive(Deserialize, Debug)]
struct Record {
    run: String,
    variable: String,
    operator: Option<String>,
    vmin: Option<f64>,
    vmax: Option<f64>,
}

type Key = (String, String, Option<String>);

/// Table of the default colour scale bounds
#[derive(Debug, Default, Clone)]
pub struct RunDefaults(BTreeMap<Key, (Option<f64>, Option<f64>)>);
impl RunDefaults {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
        let mut this = Self::default();
        for result in rdr.deserialize() {
            let record: Record = result?;
            this.0.insert(
                (
                    record.run,
                    record.variable,
                    record.operator.filter(|op| !op.is_empty()),
                ),
                (record.vmin, record.vmax),
            );
        }
        log::debug!("{} run default(s) loaded", this.0.len());
        Ok(this)
    }
    /// Adds or replaces an entry
    pub fn insert(
        mut self,
        run: impl ToString,
        variable: impl ToString,
        operator: Option<Operator>,
        bounds: (Option<f64>, Option<f64>),
    ) -> Self {
        self.0.insert(
            (
                run.to_string(),
                variable.to_string(),
                operator.map(|op| op.to_string()),
            ),
            bounds,
        );
        self
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Default `(vmin, vmax)` of a variable for a given run
    pub fn lookup(
        &self,
        run: &str,
        variable: &str,
        operator: Option<Operator>,
    ) -> (Option<f64>, Option<f64>) {
        self.0
            .get(&(
                run.to_string(),
                variable.to_string(),
                operator.map(|op| op.to_string()),
            ))
            .cloned()
            .unwrap_or_default()
    }
}
