//! Snapshot readers
//!
//! A [DataReader] gives access to the scalar parameters and to the per-cell
//! variables of a simulation snapshot.
//! The per-cell values are returned in the order they are stored in the
//! snapshot, the `CellID` variable gives the cell each value belongs to.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

use npyz::npz::NpzArchive;
use strum_macros::{Display, EnumString};

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("failed to open snapshot {1:?}")]
    Open(#[source] io::Error, PathBuf),
    #[error("failed to read array {1:?}")]
    Read(#[source] io::Error, String),
    #[error("variable {0:?} not found")]
    MissingVariable(String),
    #[error("array {name:?} has unsupported shape {shape:?}")]
    Shape { name: String, shape: Vec<u64> },
    #[error("operator `{operator}` cannot be applied to {name:?} ({components} component(s))")]
    Operator {
        name: String,
        operator: Operator,
        components: usize,
    },
    #[error("cell data has {values} values, not a multiple of {components} component(s)")]
    Components { values: usize, components: usize },
}
type Result<T> = std::result::Result<T, ReaderError>;

/// Reduction applied to a variable at reading time
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Operator {
    #[strum(serialize = "x")]
    X,
    #[strum(serialize = "y")]
    Y,
    #[strum(serialize = "z")]
    Z,
    #[strum(serialize = "magnitude")]
    Magnitude,
}
impl Operator {
    /// Index of the vector component selected by the operator
    pub fn component(&self) -> Option<usize> {
        match self {
            Operator::X => Some(0),
            Operator::Y => Some(1),
            Operator::Z => Some(2),
            Operator::Magnitude => None,
        }
    }
}

/// Per-cell values of a variable
///
/// `values` holds `components` consecutive values per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    components: usize,
    values: Vec<f64>,
}
impl CellData {
    /// One value per cell
    pub fn scalar(values: Vec<f64>) -> Self {
        Self {
            components: 1,
            values,
        }
    }
    /// `components` values per cell
    pub fn vector(values: Vec<f64>, components: usize) -> Result<Self> {
        if components == 0 || values.len() % components != 0 {
            return Err(ReaderError::Components {
                values: values.len(),
                components,
            });
        }
        Ok(Self { components, values })
    }
    /// Builds vector data from per-cell arrays
    pub fn from_vectors<const N: usize>(vectors: &[[f64; N]]) -> Self {
        Self {
            components: N,
            values: vectors.iter().flatten().cloned().collect(),
        }
    }
    /// Number of cells
    pub fn len(&self) -> usize {
        self.values.len() / self.components
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn components(&self) -> usize {
        self.components
    }
    pub fn is_scalar(&self) -> bool {
        self.components == 1
    }
    pub fn values(&self) -> &[f64] {
        &self.values
    }
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
    /// Values of the cell at index `i`
    pub fn cell(&self, i: usize) -> &[f64] {
        &self.values[i * self.components..(i + 1) * self.components]
    }
    /// Iterator over the cells values
    pub fn cells(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.components)
    }
    /// Euclidean norm over the components of each cell
    pub fn magnitude(&self) -> Self {
        Self::scalar(
            self.cells()
                .map(|v| v.iter().map(|x| x * x).sum::<f64>().sqrt())
                .collect(),
        )
    }
    /// Component `k` of each cell
    pub fn component(&self, k: usize) -> Option<Self> {
        (k < self.components).then(|| Self::scalar(self.cells().map(|v| v[k]).collect()))
    }
    /// Cell by cell ratio of two scalar variables
    pub fn ratio(&self, other: &Self) -> Option<Self> {
        (self.is_scalar() && other.is_scalar() && self.len() == other.len()).then(|| {
            Self::scalar(
                self.values
                    .iter()
                    .zip(other.values.iter())
                    .map(|(a, b)| a / b)
                    .collect(),
            )
        })
    }
}

/// Interface to a simulation snapshot
pub trait DataReader {
    /// Returns the value of a scalar parameter, if present
    fn read_parameter(&mut self, name: &str) -> Option<f64>;
    /// Returns the raw per-cell values of a variable
    fn read_raw(&mut self, name: &str) -> Result<CellData>;
    /// Returns the per-cell values of a variable reduced by `operator`
    fn read_variable(&mut self, name: &str, operator: Option<Operator>) -> Result<CellData> {
        let data = self.read_raw(name)?;
        match operator {
            None => Ok(data),
            Some(Operator::Magnitude) => Ok(data.magnitude()),
            Some(op) => {
                let components = data.components();
                op.component()
                    .and_then(|k| data.component(k))
                    .ok_or_else(|| ReaderError::Operator {
                        name: name.to_string(),
                        operator: op,
                        components,
                    })
            }
        }
    }
    /// Returns the cell identifiers, in storage order
    fn cell_ids(&mut self) -> Result<Vec<u64>> {
        Ok(self
            .read_raw("CellID")?
            .into_values()
            .into_iter()
            .map(|id| id as u64)
            .collect())
    }
}
impl<R: DataReader + ?Sized> DataReader for Box<R> {
    fn read_parameter(&mut self, name: &str) -> Option<f64> {
        (**self).read_parameter(name)
    }
    fn read_raw(&mut self, name: &str) -> Result<CellData> {
        (**self).read_raw(name)
    }
    fn cell_ids(&mut self) -> Result<Vec<u64>> {
        (**self).cell_ids()
    }
}

/// Snapshot saved as a numpy `.npz` archive
///
/// Parameters are arrays with a single element, scalar variables are 1D
/// arrays with one value per cell and vector variables are 2D arrays of shape
/// `[cells, components]`.
pub struct NpzReader {
    path: PathBuf,
    archive: NpzArchive<BufReader<File>>,
}
impl NpzReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let archive =
            NpzArchive::open(&path).map_err(|e| ReaderError::Open(e, path.clone()))?;
        log::info!("Opened snapshot {:?}", path);
        Ok(Self { path, archive })
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    fn npy(&mut self, name: &str) -> Result<npyz::NpyFile<impl Read + '_>> {
        self.archive
            .by_name(name)
            .map_err(|e| ReaderError::Read(e, name.to_string()))?
            .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))
    }
    fn convert<T>(&mut self, name: &str) -> Result<Option<Vec<f64>>>
    where
        T: npyz::Deserialize + Into<f64>,
    {
        Ok(self
            .npy(name)?
            .into_vec::<T>()
            .ok()
            .map(|values| values.into_iter().map(Into::into).collect()))
    }
    /// Reads an array as `f64`, whatever the numeric type it is stored with
    fn array(&mut self, name: &str) -> Result<(Vec<u64>, Vec<f64>)> {
        let shape = self.npy(name)?.shape().to_vec();
        let values = if let Some(values) = self.convert::<f64>(name)? {
            values
        } else if let Some(values) = self.convert::<f32>(name)? {
            values
        } else if let Some(values) = self.convert::<i32>(name)? {
            values
        } else if let Some(values) = self.convert::<u32>(name)? {
            values
        } else {
            let signed = self.npy(name)?.into_vec::<i64>().ok();
            match signed {
                Some(values) => values.into_iter().map(|x| x as f64).collect(),
                None => self
                    .npy(name)?
                    .into_vec::<u64>()
                    .map_err(|e| ReaderError::Read(e, name.to_string()))?
                    .into_iter()
                    .map(|x| x as f64)
                    .collect(),
            }
        };
        Ok((shape, values))
    }
}
impl DataReader for NpzReader {
    fn read_parameter(&mut self, name: &str) -> Option<f64> {
        match self.array(name) {
            Ok((_, values)) if values.len() == 1 => Some(values[0]),
            Ok((shape, _)) => {
                log::debug!("{:?} is not a parameter (shape {:?})", name, shape);
                None
            }
            Err(e) => {
                log::debug!("parameter {:?} unavailable: {}", name, e);
                None
            }
        }
    }
    fn read_raw(&mut self, name: &str) -> Result<CellData> {
        let (shape, values) = self.array(name)?;
        match shape.as_slice() {
            [_] => Ok(CellData::scalar(values)),
            [_, n] => CellData::vector(values, *n as usize),
            _ => Err(ReaderError::Shape {
                name: name.to_string(),
                shape,
            }),
        }
    }
    fn cell_ids(&mut self) -> Result<Vec<u64>> {
        let ids = self.npy("CellID")?.into_vec::<u64>().ok();
        match ids {
            Some(ids) => Ok(ids),
            None => Ok(self
                .read_raw("CellID")?
                .into_values()
                .into_iter()
                .map(|id| id as u64)
                .collect()),
        }
    }
}

/// Snapshot held in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    parameters: BTreeMap<String, f64>,
    variables: BTreeMap<String, CellData>,
}
impl MemoryReader {
    pub fn parameter(mut self, name: impl ToString, value: f64) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
    pub fn variable(mut self, name: impl ToString, data: CellData) -> Self {
        self.variables.insert(name.to_string(), data);
        self
    }
}
impl DataReader for MemoryReader {
    fn read_parameter(&mut self, name: &str) -> Option<f64> {
        self.parameters.get(name).cloned()
    }
    fn read_raw(&mut self, name: &str) -> Result<CellData> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> MemoryReader {
        MemoryReader::default()
            .parameter("time", 12.5)
            .variable("rho", CellData::scalar(vec![1., 2., 3.]))
            .variable(
                "B",
                CellData::from_vectors(&[[3., 4., 0.], [0., 0., -2.], [1., 2., 2.]]),
            )
    }

    #[test]
    fn operator_names() {
        assert_eq!("x".parse::<Operator>().unwrap(), Operator::X);
        assert_eq!("magnitude".parse::<Operator>().unwrap(), Operator::Magnitude);
        assert!("w".parse::<Operator>().is_err());
        assert_eq!(Operator::Z.to_string(), "z");
    }

    #[test]
    fn vector_reductions() {
        let mut rdr = reader();
        let b = rdr.read_variable("B", Some(Operator::Magnitude)).unwrap();
        assert_eq!(b.values(), &[5., 2., 3.]);
        let bz = rdr.read_variable("B", Some(Operator::Z)).unwrap();
        assert_eq!(bz.values(), &[0., -2., 2.]);
    }

    #[test]
    fn component_of_scalar() {
        let mut rdr = reader();
        assert!(matches!(
            rdr.read_variable("rho", Some(Operator::Y)),
            Err(ReaderError::Operator { components: 1, .. })
        ));
    }

    #[test]
    fn default_cell_ids() {
        let mut rdr = reader().variable("CellID", CellData::scalar(vec![3., 1., 2.]));
        assert_eq!(rdr.cell_ids().unwrap(), vec![3, 1, 2]);
        assert_eq!(rdr.read_parameter("time"), Some(12.5));
        assert_eq!(rdr.read_parameter("t"), None);
    }

    #[test]
    fn ragged_vector() {
        assert!(CellData::vector(vec![1., 2., 3., 4.], 3).is_err());
    }

    #[test]
    fn npz_snapshot() {
        use npyz::{npz::NpzWriter, WriterBuilder};

        let path = std::env::temp_dir().join(format!("plot-panel-{}.npz", std::process::id()));
        {
            let mut npz = NpzWriter::create(&path).unwrap();
            let mut time = npz
                .array::<f64>("time", Default::default())
                .unwrap()
                .default_dtype()
                .shape(&[1])
                .begin_nd()
                .unwrap();
            time.push(&250.).unwrap();
            time.finish().unwrap();
            let mut xcells = npz
                .array::<i64>("xcells_ini", Default::default())
                .unwrap()
                .default_dtype()
                .shape(&[1])
                .begin_nd()
                .unwrap();
            xcells.push(&2).unwrap();
            xcells.finish().unwrap();
            let mut ids = npz
                .array::<u64>("CellID", Default::default())
                .unwrap()
                .default_dtype()
                .shape(&[2])
                .begin_nd()
                .unwrap();
            ids.extend(vec![2, 1]).unwrap();
            ids.finish().unwrap();
            let mut rho = npz
                .array::<f32>("rho", Default::default())
                .unwrap()
                .default_dtype()
                .shape(&[2])
                .begin_nd()
                .unwrap();
            rho.extend(vec![1.5f32, 2.5]).unwrap();
            rho.finish().unwrap();
            let mut b = npz
                .array::<f64>("B", Default::default())
                .unwrap()
                .default_dtype()
                .shape(&[2, 3])
                .begin_nd()
                .unwrap();
            b.extend(vec![3., 4., 0., 0., 0., -1.]).unwrap();
            b.finish().unwrap();
        }

        let mut rdr = NpzReader::open(&path).unwrap();
        assert_eq!(rdr.path(), path.as_path());
        assert_eq!(rdr.read_parameter("time"), Some(250.));
        assert_eq!(rdr.read_parameter("xcells_ini"), Some(2.));
        assert_eq!(rdr.read_parameter("rho"), None);
        assert_eq!(rdr.cell_ids().unwrap(), vec![2, 1]);
        assert_eq!(rdr.read_raw("rho").unwrap().values(), &[1.5, 2.5]);
        let b = rdr.read_raw("B").unwrap();
        assert_eq!(b.components(), 3);
        assert_eq!(
            rdr.read_variable("B", Some(Operator::Magnitude))
                .unwrap()
                .values(),
            &[5., 1.]
        );
        assert!(matches!(
            rdr.read_raw("E"),
            Err(ReaderError::MissingVariable(_))
        ));
        std::fs::remove_file(&path).unwrap();
    }
}
