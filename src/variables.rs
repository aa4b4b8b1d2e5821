//! Plotted variables
//!
//! A [Variable] is either one of the derived quantities the panels know how
//! to compute and label, or any other snapshot variable passed through to the
//! reader. An [Expression] computes a custom map from the maps of other
//! variables.

use std::{fmt, str::FromStr};

use strum_macros::EnumString;

use crate::{
    grid::{Field, GridError},
    reader::{CellData, DataReader, Operator, ReaderError},
};

/// Variable plotted when neither a variable nor an expression is given
pub const DEFAULT_VARIABLE: &str = "rho";

#[derive(Debug, thiserror::Error)]
pub enum VariableError {
    #[error("{0:?} is not a per-cell scalar or vector variable")]
    Dimensionality(String),
    #[error("expression {name:?} returned a {found:?} map instead of a {expected:?} scalar map")]
    ExpressionShape {
        name: String,
        expected: (usize, usize),
        found: (usize, usize, usize),
    },
    #[error("expression {0:?} has no input variable")]
    NoExpressionInputs(String),
    #[error("failed to read variable")]
    Reader(#[from] ReaderError),
    #[error("failed to build the variable map")]
    Grid(#[from] GridError),
}
type Result<T> = std::result::Result<T, VariableError>;

/// Parses a vector component selector
///
/// Only `x`, `y` and `z` are valid, anything else is discarded with a warning.
pub fn parse_operator(op: Option<&str>) -> Option<Operator> {
    let op = op?;
    match Operator::from_str(op) {
        Ok(operator) if operator.component().is_some() => Some(operator),
        _ => {
            log::warn!("Unknown operator {:?}, ignored", op);
            None
        }
    }
}

/// Variables of a snapshot
#[derive(Debug, Clone, PartialEq, Default, EnumString)]
pub enum Variable {
    /// proton number density
    #[default]
    #[strum(serialize = "rho")]
    Rho,
    /// backstreaming population density
    #[strum(serialize = "rhoBeam")]
    RhoBeam,
    /// plasma beta
    #[strum(serialize = "beta")]
    Beta,
    #[strum(serialize = "temperature")]
    Temperature,
    /// Alfvénic Mach number
    #[strum(serialize = "MA")]
    MA,
    /// magnetosonic Mach number
    #[strum(serialize = "Mms")]
    Mms,
    /// Alfvén speed
    #[strum(serialize = "va")]
    Va,
    /// magnetosonic speed
    #[strum(serialize = "vms")]
    Vms,
    /// magnetic field
    #[strum(serialize = "B")]
    B,
    /// electric field
    #[strum(serialize = "E")]
    E,
    /// bulk velocity
    #[strum(serialize = "V")]
    V,
    #[strum(default)]
    Other(String),
}
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
impl Variable {
    /// Variable named `name`, unknown names are passed through to the reader
    pub fn from_name(name: &str) -> Self {
        name.parse()
            .unwrap_or_else(|_| Variable::Other(name.to_string()))
    }
    /// Name of the variable as given by the user
    pub fn name(&self) -> &str {
        match self {
            Variable::Rho => "rho",
            Variable::RhoBeam => "rhoBeam",
            Variable::Beta => "beta",
            Variable::Temperature => "temperature",
            Variable::MA => "MA",
            Variable::Mms => "Mms",
            Variable::Va => "va",
            Variable::Vms => "vms",
            Variable::B => "B",
            Variable::E => "E",
            Variable::V => "V",
            Variable::Other(name) => name,
        }
    }
    /// Reads the per-cell values of the variable and the matching colorbar title
    ///
    /// Vector variables are reduced to their magnitude unless a component
    /// `operator` is given. The operator is ignored by the scalar variables.
    pub fn read<R: DataReader + ?Sized>(
        &self,
        reader: &mut R,
        operator: Option<Operator>,
    ) -> Result<(CellData, String)> {
        let vector = |reader: &mut R, name: &str, symbol: &str, unit: &str| -> Result<_> {
            Ok(match operator {
                None => (
                    reader.read_variable(name, Some(Operator::Magnitude))?,
                    format!("|{}| [{}]", symbol, unit),
                ),
                Some(op) => (
                    reader.read_variable(name, Some(op))?,
                    format!("{}_{} [{}]", symbol, op, unit),
                ),
            })
        };
        let mach = |reader: &mut R, speed: &str| -> Result<CellData> {
            let v = reader.read_variable("v", Some(Operator::Magnitude))?;
            let s = reader.read_variable(speed, None)?;
            v.ratio(&s)
                .ok_or_else(|| VariableError::Dimensionality(speed.to_string()))
        };
        let (data, title) = match self {
            Variable::Rho => (reader.read_variable("rho", None)?, "n_p [m^-3]".into()),
            Variable::RhoBeam => (
                reader.read_variable("RhoBackstream", None)?,
                "ρ_beam [m^-3]".into(),
            ),
            Variable::Beta => (reader.read_variable("beta", None)?, "β".into()),
            Variable::Temperature => (
                reader.read_variable("Temperature", None)?,
                "T [K]".into(),
            ),
            Variable::MA => (mach(reader, "va")?, "M_A".into()),
            Variable::Mms => (mach(reader, "vms")?, "M_ms".into()),
            Variable::Va => (reader.read_variable("va", None)?, "v_A".into()),
            Variable::Vms => (reader.read_variable("vms", None)?, "v_ms".into()),
            Variable::B => vector(reader, "B", "B", "T")?,
            Variable::E => vector(reader, "E", "E", "V/m")?,
            Variable::V => vector(reader, "v", "V", "m/s")?,
            Variable::Other(name) => match operator {
                None => {
                    let data = reader.read_variable(name, None)?;
                    if data.is_scalar() {
                        (data, name.clone())
                    } else {
                        (data.magnitude(), format!("|{}|", name))
                    }
                }
                Some(op) => (
                    reader.read_variable(name, Some(op))?,
                    format!("{}_{}", name, op),
                ),
            },
        };
        if !data.is_scalar() {
            return Err(VariableError::Dimensionality(self.name().to_string()));
        }
        Ok((data, title))
    }
}

type ExpressionFn = dyn Fn(&[Field]) -> Field;

/// Custom map computed from the maps of other variables
pub struct Expression {
    name: String,
    variables: Vec<String>,
    function: Box<ExpressionFn>,
}
impl Expression {
    /// Creates an expression `name` evaluating `function` on the maps of `variables`
    pub fn new<S, F>(name: impl ToString, variables: &[S], function: F) -> Self
    where
        S: AsRef<str>,
        F: Fn(&[Field]) -> Field + 'static,
    {
        Self {
            name: name.to_string(),
            variables: variables.iter().map(|v| v.as_ref().to_string()).collect(),
            function: Box::new(function),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Names of the input variables
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
    /// Evaluates the expression on the input `maps`
    ///
    /// The result must be a scalar map of the given `(rows, cols)` shape.
    pub fn evaluate(&self, maps: &[Field], shape: (usize, usize)) -> Result<Field> {
        if self.variables.is_empty() {
            return Err(VariableError::NoExpressionInputs(self.name.clone()));
        }
        let field = (self.function)(maps);
        if field.shape() != shape || !field.is_scalar() {
            return Err(VariableError::ExpressionShape {
                name: self.name.clone(),
                expected: shape,
                found: (field.rows(), field.cols(), field.components()),
            });
        }
        Ok(field)
    }
}
impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .finish()
    }
}

/// Reads the raw maps of `names`, vector variables keep their components
pub fn read_maps<R, S>(
    reader: &mut R,
    names: &[S],
    cell_ids: &[u64],
    rows: usize,
    cols: usize,
) -> Result<Vec<Field>>
where
    R: DataReader + ?Sized,
    S: AsRef<str>,
{
    names
        .iter()
        .map(|name| {
            let data = reader.read_raw(name.as_ref())?;
            Ok(Field::from_cells(cell_ids, &data, rows, cols)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MemoryReader;

    fn reader() -> MemoryReader {
        MemoryReader::default()
            .variable("rho", CellData::scalar(vec![1e6, 2e6]))
            .variable("v", CellData::from_vectors(&[[3e5, 4e5, 0.], [0., 0., 6e5]]))
            .variable("va", CellData::scalar(vec![1e5, 2e5]))
            .variable("B", CellData::from_vectors(&[[1e-9, -2e-9, 2e-9], [0., 3e-9, 4e-9]]))
            .variable("pressure", CellData::scalar(vec![1e-10, 2e-10]))
            .variable("j", CellData::from_vectors(&[[0., 3.], [4., 0.]]))
            .variable("CellID", CellData::scalar(vec![2., 1.]))
    }

    #[test]
    fn variable_names() {
        assert_eq!(Variable::from_name("rhoBeam"), Variable::RhoBeam);
        assert_eq!(Variable::from_name("MA"), Variable::MA);
        assert_eq!(
            Variable::from_name("pressure"),
            Variable::Other("pressure".to_string())
        );
        assert_eq!(Variable::from_name("pressure").to_string(), "pressure");
        assert_eq!(Variable::default().name(), DEFAULT_VARIABLE);
        assert_eq!(
            "rhoBeam".parse::<Variable>().unwrap(),
            Variable::from_name("rhoBeam")
        );
        assert_eq!(Variable::from_name(""), Variable::Other(String::new()));
    }

    #[test]
    fn operators() {
        assert_eq!(parse_operator(Some("y")), Some(Operator::Y));
        assert_eq!(parse_operator(Some("magnitude")), None);
        assert_eq!(parse_operator(Some("w")), None);
        assert_eq!(parse_operator(None), None);
    }

    #[test]
    fn magnetic_field() {
        let mut rdr = reader();
        let (data, title) = Variable::B.read(&mut rdr, None).unwrap();
        assert_eq!(title, "|B| [T]");
        assert!((data.values()[0] - 3e-9).abs() < 1e-20);
        let (data, title) = Variable::B.read(&mut rdr, Some(Operator::Y)).unwrap();
        assert_eq!(title, "B_y [T]");
        assert_eq!(data.values(), &[-2e-9, 3e-9]);
    }

    #[test]
    fn alfvenic_mach_number() {
        let mut rdr = reader();
        let (data, title) = Variable::MA.read(&mut rdr, None).unwrap();
        assert_eq!(title, "M_A");
        assert_eq!(data.values(), &[5., 3.]);
    }

    #[test]
    fn passthrough_variables() {
        let mut rdr = reader();
        let (data, title) = Variable::from_name("pressure").read(&mut rdr, None).unwrap();
        assert_eq!(title, "pressure");
        assert_eq!(data.values(), &[1e-10, 2e-10]);
        let (data, title) = Variable::from_name("j").read(&mut rdr, None).unwrap();
        assert_eq!(title, "|j|");
        assert_eq!(data.values(), &[3., 4.]);
        let (data, title) = Variable::from_name("j")
            .read(&mut rdr, Some(Operator::X))
            .unwrap();
        assert_eq!(title, "j_x");
        assert_eq!(data.values(), &[0., 4.]);
    }

    #[test]
    fn missing_variable() {
        let mut rdr = reader();
        assert!(matches!(
            Variable::Temperature.read(&mut rdr, None),
            Err(VariableError::Reader(ReaderError::MissingVariable(_)))
        ));
    }

    #[test]
    fn expression_maps() {
        let mut rdr = reader();
        let ids = rdr.cell_ids().unwrap();
        let maps = read_maps(&mut rdr, &["va", "v"], &ids, 1, 2).unwrap();
        assert_eq!(maps[0].as_slice(), &[2e5, 1e5]);
        assert_eq!(maps[1].components(), 3);
        let speed_ratio = Expression::new("va_over_v", &["va", "v"], |maps| {
            let v = maps[1].magnitude();
            let data = maps[0]
                .as_slice()
                .iter()
                .zip(v.as_slice())
                .map(|(a, b)| a / b)
                .collect();
            Field::new(1, 2, data).unwrap()
        });
        let field = speed_ratio.evaluate(&maps, (1, 2)).unwrap();
        assert_eq!(field.as_slice(), &[2e5 / 6e5, 1e5 / 5e5]);
    }

    #[test]
    fn expression_shape() {
        let vector = Expression::new("vector", &["v"], |maps| maps[0].clone());
        let mut rdr = reader();
        let ids = rdr.cell_ids().unwrap();
        let maps = read_maps(&mut rdr, vector.variables(), &ids, 1, 2).unwrap();
        assert!(matches!(
            vector.evaluate(&maps, (1, 2)),
            Err(VariableError::ExpressionShape {
                found: (1, 2, 3),
                ..
            })
        ));
        let no_inputs = Expression::new("constant", &[] as &[&str], |_| {
            Field::new(1, 2, vec![1., 1.]).unwrap()
        });
        assert!(matches!(
            no_inputs.evaluate(&[], (1, 2)),
            Err(VariableError::NoExpressionInputs(_))
        ));
    }
}
