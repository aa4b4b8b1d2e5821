//! Simulation mesh and 2D maps

use std::fmt;

use strum_macros::{Display, EnumString};

use crate::reader::{CellData, DataReader, ReaderError};

/// Earth radius [m]
pub const EARTH_RADIUS: f64 = 6.371e6;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("missing mesh parameter {0:?}")]
    MissingParameter(&'static str),
    #[error("mesh {0:?} is neither polar (ycells=1) nor ecliptic (zcells=1)")]
    NotPlanar([usize; 3]),
    #[error("expected {expected} cells, found {found}")]
    CellCount { expected: usize, found: usize },
    #[error("expected {expected} values for a {rows}x{cols} map, found {found}")]
    Shape {
        rows: usize,
        cols: usize,
        expected: usize,
        found: usize,
    },
    #[error("failed to read the mesh")]
    Reader(#[from] ReaderError),
}
type Result<T> = std::result::Result<T, GridError>;

/// Plane of a 2D simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    /// X-Y plane
    Ecliptic,
    /// X-Z plane
    Polar,
}
impl Plane {
    /// Name of the vertical axis
    pub fn vertical_axis(&self) -> &'static str {
        match self {
            Plane::Ecliptic => "Y",
            Plane::Polar => "Z",
        }
    }
}

/// Length unit of the plot axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
pub enum Unit {
    #[default]
    #[strum(serialize = "re")]
    EarthRadii,
    #[strum(serialize = "m")]
    Meters,
    #[strum(serialize = "km")]
    Kilometers,
}
impl Unit {
    /// Length of the unit [m]
    pub fn meters(&self) -> f64 {
        match self {
            Unit::EarthRadii => EARTH_RADIUS,
            Unit::Meters => 1.,
            Unit::Kilometers => 1e3,
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Unit::EarthRadii => "R_E",
            Unit::Meters => "m",
            Unit::Kilometers => "km",
        }
    }
}

/// Rectangular window `[x0, x1, y0, y1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent(pub [f64; 4]);
impl Extent {
    pub fn x(&self) -> (f64, f64) {
        (self.0[0], self.0[1])
    }
    pub fn y(&self) -> (f64, f64) {
        (self.0[2], self.0[3])
    }
    pub fn width(&self) -> f64 {
        self.0[1] - self.0[0]
    }
    pub fn height(&self) -> f64 {
        self.0[3] - self.0[2]
    }
    /// Clips the window to `bounds`
    pub fn truncate(self, bounds: &Extent) -> Self {
        let [x0, x1, y0, y1] = self.0;
        Self([
            x0.max(bounds.0[0]),
            x1.min(bounds.0[1]),
            y0.max(bounds.0[2]),
            y1.min(bounds.0[3]),
        ])
    }
    /// Expresses the window in `unit`
    pub fn in_unit(self, unit: Unit) -> Self {
        let u = unit.meters();
        Self(self.0.map(|x| x / u))
    }
    /// Square root of the height to width ratio
    pub fn aspect_ratio(&self) -> f64 {
        (self.height() / self.width()).sqrt()
    }
}
impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x0, x1, y0, y1] = self.0;
        write!(f, "[{:.3e},{:.3e}]x[{:.3e},{:.3e}]", x0, x1, y0, y1)
    }
}

/// Window selection of the plot
///
/// A box in metres takes precedence over a box in Earth radii, without
/// either the whole simulation is shown.
pub fn select_box(boxm: Option<[f64; 4]>, boxre: Option<[f64; 4]>, simulation: &Extent) -> Extent {
    boxm.map(Extent)
        .or_else(|| boxre.map(|b| Extent(b.map(|x| x * EARTH_RADIUS))))
        .unwrap_or(*simulation)
        .truncate(simulation)
}

/// Structured mesh of a 2D simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// number of cells along x, y and z
    pub cells: [usize; 3],
    /// lower corner [m]
    pub min: [f64; 3],
    /// upper corner [m]
    pub max: [f64; 3],
}
impl Mesh {
    /// Reads the mesh parameters of a snapshot
    pub fn from_reader<R: DataReader + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut read = |name: &'static str| {
            reader
                .read_parameter(name)
                .ok_or(GridError::MissingParameter(name))
        };
        Ok(Self {
            cells: [
                read("xcells_ini")? as usize,
                read("ycells_ini")? as usize,
                read("zcells_ini")? as usize,
            ],
            min: [read("xmin")?, read("ymin")?, read("zmin")?],
            max: [read("xmax")?, read("ymax")?, read("zmax")?],
        })
    }
    pub fn plane(&self) -> Result<Plane> {
        match self.cells {
            [_, _, 1] => Ok(Plane::Ecliptic),
            [_, 1, _] => Ok(Plane::Polar),
            cells => Err(GridError::NotPlanar(cells)),
        }
    }
    /// Simulation extent in the plane [m]
    pub fn extent(&self) -> Result<Extent> {
        Ok(match self.plane()? {
            Plane::Ecliptic => Extent([self.min[0], self.max[0], self.min[1], self.max[1]]),
            Plane::Polar => Extent([self.min[0], self.max[0], self.min[2], self.max[2]]),
        })
    }
    /// Number of (columns, rows) of the 2D maps
    pub fn sizes(&self) -> Result<(usize, usize)> {
        Ok(match self.plane()? {
            Plane::Ecliptic => (self.cells[0], self.cells[1]),
            Plane::Polar => (self.cells[0], self.cells[2]),
        })
    }
}

/// `num` evenly spaced samples from `start` to `end`, both included
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    if i == num - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Cell centers coordinates of a map
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}
impl MeshGrid {
    pub fn new(extent: &Extent, cols: usize, rows: usize) -> Self {
        let (x0, x1) = extent.x();
        let (y0, y1) = extent.y();
        Self {
            x: linspace(x0, x1, cols),
            y: linspace(y0, y1, rows),
        }
    }
}

/// 2D map in row-major order
///
/// Each grid cell holds `components` consecutive values.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    rows: usize,
    cols: usize,
    components: usize,
    data: Vec<f64>,
}
impl Field {
    /// Scalar map
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        Self::with_components(rows, cols, 1, data)
    }
    pub fn with_components(
        rows: usize,
        cols: usize,
        components: usize,
        data: Vec<f64>,
    ) -> Result<Self> {
        let expected = rows * cols * components;
        if data.len() != expected {
            return Err(GridError::Shape {
                rows,
                cols,
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            components,
            data,
        })
    }
    /// Orders the cell values by ascending cell identifier and reshapes them into a `rows`x`cols` map
    pub fn from_cells(cell_ids: &[u64], cells: &CellData, rows: usize, cols: usize) -> Result<Self> {
        if cell_ids.len() != cells.len() {
            return Err(GridError::CellCount {
                expected: cell_ids.len(),
                found: cells.len(),
            });
        }
        if cell_ids.len() != rows * cols {
            return Err(GridError::CellCount {
                expected: rows * cols,
                found: cell_ids.len(),
            });
        }
        let mut order: Vec<usize> = (0..cell_ids.len()).collect();
        order.sort_by_key(|&i| cell_ids[i]);
        let data: Vec<f64> = order
            .into_iter()
            .flat_map(|i| cells.cell(i).iter().cloned())
            .collect();
        Self::with_components(rows, cols, cells.components(), data)
    }
    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn components(&self) -> usize {
        self.components
    }
    pub fn is_scalar(&self) -> bool {
        self.components == 1
    }
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Row-major values
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
    /// Values of the cell at (`row`, `col`)
    pub fn cell(&self, row: usize, col: usize) -> &[f64] {
        let i = (row * self.cols + col) * self.components;
        &self.data[i..i + self.components]
    }
    /// First component of the cell at (`row`, `col`)
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cell(row, col)[0]
    }
    /// Iterator over the first component of the cells
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().step_by(self.components).cloned()
    }
    /// Euclidean norm over the components of each cell
    pub fn magnitude(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            components: 1,
            data: self
                .data
                .chunks(self.components)
                .map(|v| v.iter().map(|x| x * x).sum::<f64>().sqrt())
                .collect(),
        }
    }
    /// Component `k` of each cell
    pub fn component(&self, k: usize) -> Option<Self> {
        (k < self.components).then(|| Self {
            rows: self.rows,
            cols: self.cols,
            components: 1,
            data: self.data.chunks(self.components).map(|v| v[k]).collect(),
        })
    }
    /// Applies `f` to every value
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|&x| f(x)).collect(),
            ..self.clone()
        }
    }
}

/// Selection of the cells that are physically meaningful
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(Vec<bool>);
impl Mask {
    /// Cells where the density is positive
    pub fn positive(density: &Field) -> Self {
        Self(density.values().map(|rho| rho > f64::EPSILON).collect())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &bool> {
        self.0.iter()
    }
}
impl From<Vec<bool>> for Mask {
    fn from(value: Vec<bool>) -> Self {
        Self(value)
    }
}
