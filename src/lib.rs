//! # Colormap panels of plasma simulation snapshots
//!
//! Renders 2D pseudocolor maps of a simulation variable with a colorbar,
//! a title and optional overlays.
//!
//! ```no_run
//! use plot_panel::{plot_colormap, PanelConfig};
//!
//! let png = plot_colormap(
//!     PanelConfig::default()
//!         .filename("bulk.0001200.npz")
//!         .var("B")
//!         .op("x")
//!         .boxre([-20., 20., -20., 20.]),
//! )?;
//! # Ok::<(), plot_panel::Error>(())
//! ```

pub mod colormap;
pub mod config;
pub mod defaults;
pub mod error;
pub mod grid;
pub mod panel;
pub mod reader;
pub mod render;
pub mod scale;
pub mod variables;

pub use colormap::{Colormap, ColormapRegistry};
pub use config::PanelConfig;
pub use defaults::RunDefaults;
pub use error::{Error, Result};
pub use grid::{Extent, Field, Mask, MeshGrid, Plane, Unit, EARTH_RADIUS};
pub use panel::{plot_colormap, prepare, Panel};
pub use reader::{CellData, DataReader, MemoryReader, NpzReader, Operator};
pub use render::{Overlay, PlotChart, RenderConfig};
pub use scale::{Bound, Normalization, ScaleMode, ScaleRequest, Selection, ValueRange};
pub use variables::{Expression, Variable};
