//! Panel configuration

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    colormap::{ColormapRegistry, DEFAULT_COLORMAP},
    defaults::RunDefaults,
    grid::Unit,
    reader::DataReader,
    render::{Overlay, RenderConfig},
    variables::{Expression, DEFAULT_VARIABLE},
};

/// Run name used in the output file name when none is given
pub const DEFAULT_RUN: &str = "plot";
/// Extension of the snapshots resolved from a directory and a step
pub const DEFAULT_EXTENSION: &str = "npz";

/// Options of a colormap panel
///
/// The snapshot is given either as a file name, as a [DataReader] or as a
/// directory and a time step, in this order of precedence.
pub struct PanelConfig {
    pub(crate) filename: Option<PathBuf>,
    pub(crate) reader: Option<Box<dyn DataReader>>,
    pub(crate) filedir: Option<PathBuf>,
    pub(crate) step: Option<u32>,
    pub(crate) extension: String,
    pub(crate) outputdir: Option<String>,
    pub(crate) var: Option<String>,
    pub(crate) op: Option<String>,
    pub(crate) expression: Option<Expression>,
    pub(crate) boxm: Option<[f64; 4]>,
    pub(crate) boxre: Option<[f64; 4]>,
    pub(crate) unit: Unit,
    pub(crate) colormap: String,
    pub(crate) registry: ColormapRegistry,
    pub(crate) lin: bool,
    pub(crate) symlog: Option<f64>,
    pub(crate) vmin: Option<f64>,
    pub(crate) vmax: Option<f64>,
    pub(crate) defaults: RunDefaults,
    pub(crate) run: String,
    pub(crate) title: Option<String>,
    pub(crate) notime: bool,
    pub(crate) thick: f64,
    pub(crate) usesci: bool,
    pub(crate) watermark: Option<PathBuf>,
    pub(crate) overlay: Option<Box<dyn Overlay>>,
    pub(crate) draw: bool,
    pub(crate) render: RenderConfig,
}
impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            filename: None,
            reader: None,
            filedir: None,
            step: None,
            extension: DEFAULT_EXTENSION.to_string(),
            outputdir: None,
            var: None,
            op: None,
            expression: None,
            boxm: None,
            boxre: None,
            unit: Unit::default(),
            colormap: DEFAULT_COLORMAP.to_string(),
            registry: ColormapRegistry::default(),
            lin: false,
            symlog: None,
            vmin: None,
            vmax: None,
            defaults: RunDefaults::default(),
            run: DEFAULT_RUN.to_string(),
            title: None,
            notime: false,
            thick: 1.,
            usesci: true,
            watermark: None,
            overlay: None,
            draw: false,
            render: RenderConfig::default(),
        }
    }
}
impl PanelConfig {
    /// Snapshot file
    pub fn filename<P: AsRef<Path>>(self, filename: P) -> Self {
        Self {
            filename: Some(filename.as_ref().to_path_buf()),
            ..self
        }
    }
    /// Already opened snapshot
    pub fn reader<R: DataReader + 'static>(self, reader: R) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            ..self
        }
    }
    /// Directory of the `bulk.<step>.<extension>` snapshots
    pub fn filedir<P: AsRef<Path>>(self, filedir: P) -> Self {
        Self {
            filedir: Some(filedir.as_ref().to_path_buf()),
            ..self
        }
    }
    /// Time step, also appended to the output file name
    pub fn step(self, step: u32) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }
    pub fn extension<S: Into<String>>(self, extension: S) -> Self {
        Self {
            extension: extension.into(),
            ..self
        }
    }
    /// Output directory, a path not ending with `/` ends with a file name prefix
    pub fn outputdir<S: Into<String>>(self, outputdir: S) -> Self {
        Self {
            outputdir: Some(outputdir.into()),
            ..self
        }
    }
    pub fn var<S: Into<String>>(self, var: S) -> Self {
        Self {
            var: Some(var.into()),
            ..self
        }
    }
    /// Vector component: `x`, `y` or `z`
    pub fn op<S: Into<String>>(self, op: S) -> Self {
        Self {
            op: Some(op.into()),
            ..self
        }
    }
    /// Custom expression, overrides the variable
    pub fn expression(self, expression: Expression) -> Self {
        Self {
            expression: Some(expression),
            ..self
        }
    }
    /// Plot window `[x0, x1, y0, y1]` in metres
    pub fn boxm(self, boxm: [f64; 4]) -> Self {
        Self {
            boxm: Some(boxm),
            ..self
        }
    }
    /// Plot window `[x0, x1, y0, y1]` in Earth radii
    pub fn boxre(self, boxre: [f64; 4]) -> Self {
        Self {
            boxre: Some(boxre),
            ..self
        }
    }
    pub fn unit(self, unit: Unit) -> Self {
        Self { unit, ..self }
    }
    pub fn colormap<S: Into<String>>(self, colormap: S) -> Self {
        Self {
            colormap: colormap.into(),
            ..self
        }
    }
    pub fn registry(self, registry: ColormapRegistry) -> Self {
        Self { registry, ..self }
    }
    /// Linear colour scale
    pub fn lin(self) -> Self {
        Self { lin: true, ..self }
    }
    /// Symmetric log colour scale, a `threshold` of 0 is derived from the value range
    pub fn symlog(self, threshold: f64) -> Self {
        Self {
            symlog: Some(threshold),
            ..self
        }
    }
    pub fn vmin(self, vmin: f64) -> Self {
        Self {
            vmin: Some(vmin),
            ..self
        }
    }
    pub fn vmax(self, vmax: f64) -> Self {
        Self {
            vmax: Some(vmax),
            ..self
        }
    }
    /// Table of the default colour scale bounds
    pub fn defaults(self, defaults: RunDefaults) -> Self {
        Self { defaults, ..self }
    }
    pub fn run<S: Into<String>>(self, run: S) -> Self {
        Self {
            run: run.into(),
            ..self
        }
    }
    /// Colorbar title
    pub fn title<S: Into<String>>(self, title: S) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }
    /// Removes the time from the plot title
    pub fn notime(self) -> Self {
        Self {
            notime: true,
            ..self
        }
    }
    /// Line and axis thickness
    pub fn thick(self, thick: f64) -> Self {
        Self { thick, ..self }
    }
    /// Scientific notation of the colorbar labels
    pub fn usesci(self, usesci: bool) -> Self {
        Self { usesci, ..self }
    }
    pub fn watermark<P: AsRef<Path>>(self, watermark: P) -> Self {
        Self {
            watermark: Some(watermark.as_ref().to_path_buf()),
            ..self
        }
    }
    pub fn overlay<O: Overlay + 'static>(self, overlay: O) -> Self {
        Self {
            overlay: Some(Box::new(overlay)),
            ..self
        }
    }
    /// Shows the panel in the image viewer instead of saving it
    pub fn draw(self) -> Self {
        Self { draw: true, ..self }
    }
    pub fn render_config(self, render: RenderConfig) -> Self {
        Self { render, ..self }
    }

    /// Snapshot file given either directly or as a directory and a step
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.filename.clone().or_else(|| {
            self.filedir.as_ref().zip(self.step).map(|(dir, step)| {
                dir.join(format!("bulk.{:07}.{}", step, self.extension))
            })
        })
    }
    /// Returns true if a snapshot source is given
    pub fn has_source(&self) -> bool {
        self.filename.is_some()
            || self.reader.is_some()
            || (self.filedir.is_some() && self.step.is_some())
    }
    /// Name of the plotted quantity: the expression name, else the variable
    pub fn variable_name(&self) -> &str {
        match (&self.expression, &self.var) {
            (Some(expression), _) => expression.name(),
            (None, Some(var)) => var,
            (None, None) => DEFAULT_VARIABLE,
        }
    }
    /// Output directory and file name prefix
    pub fn output_location(&self) -> (PathBuf, String) {
        let outputdir = self.outputdir.clone().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            format!("{}/Plots/", home)
        });
        if outputdir.ends_with('/') {
            return (PathBuf::from(outputdir), String::new());
        }
        let path = Path::new(&outputdir);
        let prefix = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (dir, prefix)
    }
    /// Output file of the panel for a validated operator suffix `opstr`
    pub fn savefig(&self, opstr: &str) -> PathBuf {
        let (dir, prefix) = self.output_location();
        let stepstr = self
            .step
            .map(|step| format!("_{:07}", step))
            .unwrap_or_default();
        dir.join(format!(
            "{}{}_map_{}{}{}.png",
            prefix,
            self.run,
            self.variable_name(),
            opstr,
            stepstr
        ))
    }
}
impl fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelConfig")
            .field("filename", &self.filename)
            .field("reader", &self.reader.is_some())
            .field("filedir", &self.filedir)
            .field("step", &self.step)
            .field("outputdir", &self.outputdir)
            .field("variable", &self.variable_name())
            .field("op", &self.op)
            .field("boxm", &self.boxm)
            .field("boxre", &self.boxre)
            .field("unit", &self.unit)
            .field("colormap", &self.colormap)
            .field("lin", &self.lin)
            .field("symlog", &self.symlog)
            .field("vmin", &self.vmin)
            .field("vmax", &self.vmax)
            .field("run", &self.run)
            .field("draw", &self.draw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MemoryReader;

    #[test]
    fn snapshot_from_directory() {
        let config = PanelConfig::default().filedir("/data/BCQ").step(1200);
        assert!(config.has_source());
        assert_eq!(
            config.snapshot_path(),
            Some(PathBuf::from("/data/BCQ/bulk.0001200.npz"))
        );
        let config = PanelConfig::default().filedir("/data/BCQ");
        assert!(!config.has_source());
        assert!(config.snapshot_path().is_none());
    }

    #[test]
    fn reader_source() {
        let config = PanelConfig::default().reader(MemoryReader::default());
        assert!(config.has_source());
        assert!(config.snapshot_path().is_none());
    }

    #[test]
    fn output_file_name() {
        let config = PanelConfig::default()
            .outputdir("/tmp/plots/")
            .run("BCQ")
            .var("B")
            .step(42);
        assert_eq!(
            config.savefig("_x"),
            PathBuf::from("/tmp/plots/BCQ_map_B_x_0000042.png")
        );
        let config = PanelConfig::default().outputdir("/tmp/plots/panel_");
        assert_eq!(
            config.savefig(""),
            PathBuf::from("/tmp/plots/panel_plot_map_rho.png")
        );
    }

    #[test]
    fn expression_names_output() {
        let config = PanelConfig::default()
            .outputdir("out/")
            .var("rho")
            .expression(Expression::new("pdyn", &["rho", "v"], |maps| {
                maps[0].clone()
            }));
        assert_eq!(config.variable_name(), "pdyn");
        assert_eq!(config.savefig(""), PathBuf::from("out/plot_map_pdyn.png"));
    }
}
