//! Colormap panels
//!
//! [prepare] reads a snapshot and resolves everything a panel needs: the map
//! reordered on the mesh, the plot window, the colour scale and the labels.
//! [plot_colormap] resolves the snapshot source, prepares the panel and
//! renders it.

use std::{fs, path::PathBuf};

use crate::{
    colormap::Colormap,
    config::PanelConfig,
    error::{Error, Result},
    grid::{select_box, Extent, Field, Mask, Mesh, MeshGrid, Plane, Unit},
    reader::{DataReader, NpzReader},
    render,
    scale::{self, ScaleRequest, Selection},
    variables::{parse_operator, read_maps, Variable, DEFAULT_VARIABLE},
};

/// A map ready to be rendered
#[derive(Debug)]
pub struct Panel {
    /// plot title, empty without time
    pub title: String,
    pub field: Field,
    /// cell centers in the plot unit
    pub grid: MeshGrid,
    /// simulation extent in the plot unit
    pub simulation: Extent,
    /// plot window in the plot unit
    pub view: Extent,
    pub plane: Plane,
    pub unit: Unit,
    pub selection: Selection,
    pub colorbar_title: String,
    pub colormap: Colormap,
    pub savefig: PathBuf,
    /// maps handed over to the overlay
    pub overlay_maps: Vec<Field>,
    /// square root of the plot window height to width ratio
    pub aspect_ratio: f64,
    pub thick: f64,
    pub usesci: bool,
    pub watermark: Option<PathBuf>,
}

fn plot_title<R: DataReader + ?Sized>(reader: &mut R) -> String {
    match reader
        .read_parameter("time")
        .or_else(|| reader.read_parameter("t"))
    {
        Some(time) => format!("t={} s", time as i64),
        None => {
            log::warn!("Unknown time format encountered");
            String::new()
        }
    }
}

/// Reads and resolves a panel from a snapshot
pub fn prepare(reader: &mut dyn DataReader, config: &PanelConfig) -> Result<Panel> {
    let operator = parse_operator(config.op.as_deref());
    let opstr = operator.map(|op| format!("_{}", op)).unwrap_or_default();
    // components are shown on a linear scale unless symlog is set
    let lin = config.lin || (operator.is_some() && config.symlog.is_none());

    let title = if config.notime {
        String::new()
    } else {
        plot_title(reader)
    };

    let mesh = Mesh::from_reader(reader)?;
    let plane = mesh.plane()?;
    let simulation = mesh.extent()?;
    let (cols, rows) = mesh.sizes()?;
    let cell_ids = reader.cell_ids()?;
    log::info!(
        "{:?} plane, {}x{} cells over {}",
        plane,
        cols,
        rows,
        simulation
    );

    let window = select_box(config.boxm, config.boxre, &simulation);
    let aspect_ratio = window.aspect_ratio();
    let view = window.in_unit(config.unit);
    let simulation = simulation.in_unit(config.unit);

    let (field, variable_title) = match &config.expression {
        Some(expression) => {
            let maps = read_maps(reader, expression.variables(), &cell_ids, rows, cols)?;
            (
                expression.evaluate(&maps, (rows, cols))?,
                expression.name().to_string(),
            )
        }
        None => {
            let variable =
                Variable::from_name(config.var.as_deref().unwrap_or(DEFAULT_VARIABLE));
            let (data, title) = variable.read(reader, operator)?;
            (Field::from_cells(&cell_ids, &data, rows, cols)?, title)
        }
    };
    let colorbar_title = config.title.clone().unwrap_or(variable_title);

    let request = ScaleRequest {
        vmin: config.vmin,
        vmax: config.vmax,
        lin,
        symlog: config.symlog,
        defaults: config
            .defaults
            .lookup(&config.run, config.variable_name(), operator),
    };
    let mask = if request.needs_data() {
        let rho = reader.read_variable("rho", None)?;
        Some(Mask::positive(&Field::from_cells(&cell_ids, &rho, rows, cols)?))
    } else {
        None
    };
    let selection = scale::select(&field, mask.as_ref(), &request)?;
    let range = selection.range();
    log::info!(
        "{}: {} scale over [{:e}, {:e}]",
        config.variable_name(),
        selection.mode(),
        range.vmin,
        range.vmax
    );

    let overlay_maps = match &config.overlay {
        Some(overlay) => read_maps(reader, &overlay.variables()[..], &cell_ids, rows, cols)?,
        None => Vec::new(),
    };

    Ok(Panel {
        title,
        grid: MeshGrid::new(&simulation, cols, rows),
        field,
        simulation,
        view,
        plane,
        unit: config.unit,
        selection,
        colorbar_title,
        colormap: config.registry.get(&config.colormap)?,
        savefig: config.savefig(&opstr),
        overlay_maps,
        aspect_ratio,
        thick: config.thick,
        usesci: config.usesci,
        watermark: config.watermark.clone(),
    })
}

/// Plots a colormap panel of a snapshot
///
/// Returns the path of the saved image, or `None` if the panel is shown in the
/// image viewer.
pub fn plot_colormap(mut config: PanelConfig) -> Result<Option<PathBuf>> {
    if !config.has_source() {
        return Err(Error::MissingSource);
    }
    let mut reader: Box<dyn DataReader> = match (config.reader.take(), config.snapshot_path()) {
        (_, Some(path)) if config.filename.is_some() => Box::new(NpzReader::open(path)?),
        (Some(reader), _) => reader,
        (None, Some(path)) => Box::new(NpzReader::open(path)?),
        (None, None) => return Err(Error::MissingSource),
    };

    let (dir, _) = config.output_location();
    if !config.draw && !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| Error::OutputDir(e, dir.clone()))?;
        log::info!("Created {:?}", dir);
    }

    let panel = prepare(reader.as_mut(), &config)?;
    let overlay = config.overlay.as_deref();
    if config.draw {
        let path = std::env::temp_dir().join(
            panel
                .savefig
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("panel.png")),
        );
        render::render(&panel, &path, &config.render, overlay)?;
        render::show(&path)?;
        Ok(None)
    } else {
        render::render(&panel, &panel.savefig, &config.render, overlay)?;
        Ok(Some(panel.savefig))
    }
}
