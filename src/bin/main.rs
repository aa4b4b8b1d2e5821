use std::path::PathBuf;

use plot_panel::{plot_colormap, PanelConfig, RunDefaults, Unit};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "plot-panel", about = "Colormap panel of a simulation snapshot")]
struct Opt {
    /// Snapshot file
    #[structopt(short, long, parse(from_os_str))]
    filename: Option<PathBuf>,
    /// Snapshots directory, used with `step`
    #[structopt(long, parse(from_os_str))]
    filedir: Option<PathBuf>,
    /// Time step
    #[structopt(short, long)]
    step: Option<u32>,
    /// Output directory, a path not ending with `/` ends with a file name prefix
    #[structopt(short, long)]
    outputdir: Option<String>,
    /// Variable
    #[structopt(short, long)]
    var: Option<String>,
    /// Vector component: x, y or z
    #[structopt(long)]
    op: Option<String>,
    /// Plot window in metres: x0 x1 y0 y1
    #[structopt(long, number_of_values = 4, allow_hyphen_values = true)]
    boxm: Option<Vec<f64>>,
    /// Plot window in Earth radii: x0 x1 y0 y1
    #[structopt(long, number_of_values = 4, allow_hyphen_values = true)]
    boxre: Option<Vec<f64>>,
    /// Axes unit: re, m or km
    #[structopt(short, long, default_value = "re")]
    unit: Unit,
    /// Colormap, a `_r` suffix reverses it
    #[structopt(short, long)]
    colormap: Option<String>,
    /// Linear colour scale
    #[structopt(long)]
    lin: bool,
    /// Symmetric log colour scale threshold, 0 for automatic
    #[structopt(long)]
    symlog: Option<f64>,
    /// Lower colour scale bound
    #[structopt(long, allow_hyphen_values = true)]
    vmin: Option<f64>,
    /// Upper colour scale bound
    #[structopt(long, allow_hyphen_values = true)]
    vmax: Option<f64>,
    /// CSV table of the default colour scale bounds
    #[structopt(long, parse(from_os_str))]
    defaults: Option<PathBuf>,
    /// Run name
    #[structopt(short, long)]
    run: Option<String>,
    /// Colorbar title
    #[structopt(short, long)]
    title: Option<String>,
    /// Removes the time from the plot title
    #[structopt(long)]
    notime: bool,
    /// Line and axis thickness
    #[structopt(long)]
    thick: Option<f64>,
    /// Plain colorbar labels instead of scientific notation
    #[structopt(long)]
    nosci: bool,
    /// Watermark image
    #[structopt(long, parse(from_os_str))]
    watermark: Option<PathBuf>,
    /// Shows the panel instead of saving it
    #[structopt(short, long)]
    draw: bool,
}

fn window(values: Option<Vec<f64>>) -> anyhow::Result<Option<[f64; 4]>> {
    values
        .map(|v| {
            <[f64; 4]>::try_from(v.as_slice())
                .map_err(|_| anyhow::anyhow!("a box needs 4 values, found {}", v.len()))
        })
        .transpose()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut config = PanelConfig::default().unit(opt.unit).usesci(!opt.nosci);
    if let Some(arg) = opt.filename {
        config = config.filename(arg);
    }
    if let Some(arg) = opt.filedir {
        config = config.filedir(arg);
    }
    if let Some(arg) = opt.step {
        config = config.step(arg);
    }
    if let Some(arg) = opt.outputdir {
        config = config.outputdir(arg);
    }
    if let Some(arg) = opt.var {
        config = config.var(arg);
    }
    if let Some(arg) = opt.op {
        config = config.op(arg);
    }
    if let Some(arg) = window(opt.boxm)? {
        config = config.boxm(arg);
    }
    if let Some(arg) = window(opt.boxre)? {
        config = config.boxre(arg);
    }
    if let Some(arg) = opt.colormap {
        config = config.colormap(arg);
    }
    if opt.lin {
        config = config.lin();
    }
    if let Some(arg) = opt.symlog {
        config = config.symlog(arg);
    }
    if let Some(arg) = opt.vmin {
        config = config.vmin(arg);
    }
    if let Some(arg) = opt.vmax {
        config = config.vmax(arg);
    }
    if let Some(arg) = opt.defaults {
        config = config.defaults(RunDefaults::from_path(arg)?);
    }
    if let Some(arg) = opt.run {
        config = config.run(arg);
    }
    if let Some(arg) = opt.title {
        config = config.title(arg);
    }
    if opt.notime {
        config = config.notime();
    }
    if let Some(arg) = opt.thick {
        config = config.thick(arg);
    }
    if let Some(arg) = opt.watermark {
        config = config.watermark(arg);
    }
    if opt.draw {
        config = config.draw();
    }

    if let Some(path) = plot_colormap(config)? {
        println!("{}", path.display());
    }
    Ok(())
}
