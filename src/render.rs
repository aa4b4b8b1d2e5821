//! Panel rendering
//!
//! A [Panel] is drawn with plotters into a PNG file: the map as one filled
//! rectangle per cell, the axes with equal aspect, the colorbar to the right
//! of the map, the title above and an optional watermark in the top-left
//! corner.

use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

use image::imageops::{self, FilterType};
use plotters::{
    coord::{cartesian::Cartesian2d, types::RangedCoordf64},
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

use crate::{
    grid::{Extent, Field, MeshGrid},
    panel::Panel,
};

/// Figure width [inch]
pub const FIGURE_WIDTH: f64 = 4.0;
/// Figure height for a square box [inch]
pub const FIGURE_HEIGHT: f64 = 3.15;
/// Colorbar width relative to the map width
pub const COLORBAR_WIDTH: f64 = 0.05;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("plotting failed: {0}")]
    Plot(String),
    #[error("failed to load watermark {1:?}")]
    Watermark(#[source] image::ImageError, PathBuf),
    #[error("overlay failed: {0}")]
    Overlay(String),
    #[error("failed to open {1:?} in the image viewer")]
    Viewer(#[source] io::Error, PathBuf),
}
impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Plot(e.to_string())
    }
}
type Result<T> = std::result::Result<T, RenderError>;

/// Fonts and resolution of the figures
///
/// Font sizes are given in points and scaled to the raster with `dpi`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub font_family: String,
    pub dpi: u32,
    pub text_size: f64,
    pub title_size: f64,
    pub tick_size: f64,
}
impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            dpi: 300,
            text_size: 8.,
            title_size: 10.,
            tick_size: 5.,
        }
    }
}
impl RenderConfig {
    pub fn font_family(self, font_family: impl ToString) -> Self {
        Self {
            font_family: font_family.to_string(),
            ..self
        }
    }
    pub fn dpi(self, dpi: u32) -> Self {
        Self { dpi, ..self }
    }
    /// Converts points into pixels
    pub fn pixels(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.
    }
}

/// Chart the maps are drawn into, in the units of the plot axes
pub type PlotChart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Additional drawing on top of a map
pub trait Overlay {
    /// Variables whose maps are handed over to [Overlay::draw]
    fn variables(&self) -> Vec<String> {
        Vec::new()
    }
    fn draw(
        &self,
        chart: &mut PlotChart<'_, '_>,
        grid: &MeshGrid,
        maps: &[Field],
    ) -> std::result::Result<(), Box<dyn std::error::Error>>;
}

/// Pixel rectangle `[left, top, right, bottom]`
pub type PixelRect = [i32; 4];

/// Pixel layout of a figure
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub size: (u32, u32),
    pub map: PixelRect,
    pub colorbar: PixelRect,
    /// width of the tick labels area left of the map
    pub left: i32,
    /// height of the tick labels area below the map
    pub bottom: i32,
}
impl Layout {
    /// Fits a map of `view` with equal aspect into a figure of aspect `aspect_ratio`
    pub fn new(view: &Extent, aspect_ratio: f64, config: &RenderConfig) -> Self {
        let dpi = config.dpi as f64;
        let width = (FIGURE_WIDTH * dpi).round();
        let height = (FIGURE_HEIGHT * aspect_ratio * dpi).round().max(1.);
        let text = config.pixels(config.text_size);
        let title = config.pixels(config.title_size);
        let tick = config.pixels(config.tick_size);
        let margin = 0.05 * dpi;

        let left = 4.5 * text;
        let bottom = 3.5 * text;
        let top = margin + 2.5 * title;
        let right = 0.05 * dpi + 6. * tick + margin;

        let aspect = view.height() / view.width();
        let aspect = if aspect.is_finite() && aspect > 0. {
            aspect
        } else {
            1.
        };
        let max_width = ((width - margin - left - right) / (1. + COLORBAR_WIDTH)).max(1.);
        let max_height = (height - top - bottom - margin).max(1.);
        let (map_width, map_height) = if max_width * aspect <= max_height {
            (max_width, max_width * aspect)
        } else {
            (max_height / aspect, max_height)
        };

        let x0 = margin + left;
        let y0 = top;
        let map = [
            x0 as i32,
            y0 as i32,
            (x0 + map_width) as i32,
            (y0 + map_height) as i32,
        ];
        let cb_x0 = x0 + map_width + 0.05 * dpi;
        let colorbar = [
            cb_x0 as i32,
            map[1],
            (cb_x0 + COLORBAR_WIDTH * map_width).ceil() as i32,
            map[3],
        ];
        Self {
            size: (width as u32, height as u32),
            map,
            colorbar,
            left: left as i32,
            bottom: bottom as i32,
        }
    }
}

fn rgb(color: colorous::Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// Renders `panel` into the PNG file `path`
pub fn render(
    panel: &Panel,
    path: &Path,
    config: &RenderConfig,
    overlay: Option<&dyn Overlay>,
) -> Result<()> {
    let layout = Layout::new(&panel.view, panel.aspect_ratio, config);
    log::debug!("figure layout: {:?}", layout);
    let (width, height) = layout.size;
    let root = BitMapBackend::new(path, layout.size).into_drawing_area();
    root.fill(&WHITE)?;

    if let Some(watermark) = &panel.watermark {
        draw_watermark(&root, watermark, layout.size)?;
    }

    let family = config.font_family.as_str();
    let text_px = config.pixels(config.text_size);
    let title_px = config.pixels(config.title_size);
    let tick_px = config.pixels(config.tick_size);
    let thick = panel.thick.max(0.) as u32;

    let [x0, y0, x1, y1] = layout.map;
    let area = root.margin(
        y0,
        height as i32 - y1 - layout.bottom,
        x0 - layout.left,
        width as i32 - x1,
    );
    let (vx0, vx1) = panel.view.x();
    let (vy0, vy1) = panel.view.y();
    let mut chart = ChartBuilder::on(&area)
        .margin(0)
        .x_label_area_size(layout.bottom)
        .y_label_area_size(layout.left)
        .build_cartesian_2d(vx0..vx1, vy0..vy1)?;

    let sqrt_ratio = panel.aspect_ratio.max(f64::EPSILON).sqrt();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels((7. / sqrt_ratio).round().max(2.) as usize)
        .y_labels((7. * sqrt_ratio).round().max(2.) as usize)
        .x_desc(format!("X [{}]", panel.unit.label()))
        .y_desc(format!(
            "{} [{}]",
            panel.plane.vertical_axis(),
            panel.unit.label()
        ))
        .label_style((family, text_px).into_font())
        .axis_desc_style((family, text_px).into_font())
        .axis_style(BLACK.stroke_width(thick))
        .draw()?;

    chart.draw_series(cells(panel))?;

    if !panel.title.is_empty() {
        root.draw(&Text::new(
            panel.title.clone(),
            ((x0 + x1) / 2, y0 - (0.9 * title_px) as i32),
            (family, title_px, FontStyle::Bold)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom)),
        ))?;
    }

    draw_colorbar(&root, panel, &layout, family, tick_px, text_px, thick)?;

    if let Some(overlay) = overlay {
        overlay
            .draw(&mut chart, &panel.grid, &panel.overlay_maps)
            .map_err(|e| RenderError::Overlay(e.to_string()))?;
    }

    root.present()?;
    log::info!("Saved {:?}", path);
    Ok(())
}

/// One filled rectangle per map cell, clipped to the view
fn cells(panel: &Panel) -> impl Iterator<Item = Rectangle<(f64, f64)>> + '_ {
    let grid = &panel.grid;
    let step = |v: &[f64], extent: (f64, f64)| {
        if v.len() > 1 {
            v[1] - v[0]
        } else {
            extent.1 - extent.0
        }
    };
    let dx = step(&grid.x, panel.simulation.x());
    let dy = step(&grid.y, panel.simulation.y());
    let (vx0, vx1) = panel.view.x();
    let (vy0, vy1) = panel.view.y();
    let field = &panel.field;
    let norm = &panel.selection.norm;
    (0..field.rows()).flat_map(move |row| {
        (0..field.cols()).filter_map(move |col| {
            let (x, y) = (grid.x[col], grid.y[row]);
            let (left, right) = ((x - 0.5 * dx).max(vx0), (x + 0.5 * dx).min(vx1));
            let (bottom, top) = ((y - 0.5 * dy).max(vy0), (y + 0.5 * dy).min(vy1));
            if left >= right || bottom >= top {
                return None;
            }
            let t = norm.normalize(field.get(row, col))?;
            Some(Rectangle::new(
                [(left, bottom), (right, top)],
                rgb(panel.colormap.eval(t)).filled(),
            ))
        })
    })
}

fn draw_colorbar(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    panel: &Panel,
    layout: &Layout,
    family: &str,
    tick_px: f64,
    text_px: f64,
    thick: u32,
) -> Result<()> {
    let [x0, y0, x1, y1] = layout.colorbar;
    let height = (y1 - y0).max(1);
    let norm = &panel.selection.norm;
    for y in y0..y1 {
        let t = (y1 - y) as f64 / height as f64;
        if let Some(u) = norm.normalize(norm.value_at(t)) {
            root.draw(&Rectangle::new(
                [(x0, y), (x1, y + 1)],
                rgb(panel.colormap.eval(u)).filled(),
            ))?;
        }
    }
    root.draw(&Rectangle::new(
        [(x0, y0), (x1, y1)],
        BLACK.stroke_width(thick.max(1)),
    ))?;

    let tick_length = (0.25 * tick_px) as i32;
    let label_style = (family, tick_px)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for tick in norm.tick_labels(panel.usesci, panel.aspect_ratio) {
        let t = match norm.position(tick.value) {
            Some(t) if (-1e-9..=1. + 1e-9).contains(&t) => t,
            _ => continue,
        };
        let y = y1 - (t * height as f64).round() as i32;
        root.draw(&PathElement::new(
            vec![(x1, y), (x1 + tick_length, y)],
            BLACK.stroke_width(thick.max(1)),
        ))?;
        if tick.visible {
            root.draw(&Text::new(
                tick.text,
                (x1 + 2 * tick_length, y),
                label_style.clone(),
            ))?;
        }
    }

    root.draw(&Text::new(
        panel.colorbar_title.clone(),
        (layout.map[2], y0 - (0.3 * text_px) as i32),
        (family, text_px, FontStyle::Bold)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Bottom)),
    ))?;
    Ok(())
}

/// Blends the watermark image into the top-left corner of the figure
fn draw_watermark(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    path: &Path,
    (width, height): (u32, u32),
) -> Result<()> {
    let image = image::open(path)
        .map_err(|e| RenderError::Watermark(e, path.to_path_buf()))?
        .to_rgba8();
    let (box_width, box_height) = (0.3 * width as f64, 0.08 * height as f64);
    let scale = (box_width / image.width() as f64).min(box_height / image.height() as f64);
    let image = imageops::resize(
        &image,
        ((image.width() as f64 * scale) as u32).max(1),
        ((image.height() as f64 * scale) as u32).max(1),
        FilterType::Triangle,
    );
    let offset = (0.01 * width as f64) as i32;
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        if a > 0 {
            root.draw_pixel(
                (offset + x as i32, offset + y as i32),
                &RGBColor(r, g, b).mix(a as f64 / 255.),
            )?;
        }
    }
    Ok(())
}

/// Opens `path` in the system image viewer
pub fn show(path: &Path) -> Result<()> {
    let viewer = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    log::info!("Opening {:?} with {}", path, viewer);
    Command::new(viewer)
        .arg(path)
        .status()
        .map_err(|e| RenderError::Viewer(e, path.to_path_buf()))?;
    Ok(())
}
