//! Colour scale selection
//!
//! Resolves the value range of a map, the normalization of the values into
//! the colormap and the ticks of the colorbar.
//!
//! The bounds go through three stages:
//!  1. unset bounds are filled from the defaults table, user bounds override both,
//!  2. bounds still unset are derived from the data within the valid cells,
//!  3. a range derived from data on both ends and crossing zero is made symmetric.
//!
//! The logarithmic scale is the default, a non-positive lower bound is then
//! replaced by `vmax * 1e-5`.

use std::fmt;

use itertools::{Itertools, MinMaxResult};

use crate::grid::{Field, Mask};

/// Number of colors of the colormaps
pub const N_COLORS: usize = 256;
/// Number of bins of the linear scale levels
pub const N_LEVELS: usize = 255;
/// Number of colorbar ticks of the linear scale
pub const N_LINEAR_TICKS: usize = 7;
/// Ratio of `vmax` used as lower bound when the data lower bound is invalid for a log scale
pub const LOG_FLOOR: f64 = 1e-5;
/// Ratio of `max(|vmin|,|vmax|)` used as default linear threshold of the symlog scale
pub const SYMLOG_THRESHOLD: f64 = 1e-2;
/// Relative difference of the bounds magnitude below which a range is made symmetric
pub const SYMMETRIC_TOLERANCE: f64 = 0.4;
/// Scaling of the linear part of the symlog scale
pub const SYMLOG_LINSCALE: f64 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    #[error("no valid cell to derive the value range from")]
    EmptyRange,
    #[error("the mask has {mask} cells but the map has {map}")]
    MaskSize { mask: usize, map: usize },
}
type Result<T> = std::result::Result<T, ScaleError>;

/// Colour scale bound with its origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// from the defaults table
    Default(f64),
    /// given by the user
    User(f64),
    /// derived from the data
    Data(f64),
}
impl Bound {
    pub fn value(&self) -> f64 {
        match *self {
            Bound::Default(x) | Bound::User(x) | Bound::Data(x) => x,
        }
    }
    pub fn is_data(&self) -> bool {
        matches!(self, Bound::Data(_))
    }
}

/// Colour scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
    Linear,
    Log,
    /// logarithmic beyond `linthresh`, linear within
    SymLog { linthresh: f64 },
}
impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleMode::Linear => write!(f, "linear"),
            ScaleMode::Log => write!(f, "log"),
            ScaleMode::SymLog { linthresh } => write!(f, "symlog({:e})", linthresh),
        }
    }
}

/// Colour scale bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub vmin: f64,
    pub vmax: f64,
}
impl ValueRange {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }
    /// Bounds in ascending order
    pub fn sorted(&self) -> (f64, f64) {
        (self.vmin.min(self.vmax), self.vmin.max(self.vmax))
    }
}

/// User inputs to the colour scale selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleRequest {
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    /// linear scale
    pub lin: bool,
    /// symmetric log scale threshold, `0` for a threshold derived from the range
    pub symlog: Option<f64>,
    /// bounds from the defaults table
    pub defaults: (Option<f64>, Option<f64>),
}
impl ScaleRequest {
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
    pub fn lin(self) -> Self {
        Self { lin: true, ..self }
    }
    pub fn symlog(self, threshold: f64) -> Self {
        Self {
            symlog: Some(threshold),
            ..self
        }
    }
    pub fn defaults(self, defaults: (Option<f64>, Option<f64>)) -> Self {
        Self { defaults, ..self }
    }
    /// Bounds from the defaults table overridden by the user bounds
    pub fn bounds(&self) -> (Option<Bound>, Option<Bound>) {
        let pick = |user: Option<f64>, default: Option<f64>| {
            user.map(Bound::User).or(default.map(Bound::Default))
        };
        (
            pick(self.vmin, self.defaults.0),
            pick(self.vmax, self.defaults.1),
        )
    }
    /// Returns true if a bound has to be derived from the data
    pub fn needs_data(&self) -> bool {
        let (vmin, vmax) = self.bounds();
        vmin.is_none() || vmax.is_none()
    }
    fn is_log(&self) -> bool {
        !self.lin && self.symlog.is_none()
    }
}

/// Minimum and maximum of the finite values of `data` within `mask`
pub fn masked_extrema(data: &Field, mask: Option<&Mask>) -> Result<(f64, f64)> {
    if let Some(mask) = mask {
        if mask.len() != data.len() {
            return Err(ScaleError::MaskSize {
                mask: mask.len(),
                map: data.len(),
            });
        }
    }
    let valid: Vec<f64> = match mask {
        Some(mask) => data
            .values()
            .zip(mask.iter())
            .filter_map(|(x, &m)| m.then_some(x))
            .collect(),
        None => data.values().collect(),
    };
    match valid.into_iter().filter(|x| x.is_finite()).minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => Err(ScaleError::EmptyRange),
        MinMaxResult::OneElement(x) => Ok((x, x)),
        MinMaxResult::MinMax(x, y) => Ok((x, y)),
    }
}

/// Symmetric range snapping
///
/// Applies only if both bounds are derived from the data, have opposite signs
/// and magnitudes within [SYMMETRIC_TOLERANCE] of each other.
/// A positive lower bound yields a descending range.
pub fn snap_symmetric(vmin: Bound, vmax: Bound) -> ValueRange {
    let (lo, hi) = (vmin.value(), vmax.value());
    if vmin.is_data() && vmax.is_data() && lo * hi < 0. {
        let diff = (lo.abs() - hi.abs()).abs();
        if diff / lo.abs() < SYMMETRIC_TOLERANCE && diff / hi.abs() < SYMMETRIC_TOLERANCE {
            let absval = lo.abs().max(hi.abs());
            return if lo < 0. {
                ValueRange::new(-absval, absval)
            } else {
                ValueRange::new(absval, -absval)
            };
        }
    }
    ValueRange::new(lo, hi)
}

/// Outcome of the colour scale selection
#[derive(Debug, Clone)]
pub struct Selection {
    pub vmin: Bound,
    pub vmax: Bound,
    pub norm: Normalization,
}
impl Selection {
    pub fn range(&self) -> ValueRange {
        self.norm.range()
    }
    pub fn mode(&self) -> ScaleMode {
        self.norm.mode()
    }
}

/// Selects the value range and the normalization of `data`
///
/// `mask` restricts the cells the bounds are derived from, all the cells are
/// used if it is `None`.
pub fn select(data: &Field, mask: Option<&Mask>, request: &ScaleRequest) -> Result<Selection> {
    let (vmin, vmax) = request.bounds();
    let (vmin, vmax) = match (vmin, vmax) {
        (Some(vmin), Some(vmax)) => (vmin, vmax),
        (vmin, vmax) => {
            let (lo, hi) = masked_extrema(data, mask)?;
            (
                vmin.unwrap_or(Bound::Data(lo)),
                vmax.unwrap_or(Bound::Data(hi)),
            )
        }
    };

    let mut range = snap_symmetric(vmin, vmax);

    if request.is_log() && range.vmin <= 0. {
        log::warn!(
            "vmin={} is invalid for a log scale, defaulting to {:e} of vmax",
            range.vmin,
            LOG_FLOOR
        );
        range.vmin = range.vmax * LOG_FLOOR;
    }

    let mode = match (request.lin, request.symlog) {
        (true, _) => ScaleMode::Linear,
        (false, Some(symlog)) => ScaleMode::SymLog {
            linthresh: if symlog > 0. {
                symlog
            } else {
                range.vmin.abs().max(range.vmax.abs()) * SYMLOG_THRESHOLD
            },
        },
        (false, None) => ScaleMode::Log,
    };
    log::debug!("colour scale: {} over [{}, {}]", mode, range.vmin, range.vmax);

    Ok(Selection {
        vmin,
        vmax,
        norm: Normalization::new(range, mode),
    })
}

/// Mapping of the values into `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    range: ValueRange,
    mode: ScaleMode,
    levels: Vec<f64>,
    ticks: Vec<f64>,
}
impl Normalization {
    pub fn new(range: ValueRange, mode: ScaleMode) -> Self {
        let (levels, ticks) = match mode {
            ScaleMode::Linear => (
                max_n_levels(range.vmin, range.vmax, N_LEVELS),
                crate::grid::linspace(range.vmin, range.vmax, N_LINEAR_TICKS),
            ),
            ScaleMode::Log => (vec![], log_ticks(range)),
            ScaleMode::SymLog { linthresh } => (vec![], symlog_ticks(range, linthresh)),
        };
        Self {
            range,
            mode,
            levels,
            ticks,
        }
    }
    pub fn range(&self) -> ValueRange {
        self.range
    }
    pub fn mode(&self) -> ScaleMode {
        self.mode
    }
    /// Boundaries of the color bins of the linear scale
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }
    /// Colorbar ticks
    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }
    /// Continuous position of `value` along the colour scale, unclipped
    ///
    /// Returns `None` for values that cannot be represented (NaN, non-positive values on a log scale).
    /// Every value is at `0` on a single valued range.
    pub fn position(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let ValueRange { vmin, vmax } = self.range;
        let (offset, span) = match self.mode {
            ScaleMode::Linear => (value - vmin, vmax - vmin),
            ScaleMode::Log => {
                if value <= 0. {
                    return None;
                }
                (value.log10() - vmin.log10(), vmax.log10() - vmin.log10())
            }
            ScaleMode::SymLog { linthresh } => {
                let f = |x| symlog_transform(x, linthresh);
                (f(value) - f(vmin), f(vmax) - f(vmin))
            }
        };
        // a single valued range maps everything onto the bottom of the colormap
        if span == 0. {
            return offset.is_finite().then_some(0.);
        }
        let t = offset / span;
        t.is_finite().then_some(t)
    }
    /// Value at position `t` along the colour scale, inverse of [Normalization::position]
    pub fn value_at(&self, t: f64) -> f64 {
        let ValueRange { vmin, vmax } = self.range;
        match self.mode {
            ScaleMode::Linear => vmin + t * (vmax - vmin),
            ScaleMode::Log => 10f64.powf(vmin.log10() + t * (vmax.log10() - vmin.log10())),
            ScaleMode::SymLog { linthresh } => {
                let f = |x| symlog_transform(x, linthresh);
                symlog_inverse(f(vmin) + t * (f(vmax) - f(vmin)), linthresh)
            }
        }
    }
    /// Colormap coordinate of `value` in `[0, 1]`
    ///
    /// The linear scale is quantized into the bins of [Normalization::levels].
    pub fn normalize(&self, value: f64) -> Option<f64> {
        match self.mode {
            ScaleMode::Linear if self.levels.len() > 1 => {
                (!value.is_nan()).then(|| boundary_norm(&self.levels, value))
            }
            _ => self.position(value).map(|t| t.clamp(0., 1.)),
        }
    }
    /// Colorbar labels
    ///
    /// With scientific labels on a log scale, the labels are thinned according
    /// to their count relative to the plot `aspect_ratio`.
    pub fn tick_labels(&self, usesci: bool, aspect_ratio: f64) -> Vec<TickLabel> {
        let labels: Vec<String> = self
            .ticks
            .iter()
            .map(|&x| {
                if usesci {
                    format_sci(x)
                } else {
                    format_plain(x)
                }
            })
            .collect();
        let visible = if self.mode == ScaleMode::Log && usesci {
            thin_log_labels(&labels, aspect_ratio)
        } else {
            vec![true; labels.len()]
        };
        self.ticks
            .iter()
            .zip(labels)
            .zip(visible)
            .map(|((&value, text), visible)| TickLabel {
                value,
                text,
                visible,
            })
            .collect()
    }
}

/// Colorbar tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickLabel {
    pub value: f64,
    pub text: String,
    pub visible: bool,
}

fn symlog_transform(x: f64, linthresh: f64) -> f64 {
    let linscale = SYMLOG_LINSCALE / (1. - 0.1);
    if x.abs() > linthresh {
        x.signum() * linthresh * (linscale + (x.abs() / linthresh).log10())
    } else {
        x * linscale
    }
}

fn symlog_inverse(y: f64, linthresh: f64) -> f64 {
    let linscale = SYMLOG_LINSCALE / (1. - 0.1);
    if y.abs() > linthresh * linscale {
        y.signum() * linthresh * 10f64.powf(y.abs() / linthresh - linscale)
    } else {
        y / linscale
    }
}

fn boundary_norm(levels: &[f64], value: f64) -> f64 {
    let n_regions = levels.len() - 1;
    let (first, last) = (levels[0], levels[n_regions]);
    if value >= last {
        return 1.;
    }
    let x = value.max(first);
    let bin = levels.partition_point(|&b| b <= x).saturating_sub(1);
    let color = if N_COLORS > n_regions && n_regions > 1 {
        bin * (N_COLORS - 1) / (n_regions - 1)
    } else {
        bin
    };
    color.min(N_COLORS - 1) as f64 / (N_COLORS - 1) as f64
}

/// "Nice" level boundaries with at most `nbins` intervals covering `[vmin, vmax]`
///
/// The step is the smallest of 1, 2, 2.5, 5 or 10 times a power of ten that
/// fits the range into `nbins` intervals.
pub fn max_n_levels(vmin: f64, vmax: f64, nbins: usize) -> Vec<f64> {
    let (mut lo, mut hi) = (vmin.min(vmax), vmin.max(vmax));
    if !lo.is_finite() || !hi.is_finite() {
        return vec![];
    }
    if hi - lo <= 1e-14 * lo.abs().max(hi.abs()).max(1e-300) {
        let expand = if lo == 0. { 1e-13 } else { 1e-13 * lo.abs() };
        lo -= expand;
        hi += expand;
    }
    let raw_step = (hi - lo) / nbins as f64;
    let scale = 10f64.powf(raw_step.log10().floor());
    let step = [1., 2., 2.5, 5., 10.]
        .iter()
        .map(|s| s * scale)
        .find(|&s| s >= raw_step * (1. - 1e-10))
        .unwrap_or(10. * scale);
    let tol = 1e-10;
    let best_vmin = (lo / step).floor() * step;
    let low = ((lo - best_vmin) / step + tol).floor();
    let high = ((hi - best_vmin) / step - tol).ceil();
    (low as i64..=high as i64)
        .map(|i| i as f64 * step + best_vmin)
        .collect()
}

/// Ticks at `m * 10^k`, `m` in 1 to 9, within the range
pub fn log_ticks(range: ValueRange) -> Vec<f64> {
    let (lo, hi) = range.sorted();
    if lo <= 0. || !lo.is_finite() || !hi.is_finite() {
        return vec![];
    }
    let (kmin, kmax) = (lo.log10().floor() as i32, hi.log10().ceil() as i32);
    let tol = 1e-10;
    (kmin..=kmax)
        .flat_map(|k| (1..10).map(move |m| m as f64 * 10f64.powi(k)))
        .filter(|&x| x >= lo * (1. - tol) && x <= hi * (1. + tol))
        .collect()
}

/// Ticks at the powers of ten from the linear threshold up to the bounds, mirrored on the negative side
pub fn symlog_ticks(range: ValueRange, linthresh: f64) -> Vec<f64> {
    if !(linthresh > 0.
        && linthresh.is_finite()
        && range.vmin.is_finite()
        && range.vmax.is_finite())
    {
        return vec![];
    }
    let logthresh = linthresh.log10().floor() as i32;
    let decades = |bound: f64| -> Vec<f64> {
        if bound > 0. {
            let maxlog = bound.log10().ceil() as i32;
            (logthresh..=maxlog).map(|k| 10f64.powi(k)).collect()
        } else {
            vec![]
        }
    };
    let negative = decades(-range.vmin);
    let positive = decades(range.vmax);
    negative
        .into_iter()
        .rev()
        .map(|x| -x)
        .chain(std::iter::once(0.))
        .chain(positive)
        .collect()
}

/// Leading digits of the labels kept on a crowded log colorbar
fn valid_leading_digits(nlabels: f64) -> Option<&'static [char]> {
    if nlabels > 28. {
        Some(&['1'])
    } else if nlabels > 19. {
        Some(&['1', '2', '5'])
    } else if nlabels > 10. {
        Some(&['1', '2', '3', '4', '5', '6', '8'])
    } else {
        None
    }
}

/// Visibility of the log colorbar labels
///
/// Labels which mantissa leading digit is not in the allowed set are hidden
/// when there are more than 10 labels per unit of aspect ratio.
pub fn thin_log_labels(labels: &[String], aspect_ratio: f64) -> Vec<bool> {
    let nlabels = labels.len() as f64 / aspect_ratio;
    match valid_leading_digits(nlabels) {
        None => vec![true; labels.len()],
        Some(valids) => labels
            .iter()
            .map(|label| {
                label
                    .chars()
                    .find(|c| c.is_ascii_digit())
                    .map_or(false, |c| valids.contains(&c))
            })
            .collect(),
    }
}

/// Scientific label `a.b×10^n`
pub fn format_sci(x: f64) -> String {
    let s = format!("{:.1e}", x);
    match s.split_once('e') {
        Some((mantissa, exponent)) => format!("{}×10^{}", mantissa, exponent),
        None => s,
    }
}

/// Decimal label without trailing zeros
pub fn format_plain(x: f64) -> String {
    if x != 0. && (x.abs() < 1e-3 || x.abs() >= 1e5) {
        return format!("{:e}", x);
    }
    let s = format!("{:.3}", x);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(data: Vec<f64>) -> Field {
        Field::new(1, data.len(), data).unwrap()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9 * b.abs().max(1.), "{} != {}", a, b);
    }

    #[test]
    fn user_overrides_defaults() {
        let request = ScaleRequest::default().vmax(7.).defaults((Some(1.), Some(5.)));
        assert_eq!(
            request.bounds(),
            (Some(Bound::Default(1.)), Some(Bound::User(7.)))
        );
        assert!(!request.needs_data());
        let sel = select(&field(vec![0.5, 100.]), None, &request).unwrap();
        assert_eq!(sel.range(), ValueRange::new(1., 7.));
        assert_eq!(sel.mode(), ScaleMode::Log);
    }

    #[test]
    fn symmetric_snap() {
        let data = field(vec![-3., 0., 1., 3.1, 10.]);
        let mask = Mask::from(vec![true, true, true, true, false]);
        let sel = select(&data, Some(&mask), &ScaleRequest::default().lin()).unwrap();
        assert_eq!(sel.vmin, Bound::Data(-3.));
        assert_eq!(sel.vmax, Bound::Data(3.1));
        assert_eq!(sel.range(), ValueRange::new(-3.1, 3.1));
    }

    #[test]
    fn symmetric_snap_sweep() {
        for (lo, hi) in [(-1., 1.2), (-2.5, 1.8), (-1e-9, 1.3e-9), (-7., 5.5)] {
            let range = snap_symmetric(Bound::Data(lo), Bound::Data(hi));
            let absval = f64::max(-lo, hi);
            assert_eq!(range, ValueRange::new(-absval, absval));
        }
    }

    #[test]
    fn no_snap_when_asymmetric_or_supplied() {
        assert_eq!(
            snap_symmetric(Bound::Data(-1.), Bound::Data(2.)),
            ValueRange::new(-1., 2.)
        );
        assert_eq!(
            snap_symmetric(Bound::User(-3.), Bound::Data(3.1)),
            ValueRange::new(-3., 3.1)
        );
        assert_eq!(
            snap_symmetric(Bound::Data(-3.), Bound::Default(3.1)),
            ValueRange::new(-3., 3.1)
        );
        assert_eq!(
            snap_symmetric(Bound::Data(1.), Bound::Data(3.)),
            ValueRange::new(1., 3.)
        );
    }

    #[test]
    fn inverted_snap_for_positive_lower_bound() {
        assert_eq!(
            snap_symmetric(Bound::Data(3.), Bound::Data(-3.1)),
            ValueRange::new(3.1, -3.1)
        );
    }

    #[test]
    fn log_floor() {
        let sel = select(&field(vec![0., 2., 40.]), None, &ScaleRequest::default()).unwrap();
        assert_eq!(sel.range().vmin, 40. * 1e-5);
        assert_eq!(sel.range().vmax, 40.);
        let sel = select(
            &field(vec![1., 2.]),
            None,
            &ScaleRequest::default().vmin(-5.).vmax(20.),
        )
        .unwrap();
        assert_eq!(sel.range().vmin, 20. * 1e-5);
    }

    #[test]
    fn log_floor_after_snap() {
        let sel = select(&field(vec![-3., 3.1]), None, &ScaleRequest::default()).unwrap();
        assert_eq!(sel.range(), ValueRange::new(3.1 * 1e-5, 3.1));
    }

    #[test]
    fn no_log_floor_for_linear_and_symlog() {
        let data = field(vec![0., 2., 40.]);
        let sel = select(&data, None, &ScaleRequest::default().lin()).unwrap();
        assert_eq!(sel.range().vmin, 0.);
        let sel = select(&data, None, &ScaleRequest::default().symlog(1.)).unwrap();
        assert_eq!(sel.range().vmin, 0.);
    }

    #[test]
    fn symlog_threshold() {
        let data = field(vec![-20., 50.]);
        let sel = select(&data, None, &ScaleRequest::default().symlog(0.)).unwrap();
        assert_eq!(sel.mode(), ScaleMode::SymLog { linthresh: 50. * 1e-2 });
        let sel = select(&data, None, &ScaleRequest::default().symlog(5.)).unwrap();
        assert_eq!(sel.mode(), ScaleMode::SymLog { linthresh: 5. });
        let sel = select(&data, None, &ScaleRequest::default().symlog(5.).lin()).unwrap();
        assert_eq!(sel.mode(), ScaleMode::Linear);
    }

    #[test]
    fn symlog_tick_layout() {
        let ticks = symlog_ticks(ValueRange::new(-200., 5000.), 1.);
        assert_eq!(
            ticks,
            vec![-1000., -100., -10., -1., 0., 1., 10., 100., 1000., 10000.]
        );
        let ticks = symlog_ticks(ValueRange::new(-0.5, 0.5), 0.05);
        let expected = [-1., -0.1, -0.01, 0., 0.01, 0.1, 1.];
        assert_eq!(ticks.len(), expected.len());
        ticks
            .into_iter()
            .zip(expected)
            .for_each(|(tick, expected)| assert_close(tick, expected));
    }

    #[test]
    fn linear_ticks() {
        let norm = Normalization::new(ValueRange::new(0., 10.), ScaleMode::Linear);
        let expected = [0., 1.6667, 3.3333, 5., 6.6667, 8.3333, 10.];
        assert_eq!(norm.ticks().len(), 7);
        for (tick, expected) in norm.ticks().iter().zip(expected) {
            assert!((tick - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn linear_levels() {
        let levels = max_n_levels(0., 10., 255);
        assert!(levels.len() - 1 <= 255);
        assert_close(levels[0], 0.);
        assert_close(*levels.last().unwrap(), 10.);
        assert_close(levels[1] - levels[0], 0.05);
        let levels = max_n_levels(-3.1, 3.1, 255);
        assert!(levels[0] <= -3.1 + 1e-9 && *levels.last().unwrap() >= 3.1 - 1e-9);
    }

    #[test]
    fn boundary_normalization() {
        let norm = Normalization::new(ValueRange::new(0., 10.), ScaleMode::Linear);
        assert_eq!(norm.normalize(-1.), Some(0.));
        assert_eq!(norm.normalize(0.), Some(0.));
        assert_eq!(norm.normalize(10.), Some(1.));
        assert_eq!(norm.normalize(11.), Some(1.));
        assert_eq!(norm.normalize(f64::NAN), None);
        let mid = norm.normalize(5.).unwrap();
        assert!(mid > 0.45 && mid < 0.55);
        assert!(norm.normalize(2.).unwrap() < norm.normalize(2.1).unwrap());
    }

    #[test]
    fn log_normalization() {
        let norm = Normalization::new(ValueRange::new(1., 1000.), ScaleMode::Log);
        assert_close(norm.normalize(10.).unwrap(), 1. / 3.);
        assert_eq!(norm.normalize(0.), None);
        assert_eq!(norm.normalize(1e6), Some(1.));
        assert_eq!(norm.ticks().first(), Some(&1.));
        assert_eq!(norm.ticks().last(), Some(&1000.));
        assert_eq!(norm.ticks().len(), 28);
    }

    #[test]
    fn symlog_normalization() {
        let norm = Normalization::new(
            ValueRange::new(-100., 100.),
            ScaleMode::SymLog { linthresh: 1. },
        );
        assert_close(norm.normalize(0.).unwrap(), 0.5);
        assert_close(norm.normalize(-100.).unwrap(), 0.);
        assert_close(
            norm.normalize(10.).unwrap() - 0.5,
            0.5 - norm.normalize(-10.).unwrap(),
        );
    }

    #[test]
    fn inverse_positions() {
        for mode in [
            ScaleMode::Linear,
            ScaleMode::Log,
            ScaleMode::SymLog { linthresh: 0.5 },
        ] {
            let norm = Normalization::new(ValueRange::new(0.1, 250.), mode);
            for value in [0.1, 0.3, 7., 120., 250.] {
                assert_close(norm.value_at(norm.position(value).unwrap()), value);
            }
        }
        let norm = Normalization::new(
            ValueRange::new(-20., 50.),
            ScaleMode::SymLog { linthresh: 0.5 },
        );
        assert_close(norm.value_at(norm.position(-3.).unwrap()), -3.);
        assert_close(norm.value_at(norm.position(0.2).unwrap()), 0.2);
    }

    #[test]
    fn empty_mask() {
        let data = field(vec![1., 2.]);
        let mask = Mask::from(vec![false, false]);
        assert!(matches!(
            select(&data, Some(&mask), &ScaleRequest::default()),
            Err(ScaleError::EmptyRange)
        ));
        let mask = Mask::from(vec![true]);
        assert!(matches!(
            masked_extrema(&data, Some(&mask)),
            Err(ScaleError::MaskSize { mask: 1, map: 2 })
        ));
        let data = field(vec![f64::NAN, f64::NAN]);
        assert!(matches!(masked_extrema(&data, None), Err(ScaleError::EmptyRange)));
    }

    #[test]
    fn infinite_values() {
        let data = field(vec![-1., 2., f64::INFINITY]);
        let sel = select(&data, None, &ScaleRequest::default().symlog(1e-3)).unwrap();
        assert_eq!(sel.range(), ValueRange::new(-1., 2.));
        let ticks = sel.norm.ticks();
        assert_eq!(ticks.len(), 10);
        assert!(ticks.iter().all(|x| x.is_finite()));
        let data = field(vec![f64::NEG_INFINITY, f64::INFINITY]);
        assert!(matches!(masked_extrema(&data, None), Err(ScaleError::EmptyRange)));
        assert!(symlog_ticks(ValueRange::new(-1., f64::INFINITY), 1e-3).is_empty());
        assert!(symlog_ticks(ValueRange::new(-1., 2.), 0.).is_empty());
    }

    #[test]
    fn single_valued_range() {
        let data = field(vec![5e6; 3]);
        let sel = select(&data, None, &ScaleRequest::default()).unwrap();
        assert_eq!(sel.range(), ValueRange::new(5e6, 5e6));
        assert_eq!(sel.norm.normalize(5e6), Some(0.));
        assert_eq!(sel.norm.ticks(), &[5e6]);
        let norm = Normalization::new(
            ValueRange::new(5e6, 5e6),
            ScaleMode::SymLog { linthresh: 1. },
        );
        assert_eq!(norm.normalize(5e6), Some(0.));
        assert_eq!(norm.normalize(f64::NAN), None);
    }

    #[test]
    fn mask_is_ignored_with_explicit_bounds() {
        let data = field(vec![1., 2.]);
        let mask = Mask::from(vec![false, false]);
        let sel = select(
            &data,
            Some(&mask),
            &ScaleRequest::default().vmin(1.).vmax(2.),
        )
        .unwrap();
        assert_eq!(sel.range(), ValueRange::new(1., 2.));
    }

    #[test]
    fn label_thinning() {
        let labels = |n: usize| -> Vec<String> {
            (0..n).map(|i| format_sci((1 + i % 9) as f64)).collect()
        };
        assert!(thin_log_labels(&labels(10), 1.).iter().all(|&v| v));
        let visible = thin_log_labels(&labels(18), 1.);
        assert!(!visible[6] && !visible[8] && visible[7]);
        let visible = thin_log_labels(&labels(27), 1.);
        assert_eq!(visible.iter().filter(|&&v| v).count(), 9);
        let visible = thin_log_labels(&labels(36), 1.);
        assert_eq!(visible.iter().filter(|&&v| v).count(), 4);
        assert!(thin_log_labels(&labels(36), 4.).iter().all(|&v| v));
    }

    #[test]
    fn tick_labels_thinned_only_on_log_scale() {
        let norm = Normalization::new(ValueRange::new(1e-5, 1.), ScaleMode::Log);
        let labels = norm.tick_labels(true, 1.);
        assert!(labels.iter().any(|l| !l.visible));
        assert!(norm.tick_labels(false, 1.).iter().all(|l| l.visible));
        let norm = Normalization::new(
            ValueRange::new(-1e5, 1e5),
            ScaleMode::SymLog { linthresh: 1e-5 },
        );
        assert!(norm.tick_labels(true, 1.).iter().all(|l| l.visible));
    }

    #[test]
    fn label_formats() {
        assert_eq!(format_sci(1500.), "1.5×10^3");
        assert_eq!(format_sci(-0.02), "-2.0×10^-2");
        assert_eq!(format_plain(1.66666), "1.667");
        assert_eq!(format_plain(5.), "5");
        assert_eq!(format_plain(0.), "0");
    }
}
