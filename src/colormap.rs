//! Named colormaps
//!
//! The colormaps are looked up in a [ColormapRegistry] handed over to the
//! panel configuration, a `_r` suffix reverses any registered colormap.

use std::{collections::BTreeMap, fmt};

use colorous::Gradient;

/// Colormap used when none is given
pub const DEFAULT_COLORMAP: &str = "plasma_r";

#[derive(Debug, thiserror::Error)]
pub enum ColormapError {
    #[error("unknown colormap {0:?}")]
    Unknown(String),
}

static BUILTIN: [(&str, Gradient); 15] = [
    ("viridis", colorous::VIRIDIS),
    ("plasma", colorous::PLASMA),
    ("inferno", colorous::INFERNO),
    ("magma", colorous::MAGMA),
    ("cividis", colorous::CIVIDIS),
    ("turbo", colorous::TURBO),
    ("cubehelix", colorous::CUBEHELIX),
    ("warm", colorous::WARM),
    ("cool", colorous::COOL),
    ("spectral", colorous::SPECTRAL),
    ("rdbu", colorous::RED_BLUE),
    ("rdylbu", colorous::RED_YELLOW_BLUE),
    ("greys", colorous::GREYS),
    ("blues", colorous::BLUES),
    ("reds", colorous::REDS),
];

/// A continuous colormap
#[derive(Clone)]
pub struct Colormap {
    name: String,
    gradient: &'static Gradient,
    reversed: bool,
}
impl Colormap {
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Color at `t` in `[0, 1]`
    pub fn eval(&self, t: f64) -> colorous::Color {
        let t = t.clamp(0., 1.);
        self.gradient
            .eval_continuous(if self.reversed { 1. - t } else { t })
    }
}
impl fmt::Debug for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Colormap")
            .field("name", &self.name)
            .field("reversed", &self.reversed)
            .finish()
    }
}

/// Colormaps available to the panels
#[derive(Clone)]
pub struct ColormapRegistry(BTreeMap<String, &'static Gradient>);
impl Default for ColormapRegistry {
    fn default() -> Self {
        Self(
            BUILTIN
                .iter()
                .map(|(name, gradient)| (name.to_string(), gradient))
                .collect(),
        )
    }
}
impl ColormapRegistry {
    /// Empty registry
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }
    /// Adds or replaces a colormap
    pub fn register(mut self, name: impl ToString, gradient: &'static Gradient) -> Self {
        self.0.insert(name.to_string().to_lowercase(), gradient);
        self
    }
    /// Names of the registered colormaps
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }
    /// Looks up a colormap by name, case insensitive
    pub fn get(&self, name: &str) -> Result<Colormap, ColormapError> {
        let key = name.to_lowercase();
        let (base, reversed) = match key.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (key.as_str(), false),
        };
        self.0
            .get(base)
            .map(|&gradient| Colormap {
                name: name.to_string(),
                gradient,
                reversed,
            })
            .ok_or_else(|| ColormapError::Unknown(name.to_string()))
    }
}
impl fmt::Debug for ColormapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
