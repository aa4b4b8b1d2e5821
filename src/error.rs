use std::{io, path::PathBuf};

use crate::{
    colormap::ColormapError, defaults::DefaultsError, grid::GridError, reader::ReaderError,
    render::RenderError, scale::ScaleError, variables::VariableError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("needs a snapshot file name, a reader, or a directory and a step")]
    MissingSource,
    #[error("failed to create the output directory {1:?}")]
    OutputDir(#[source] io::Error, PathBuf),
    #[error("Error in the `reader` module")]
    Reader(#[from] ReaderError),
    #[error("Error in the `grid` module")]
    Grid(#[from] GridError),
    #[error("Error in the `variables` module")]
    Variable(#[from] VariableError),
    #[error("Error in the `scale` module")]
    Scale(#[from] ScaleError),
    #[error("Error in the `colormap` module")]
    Colormap(#[from] ColormapError),
    #[error("Error in the `defaults` module")]
    Defaults(#[from] DefaultsError),
    #[error("Error in the `render` module")]
    Render(#[from] RenderError),
}
pub type Result<T> = std::result::Result<T, Error>;
