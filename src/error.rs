use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("board of {cells}x{cells} cells is too small, need at least {required} cells per side")]
    BoardTooSmall { cells: usize, required: usize },
    #[error("rendering surface unavailable: {0}")]
    Surface(#[source] io::Error),
    #[error("failed to render frame: {0}")]
    Render(#[source] io::Error),
}
