pub mod clock;
pub mod engine;
pub mod error;
pub mod food;
pub mod grid;
pub mod high_score;
pub mod renderer;
pub mod scoring;
pub mod session;
pub mod snake;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli_renderer;

#[cfg(target_arch = "wasm32")]
pub mod web_main;
#[cfg(target_arch = "wasm32")]
pub mod web_renderer;

pub use engine::{Engine, EngineConfig, EngineHooks, EngineState};
pub use error::EngineError;
pub use grid::{Cell, Direction, Grid, PixelPoint, PixelRect};
pub use renderer::{Frame, Input, InputQueue, InputSource, Renderer};
pub use scoring::EndReason;
pub use session::{Flow, PumpReport, Session};
pub use snake::{Advance, Snake};

#[cfg(not(target_arch = "wasm32"))]
pub use cli_renderer::{CliInput, CliRenderer, TerminalGuard};
#[cfg(target_arch = "wasm32")]
pub use web_renderer::WebRenderer;
