use crate::engine::EngineState;
use crate::grid::{Cell, Direction, Grid};
use crate::snake::Snake;
use std::collections::VecDeque;
use std::io;

/// Intents produced by a host's input layer. The engine never sees these
/// directly; the host translates them into `change_movement` / `animate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Direction(Direction),
    TogglePause,
    Restart,
    Quit,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub grid: &'a Grid,
    pub snake: &'a Snake,
    pub food: Option<Cell>,
    pub score: u32,
    pub state: EngineState,
}

/// Trait that abstracts the rendering surface.
/// This allows for different rendering backends (CLI, Web, etc.)
pub trait Renderer {
    /// Acquire the surface. Failing here aborts engine construction.
    fn init(&mut self) -> io::Result<()>;

    /// Draw the current frame
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()>;

    /// Host-owned high score to show next to the live score.
    fn show_high_score(&mut self, _high_score: u32) {}

    /// Release the surface and restore terminal/display state
    fn cleanup(&mut self) -> io::Result<()>;
}

/// Lets a host lend a surface to an engine and get it back for the next game.
impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn init(&mut self) -> io::Result<()> {
        (**self).init()
    }

    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        (**self).render(frame)
    }

    fn show_high_score(&mut self, high_score: u32) {
        (**self).show_high_score(high_score)
    }

    fn cleanup(&mut self) -> io::Result<()> {
        (**self).cleanup()
    }
}

pub trait InputSource {
    /// Poll for input from the user
    fn poll_input(&mut self) -> io::Result<Option<Input>>;
}

/// Keys gathered between two polls of an event-driven host.
///
/// Back-to-back turns collapse to the latest one, matching the snake's own
/// single pending turn. Pause, restart and quit are never overwritten.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pending: VecDeque<Input>,
}

impl InputQueue {
    const CAPACITY: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: Input) {
        if matches!(input, Input::Direction(_))
            && matches!(self.pending.back(), Some(Input::Direction(_)))
        {
            self.pending.pop_back();
        }
        if self.pending.len() == Self::CAPACITY {
            self.pending.pop_front();
        }
        self.pending.push_back(input);
    }

    pub fn pop(&mut self) -> Option<Input> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl InputSource for InputQueue {
    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        Ok(self.pop())
    }
}
