use crate::engine::EngineState;
use crate::grid::{Cell, Direction};
use crate::renderer::{Frame, Input, InputSource, Renderer};
use crate::scoring::EndReason;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, Write};
use std::time::Duration;

/// Rows under the board used for the score and hints.
pub const INFO_ROWS: u16 = 4;

/// Puts the terminal in raw mode on the alternate screen and restores it on drop.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(
            stdout,
            cursor::Show,
            terminal::LeaveAlternateScreen,
            ResetColor
        );
        let _ = terminal::disable_raw_mode();
    }
}

/// Draws the board with two terminal columns per cell inside a one-cell frame.
#[derive(Debug, Clone)]
pub struct CliRenderer {
    cells: i32,
    high_score: u32,
}

impl CliRenderer {
    pub fn new(cells: i32) -> Self {
        Self {
            cells,
            high_score: 0,
        }
    }

    /// Largest board side that fits a terminal of the given size.
    pub fn fit_cells(term_width: u16, term_height: u16) -> i32 {
        let by_width = (term_width / 2) as i32 - 2;
        let by_height = term_height as i32 - 2 - INFO_ROWS as i32;
        by_width.min(by_height)
    }

    fn draw_cell(&self, frame: &Frame<'_>, cell: Cell, stdout: &mut io::Stdout) -> io::Result<()> {
        if frame.snake.head() == cell {
            queue!(
                stdout,
                SetBackgroundColor(Color::Green),
                SetForegroundColor(Color::Black),
                Print("@@")
            )?;
        } else if frame.snake.contains(cell) {
            queue!(stdout, SetBackgroundColor(Color::DarkGreen), Print("  "))?;
        } else if frame.food == Some(cell) {
            queue!(
                stdout,
                SetBackgroundColor(Color::Black),
                SetForegroundColor(Color::Red),
                Print("()")
            )?;
        } else {
            queue!(stdout, SetBackgroundColor(Color::Black), Print("  "))?;
        }
        Ok(())
    }

    fn draw_border_row(&self, width: i32, stdout: &mut io::Stdout) -> io::Result<()> {
        queue!(stdout, SetBackgroundColor(Color::Blue))?;
        for _ in 0..width + 2 {
            queue!(stdout, Print("  "))?;
        }
        queue!(stdout, ResetColor, Print("\r\n"))?;
        Ok(())
    }

    fn draw_info(&self, frame: &Frame<'_>, stdout: &mut io::Stdout) -> io::Result<()> {
        let top = (frame.grid.side() + 2) as u16;

        queue!(
            stdout,
            cursor::MoveTo(0, top),
            ResetColor,
            terminal::Clear(ClearType::UntilNewLine),
            Print(format!(
                "Score: {}  High Score: {}  Length: {}",
                frame.score,
                self.high_score.max(frame.score),
                frame.snake.len()
            ))
        )?;

        queue!(
            stdout,
            cursor::MoveTo(0, top + 1),
            terminal::Clear(ClearType::UntilNewLine),
            Print("Controls: WASD / Arrow Keys to move | Space/Esc: pause | R: restart | Q: quit")
        )?;

        queue!(stdout, cursor::MoveTo(0, top + 2), terminal::Clear(ClearType::UntilNewLine))?;
        match frame.state {
            EngineState::Idle => {
                queue!(stdout, Print("Press a direction or Space to start"))?;
            }
            EngineState::Paused => {
                queue!(
                    stdout,
                    SetForegroundColor(Color::Yellow),
                    Print("PAUSED - press Space to resume"),
                    ResetColor
                )?;
            }
            EngineState::GameOver(reason) => {
                let (color, headline) = match reason {
                    EndReason::BoardFull => (Color::Green, "BOARD CLEARED!"),
                    EndReason::HitWall | EndReason::HitSelf => (Color::Red, "GAME OVER!"),
                };
                queue!(
                    stdout,
                    SetForegroundColor(color),
                    Print(format!(
                        "{} Final Score: {}  Press R to restart",
                        headline, frame.score
                    )),
                    ResetColor
                )?;
            }
            EngineState::Running => {}
        }

        Ok(())
    }
}

impl Renderer for CliRenderer {
    fn init(&mut self) -> io::Result<()> {
        let (width, height) = terminal::size()?;
        if Self::fit_cells(width, height) < self.cells {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "terminal is {}x{}, too small for a {}x{} board",
                    width, height, self.cells, self.cells
                ),
            ));
        }
        execute!(io::stdout(), terminal::Clear(ClearType::All))
    }

    fn show_high_score(&mut self, high_score: u32) {
        self.high_score = high_score;
    }

    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let mut stdout = io::stdout();
        let side = frame.grid.side();

        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.draw_border_row(side, &mut stdout)?;
        for row in 0..side {
            queue!(stdout, SetBackgroundColor(Color::Blue), Print("  "))?;
            for column in 0..side {
                self.draw_cell(frame, Cell::new(column, row), &mut stdout)?;
            }
            queue!(stdout, SetBackgroundColor(Color::Blue), Print("  "), ResetColor, Print("\r\n"))?;
        }
        self.draw_border_row(side, &mut stdout)?;

        self.draw_info(frame, &mut stdout)?;

        stdout.flush()?;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        execute!(io::stdout(), ResetColor)
    }
}

/// Keyboard input from the terminal.
pub struct CliInput {
    poll_timeout: Duration,
}

impl CliInput {
    pub fn new(poll_timeout: Duration) -> Self {
        Self { poll_timeout }
    }
}

/// WASD and the arrow keys move; Space and Escape toggle pause.
pub fn map_key(code: KeyCode) -> Option<Input> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Input::Direction(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(Input::Direction(Direction::Down))
        }
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(Input::Direction(Direction::Left))
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(Input::Direction(Direction::Right))
        }
        KeyCode::Char(' ') | KeyCode::Esc => Some(Input::TogglePause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Input::Restart),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Input::Quit),
        _ => None,
    }
}

impl InputSource for CliInput {
    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        if event::poll(self.poll_timeout)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                // Some terminals report releases too
                if kind != KeyEventKind::Release {
                    return Ok(map_key(code));
                }
            }
        }
        Ok(None)
    }
}
