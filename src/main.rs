#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

// The browser build enters through `snakes::web_main::start_game` instead.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use anyhow::{Context, Result};
    use clap::Parser;
    use crossterm::terminal;
    use directories::ProjectDirs;
    use snakes::high_score::FileHighScore;
    use snakes::{CliInput, CliRenderer, EngineConfig, Flow, InputSource, Session, TerminalGuard};
    use std::fs::File;
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    const MAX_CELLS: i32 = 25;
    const CELL_SIZE_PX: u32 = 20;
    // Upper bound on how late a due tick can start
    const INPUT_POLL: Duration = Duration::from_millis(5);

    /// Snake in the terminal.
    #[derive(Debug, Parser)]
    #[command(author, version, about, long_about = None)]
    struct CliArgs {
        /// Board side in cells. Defaults to the largest board, up to 25, that fits the terminal.
        #[arg(long, value_name = "CELLS", value_parser = clap::value_parser!(u32).range(4..=100))]
        cells: Option<u32>,
        /// Milliseconds between game ticks. Smaller values make the snake faster.
        #[arg(
            long = "tick-ms",
            value_name = "MILLISECONDS",
            default_value_t = 100,
            value_parser = clap::value_parser!(u64).range(1..=2_000)
        )]
        tick_ms: u64,
        /// Seed for food placement, for reproducible games.
        #[arg(long, value_name = "U64")]
        seed: Option<u64>,
        /// File holding the high score. Defaults to the user's local data directory.
        #[arg(long, value_name = "PATH")]
        high_score_file: Option<PathBuf>,
        /// Write logs to this file; filter with RUST_LOG.
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,
    }

    fn default_high_score_path() -> PathBuf {
        ProjectDirs::from("com", "snakes", "snakes")
            .map(|dirs| dirs.data_local_dir().join("high-score"))
            .unwrap_or_else(|| PathBuf::from(".snakes-high-score"))
    }

    /// The terminal is in raw mode on the alternate screen, so logs only go to a file.
    fn init_logging(path: Option<&Path>) -> Result<()> {
        let Some(path) = path else {
            return Ok(());
        };
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
        Ok(())
    }

    pub fn run() -> Result<()> {
        let args = CliArgs::parse();
        init_logging(args.log_file.as_deref())?;

        let (term_width, term_height) = terminal::size().context("failed to read terminal size")?;
        let cells = match args.cells {
            Some(cells) => cells as i32,
            None => CliRenderer::fit_cells(term_width, term_height).clamp(0, MAX_CELLS),
        };

        let config = EngineConfig {
            board_side_px: cells as u32 * CELL_SIZE_PX,
            cell_size_px: CELL_SIZE_PX,
            tick_interval: Duration::from_millis(args.tick_ms),
            rng_seed: args.seed,
            ..EngineConfig::default()
        };
        let store = FileHighScore::new(
            args.high_score_file
                .unwrap_or_else(default_high_score_path),
        );
        log::info!(
            "starting {}x{} board, tick {} ms, high score file {}",
            cells,
            cells,
            args.tick_ms,
            store.path().display()
        );

        let guard = TerminalGuard::enter().context("failed to prepare terminal")?;
        let result = play(cells, config, store);
        // Restore the terminal before anyhow prints any error
        drop(guard);
        result
    }

    fn play(cells: i32, config: EngineConfig, store: FileHighScore) -> Result<()> {
        let mut session = Session::start(CliRenderer::new(cells), store, config)
            .context("failed to start game")?;
        let mut input = CliInput::new(INPUT_POLL);
        let epoch = Instant::now();

        loop {
            if let Some(key) = input.poll_input().context("failed to read input")? {
                if session.handle(key)? == Flow::Quit {
                    break;
                }
            }

            let report = session.pump(epoch.elapsed())?;
            if report.food_eaten > 0 {
                let mut stdout = io::stdout();
                stdout.write_all(b"\x07")?;
                stdout.flush()?;
            }
        }

        log::info!(
            "quit with score {}, high score {}",
            session.score(),
            session.high_score()
        );
        Ok(())
    }
}
