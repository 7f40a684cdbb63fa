use crate::clock::Metronome;
use crate::error::EngineError;
use crate::food;
use crate::grid::{Cell, Direction, Grid};
use crate::renderer::{Frame, Renderer};
use crate::scoring::{self, EndReason};
use crate::snake::Snake;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Built but never started.
    Idle,
    Running,
    Paused,
    /// Terminal. Only a fresh engine starts a new game.
    GameOver(EndReason),
}

impl EngineState {
    pub fn is_over(&self) -> bool {
        matches!(self, EngineState::GameOver(_))
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub board_side_px: u32,
    pub cell_size_px: u32,
    pub tick_interval: Duration,
    pub points_per_food: u32,
    pub initial_length: usize,
    /// Score carried in from the host, e.g. when a widget is rebuilt mid-game.
    pub initial_score: u32,
    /// Fixed seed for reproducible food placement.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_side_px: 500,
            cell_size_px: 20,
            tick_interval: Duration::from_millis(100),
            points_per_food: 1,
            initial_length: 3,
            initial_score: 0,
            rng_seed: None,
        }
    }
}

/// Callbacks the engine fires back into its host.
pub struct EngineHooks {
    on_score: Box<dyn FnMut(u32)>,
    on_game_over: Box<dyn FnMut(EndReason)>,
    on_food_eaten: Option<Box<dyn FnMut()>>,
}

impl EngineHooks {
    pub fn new(
        on_score: impl FnMut(u32) + 'static,
        on_game_over: impl FnMut(EndReason) + 'static,
    ) -> Self {
        Self {
            on_score: Box::new(on_score),
            on_game_over: Box::new(on_game_over),
            on_food_eaten: None,
        }
    }

    /// Fired exactly once per food consumed, after the score callback.
    pub fn with_food_eaten(mut self, on_food_eaten: impl FnMut() + 'static) -> Self {
        self.on_food_eaten = Some(Box::new(on_food_eaten));
        self
    }
}

/// The snake game: owns the board, the snake, the food and the tick timer.
///
/// Hosts push input through [`Engine::change_movement`] and the play/pause
/// flag through [`Engine::animate`], and call [`Engine::pump`] from their
/// event loop with a monotonic timestamp. The engine decides when a tick is
/// due, runs it, renders, and reports back through [`EngineHooks`].
pub struct Engine<R: Renderer> {
    grid: Grid,
    snake: Snake,
    food: Option<Cell>,
    score: u32,
    points_per_food: u32,
    state: EngineState,
    metronome: Metronome,
    rng: StdRng,
    hooks: EngineHooks,
    renderer: R,
    closed: bool,
}

impl<R: Renderer> Engine<R> {
    pub fn new(
        mut renderer: R,
        config: EngineConfig,
        hooks: EngineHooks,
        is_playing: bool,
    ) -> Result<Self, EngineError> {
        let grid = Grid::from_canvas(config.board_side_px, config.cell_size_px);
        let length = config.initial_length.max(1);

        // Head starts mid-board with the body trailing to the left, and the
        // board must keep at least one cell free for food.
        let side = grid.side().max(0) as usize;
        let required = (length - 1).checked_mul(2).map_or(usize::MAX, |cells| cells.max(2));
        if side < required {
            return Err(EngineError::BoardTooSmall {
                cells: side,
                required,
            });
        }

        renderer.init().map_err(EngineError::Surface)?;

        let middle = grid.side() / 2;
        let snake = Snake::new(Cell::new(middle, middle), Direction::Right, length);
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let food = food::spawn(&grid, &snake.occupied(), &mut rng).ok();

        log::debug!(
            "engine: new {}x{} board, tick every {:?}, score {}",
            grid.side(),
            grid.side(),
            config.tick_interval,
            config.initial_score
        );

        let mut engine = Self {
            grid,
            snake,
            food,
            score: config.initial_score,
            points_per_food: config.points_per_food,
            state: EngineState::Idle,
            metronome: Metronome::new(config.tick_interval),
            rng,
            hooks,
            renderer,
            closed: false,
        };

        engine.redraw()?;
        engine.animate(is_playing);
        Ok(engine)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tick_interval(&self) -> Duration {
        self.metronome.interval()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Queues a turn for the next tick. Ignored unless the game is running;
    /// reversals are dropped by the snake itself.
    pub fn change_movement(&mut self, direction: Direction) {
        if self.state != EngineState::Running {
            log::debug!("engine: ignoring turn {:?} while {:?}", direction, self.state);
            return;
        }
        if !self.snake.change_movement(direction) {
            log::debug!(
                "engine: rejected reversal {:?} while heading {:?}",
                direction,
                self.snake.heading()
            );
        }
    }

    /// Starts or stops the tick timer. Pausing keeps every piece of game
    /// state; a finished game ignores this entirely.
    pub fn animate(&mut self, is_playing: bool) {
        match (self.state, is_playing) {
            (EngineState::GameOver(_), _) => {
                log::debug!("engine: game over, ignoring animate({})", is_playing);
            }
            (EngineState::Idle | EngineState::Paused, true) => {
                self.metronome.start();
                self.state = EngineState::Running;
                log::debug!("engine: running");
            }
            (EngineState::Running, false) => {
                self.metronome.stop();
                self.state = EngineState::Paused;
                log::debug!("engine: paused");
            }
            _ => {}
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.animate(running);
    }

    /// Runs every tick that fell due by `now` and returns how many ran.
    pub fn pump(&mut self, now: Duration) -> Result<usize, EngineError> {
        if self.closed {
            return Ok(0);
        }
        let due = self.metronome.due_ticks(now);
        let mut ran = 0;
        for _ in 0..due {
            if self.state != EngineState::Running {
                break;
            }
            self.step()?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Draws the current state outside of a tick, e.g. after a pause toggle.
    pub fn redraw(&mut self) -> Result<(), EngineError> {
        let frame = Frame {
            grid: &self.grid,
            snake: &self.snake,
            food: self.food,
            score: self.score,
            state: self.state,
        };
        self.renderer.render(&frame).map_err(EngineError::Render)
    }

    /// Cancels the timer, then releases the surface. Runs once; a closed
    /// engine no longer ticks and dropping it does nothing more.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.metronome.is_armed() {
            self.metronome.stop();
            log::debug!("engine: closed while running, timer cancelled");
        }
        if let Err(err) = self.renderer.cleanup() {
            log::warn!("engine: surface cleanup failed: {}", err);
        }
    }

    fn step(&mut self) -> Result<(), EngineError> {
        let advance = self.snake.advance(self.food, &self.grid);
        let verdict = scoring::judge(advance, self.score, self.points_per_food);
        log::trace!(
            "engine: tick {:?} head {:?} score {}",
            advance,
            self.snake.head(),
            verdict.score
        );

        if let Some(reason) = verdict.game_over {
            self.finish(reason);
        } else if verdict.respawn_food {
            self.score = verdict.score;
            (self.hooks.on_score)(self.score);
            if let Some(on_food_eaten) = self.hooks.on_food_eaten.as_mut() {
                on_food_eaten();
            }

            self.food = None;
            match food::spawn(&self.grid, &self.snake.occupied(), &mut self.rng) {
                Ok(cell) => self.food = Some(cell),
                Err(full) => {
                    log::warn!("engine: {}", full);
                    self.finish(EndReason::BoardFull);
                }
            }
        }

        self.redraw()
    }

    fn finish(&mut self, reason: EndReason) {
        self.metronome.stop();
        self.state = EngineState::GameOver(reason);
        log::info!(
            "engine: game over ({:?}) with score {} and length {}",
            reason,
            self.score,
            self.snake.len()
        );
        (self.hooks.on_game_over)(reason);
    }
}

/// Closes the engine if the host has not already done so.
impl<R: Renderer> Drop for Engine<R> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    const TICK: Duration = Duration::from_millis(100);

    #[derive(Default)]
    struct RecordingRenderer {
        fail_init: bool,
        frames: usize,
        cleanups: usize,
        last_state: Option<EngineState>,
        last_score: Option<u32>,
    }

    impl Renderer for RecordingRenderer {
        fn init(&mut self) -> io::Result<()> {
            if self.fail_init {
                return Err(io::Error::new(io::ErrorKind::NotFound, "canvas not found"));
            }
            Ok(())
        }

        fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
            self.frames += 1;
            self.last_state = Some(frame.state);
            self.last_score = Some(frame.score);
            Ok(())
        }

        fn cleanup(&mut self) -> io::Result<()> {
            self.cleanups += 1;
            Ok(())
        }
    }

    #[derive(Default, Debug)]
    struct Events {
        scores: Vec<u32>,
        game_overs: Vec<EndReason>,
        food_eaten: usize,
    }

    fn hooks(events: &Rc<RefCell<Events>>) -> EngineHooks {
        let scores = events.clone();
        let overs = events.clone();
        let eaten = events.clone();
        EngineHooks::new(
            move |score| scores.borrow_mut().scores.push(score),
            move |reason| overs.borrow_mut().game_overs.push(reason),
        )
        .with_food_eaten(move || eaten.borrow_mut().food_eaten += 1)
    }

    fn config() -> EngineConfig {
        EngineConfig {
            rng_seed: Some(42),
            ..EngineConfig::default()
        }
    }

    fn engine_with(
        config: EngineConfig,
        is_playing: bool,
    ) -> (Engine<RecordingRenderer>, Rc<RefCell<Events>>) {
        let events = Rc::new(RefCell::new(Events::default()));
        let engine = Engine::new(RecordingRenderer::default(), config, hooks(&events), is_playing)
            .unwrap();
        (engine, events)
    }

    /// Anchors the timer at `now`, then advances one interval per tick.
    fn run_ticks(engine: &mut Engine<RecordingRenderer>, now: &mut Duration, ticks: usize) -> usize {
        engine.pump(*now).unwrap();
        let mut ran = 0;
        for _ in 0..ticks {
            *now += TICK;
            ran += engine.pump(*now).unwrap();
        }
        ran
    }

    fn body(engine: &Engine<RecordingRenderer>) -> Vec<Cell> {
        engine.snake().body().iter().copied().collect()
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        /// After game over, neither turns nor play requests touch the game
        #[test]
        fn prop_game_over_is_frozen(
            moves in prop::collection::vec(direction_strategy(), 0..20),
            seed in any::<u64>(),
        ) {
            let (mut engine, events) = engine_with(EngineConfig { rng_seed: Some(seed), ..config() }, true);
            let mut now = Duration::ZERO;
            // Run straight into the right wall
            run_ticks(&mut engine, &mut now, 13);
            prop_assert_eq!(engine.state(), EngineState::GameOver(EndReason::HitWall));

            let snake = engine.snake().clone();
            let food = engine.food();
            let score = engine.score();
            let frames = engine.renderer().frames;

            for direction in moves {
                engine.change_movement(direction);
                engine.animate(true);
                now += TICK * 3;
                prop_assert_eq!(engine.pump(now).unwrap(), 0);
            }

            prop_assert_eq!(engine.snake(), &snake);
            prop_assert_eq!(engine.food(), food);
            prop_assert_eq!(engine.score(), score);
            prop_assert_eq!(engine.renderer().frames, frames);
            prop_assert_eq!(events.borrow().game_overs.len(), 1);
        }

        /// Pausing for any length of time resumes from the exact same game
        #[test]
        fn prop_pause_resume_keeps_state(
            before in 0usize..8,
            paused_ms in 0u64..10_000,
            turn in direction_strategy(),
        ) {
            let (mut engine, _events) = engine_with(config(), true);
            engine.food = Some(Cell::new(0, 0));
            let mut now = Duration::ZERO;
            run_ticks(&mut engine, &mut now, before);
            engine.change_movement(turn);

            let snake = engine.snake().clone();
            let food = engine.food();
            let score = engine.score();

            engine.animate(false);
            prop_assert_eq!(engine.state(), EngineState::Paused);
            now += Duration::from_millis(paused_ms);
            prop_assert_eq!(engine.pump(now).unwrap(), 0);
            engine.animate(true);

            prop_assert_eq!(engine.snake(), &snake);
            prop_assert_eq!(engine.food(), food);
            prop_assert_eq!(engine.score(), score);

            // First tick after resume is a full interval away, and only one runs
            prop_assert_eq!(engine.pump(now).unwrap(), 0);
            prop_assert_eq!(engine.pump(now + TICK - Duration::from_millis(1)).unwrap(), 0);
            prop_assert_eq!(engine.pump(now + TICK).unwrap(), 1);
        }
    }

    #[test]
    fn test_starts_idle_or_running_from_flag() {
        let (mut idle, _) = engine_with(config(), false);
        assert_eq!(idle.state(), EngineState::Idle);
        let mut now = Duration::ZERO;
        assert_eq!(run_ticks(&mut idle, &mut now, 5), 0);

        let (running, _) = engine_with(config(), true);
        assert_eq!(running.state(), EngineState::Running);
        assert_eq!(running.renderer().frames, 1);
        assert_eq!(running.snake().len(), 3);
        assert_eq!(running.grid().side(), 25);
    }

    #[test]
    fn test_initial_food_is_off_the_snake() {
        for seed in 0..50 {
            let (engine, _) = engine_with(EngineConfig { rng_seed: Some(seed), ..config() }, false);
            let food = engine.food().unwrap();
            assert!(engine.grid().contains(food));
            assert!(!engine.snake().contains(food));
        }
    }

    #[test]
    fn test_missing_surface_fails_construction() {
        let events = Rc::new(RefCell::new(Events::default()));
        let renderer = RecordingRenderer {
            fail_init: true,
            ..RecordingRenderer::default()
        };
        let result = Engine::new(renderer, config(), hooks(&events), true);
        assert!(matches!(result, Err(EngineError::Surface(_))));
    }

    #[test]
    fn test_tiny_board_is_rejected() {
        let events = Rc::new(RefCell::new(Events::default()));
        let config = EngineConfig {
            board_side_px: 60,
            cell_size_px: 20,
            initial_length: 3,
            ..config()
        };
        let result = Engine::new(RecordingRenderer::default(), config, hooks(&events), false);
        assert!(matches!(
            result,
            Err(EngineError::BoardTooSmall { cells: 3, required: 4 })
        ));
    }

    #[test]
    fn test_oversized_snake_is_rejected() {
        let events = Rc::new(RefCell::new(Events::default()));
        for length in [1usize << 31, (u32::MAX as usize).saturating_add(4), usize::MAX] {
            let config = EngineConfig {
                initial_length: length,
                ..config()
            };
            let result = Engine::new(RecordingRenderer::default(), config, hooks(&events), false);
            assert!(matches!(
                result,
                Err(EngineError::BoardTooSmall { cells: 25, .. })
            ));
        }
    }

    #[test]
    fn test_tick_moves_every_cell_right() {
        let (mut engine, events) = engine_with(config(), true);
        engine.food = Some(Cell::new(0, 0));
        assert_eq!(body(&engine), vec![Cell::new(12, 12), Cell::new(11, 12), Cell::new(10, 12)]);

        let mut now = Duration::ZERO;
        assert_eq!(run_ticks(&mut engine, &mut now, 1), 1);

        assert_eq!(body(&engine), vec![Cell::new(13, 12), Cell::new(12, 12), Cell::new(11, 12)]);
        assert_eq!(engine.score(), 0);
        assert!(events.borrow().scores.is_empty());
        assert_eq!(engine.renderer().frames, 2);
    }

    #[test]
    fn test_eating_grows_scores_and_respawns() {
        let (mut engine, events) = engine_with(config(), true);
        engine.food = Some(Cell::new(13, 12));

        let mut now = Duration::ZERO;
        run_ticks(&mut engine, &mut now, 1);

        assert_eq!(engine.snake().len(), 4);
        assert_eq!(engine.score(), 1);
        assert_eq!(events.borrow().scores, vec![1]);
        assert_eq!(events.borrow().food_eaten, 1);
        assert_eq!(engine.renderer().last_score, Some(1));

        let food = engine.food().unwrap();
        assert!(!engine.snake().contains(food));
    }

    #[test]
    fn test_initial_score_is_carried() {
        let (mut engine, events) = engine_with(
            EngineConfig {
                initial_score: 7,
                points_per_food: 10,
                ..config()
            },
            true,
        );
        engine.food = Some(Cell::new(13, 12));
        let mut now = Duration::ZERO;
        run_ticks(&mut engine, &mut now, 1);

        assert_eq!(engine.score(), 17);
        assert_eq!(events.borrow().scores, vec![17]);
    }

    #[test]
    fn test_wall_ends_game_once() {
        let (mut engine, events) = engine_with(config(), true);
        engine.food = Some(Cell::new(0, 0));
        let mut now = Duration::ZERO;

        // Head at column 12 on a 25 wide board: 12 moves to reach the edge, the 13th hits
        assert_eq!(run_ticks(&mut engine, &mut now, 12), 12);
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(run_ticks(&mut engine, &mut now, 1), 1);

        assert_eq!(engine.state(), EngineState::GameOver(EndReason::HitWall));
        assert_eq!(engine.snake().head(), Cell::new(24, 12));
        assert_eq!(
            engine.renderer().last_state,
            Some(EngineState::GameOver(EndReason::HitWall))
        );

        assert_eq!(run_ticks(&mut engine, &mut now, 10), 0);
        assert_eq!(events.borrow().game_overs, vec![EndReason::HitWall]);
    }

    #[test]
    fn test_stalled_host_runs_due_ticks_until_game_over() {
        let (mut engine, events) = engine_with(config(), true);
        engine.food = Some(Cell::new(0, 0));
        engine.pump(Duration::ZERO).unwrap();

        let mut now = Duration::ZERO;
        for _ in 0..4 {
            now += TICK * 5;
            engine.pump(now).unwrap();
        }
        // 20 ticks were due but the game ended on the 13th
        assert_eq!(engine.state(), EngineState::GameOver(EndReason::HitWall));
        assert_eq!(engine.renderer().frames, 14);
        assert_eq!(events.borrow().game_overs.len(), 1);
    }

    #[test]
    fn test_biting_body_ends_game() {
        let (mut engine, events) = engine_with(
            EngineConfig {
                initial_length: 5,
                ..config()
            },
            true,
        );
        engine.food = Some(Cell::new(0, 0));
        let mut now = Duration::ZERO;

        for turn in [Direction::Up, Direction::Left, Direction::Down] {
            engine.change_movement(turn);
            run_ticks(&mut engine, &mut now, 1);
        }

        assert_eq!(engine.state(), EngineState::GameOver(EndReason::HitSelf));
        assert_eq!(events.borrow().game_overs, vec![EndReason::HitSelf]);
    }

    #[test]
    fn test_reversal_keeps_heading() {
        let (mut engine, _) = engine_with(config(), true);
        engine.food = Some(Cell::new(0, 0));

        engine.change_movement(Direction::Left);
        let mut now = Duration::ZERO;
        run_ticks(&mut engine, &mut now, 1);

        assert_eq!(engine.snake().heading(), Direction::Right);
        assert_eq!(engine.snake().head(), Cell::new(13, 12));
    }

    #[test]
    fn test_turns_ignored_unless_running() {
        let (mut engine, _) = engine_with(config(), false);
        engine.change_movement(Direction::Up);
        assert_eq!(engine.snake().pending(), None);

        engine.animate(true);
        engine.animate(false);
        engine.change_movement(Direction::Up);
        assert_eq!(engine.snake().pending(), None);

        engine.set_running(true);
        engine.change_movement(Direction::Up);
        assert_eq!(engine.snake().pending(), Some(Direction::Up));
    }

    #[test]
    fn test_pause_while_idle_stays_idle() {
        let (mut engine, _) = engine_with(config(), false);
        engine.animate(false);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_filling_the_board_is_a_win() {
        // 2x2 board, single-cell snake at (1,1) heading right
        let (mut engine, events) = engine_with(
            EngineConfig {
                board_side_px: 40,
                initial_length: 1,
                ..config()
            },
            true,
        );
        let mut now = Duration::ZERO;

        engine.food = Some(Cell::new(1, 0));
        engine.change_movement(Direction::Up);
        run_ticks(&mut engine, &mut now, 1);

        engine.food = Some(Cell::new(0, 0));
        engine.change_movement(Direction::Left);
        run_ticks(&mut engine, &mut now, 1);
        // Only one free cell remains, so the spawner must pick it
        assert_eq!(engine.food(), Some(Cell::new(0, 1)));

        engine.change_movement(Direction::Down);
        run_ticks(&mut engine, &mut now, 1);

        assert_eq!(engine.state(), EngineState::GameOver(EndReason::BoardFull));
        assert_eq!(engine.snake().len(), 4);
        assert_eq!(engine.food(), None);
        assert_eq!(engine.score(), 3);

        let events = events.borrow();
        assert_eq!(events.scores, vec![1, 2, 3]);
        assert_eq!(events.food_eaten, 3);
        assert_eq!(events.game_overs, vec![EndReason::BoardFull]);
    }

    #[test]
    fn test_engine_borrows_surface() {
        let events = Rc::new(RefCell::new(Events::default()));
        let mut surface = RecordingRenderer::default();
        {
            let mut engine = Engine::new(&mut surface, config(), hooks(&events), true).unwrap();
            engine.pump(Duration::ZERO).unwrap();
            engine.pump(TICK).unwrap();
            assert_eq!(engine.renderer().cleanups, 0);
        }
        assert_eq!(surface.frames, 2);
        assert_eq!(surface.cleanups, 1);
    }

    #[test]
    fn test_close_releases_surface_once() {
        let events = Rc::new(RefCell::new(Events::default()));
        let mut surface = RecordingRenderer::default();
        {
            let mut engine = Engine::new(&mut surface, config(), hooks(&events), true).unwrap();
            engine.pump(Duration::ZERO).unwrap();
            engine.close();
            assert_eq!(engine.renderer().cleanups, 1);
            assert_eq!(engine.pump(TICK * 3).unwrap(), 0);

            engine.close();
            assert_eq!(engine.renderer().cleanups, 1);
        }
        assert_eq!(surface.cleanups, 1);
        assert_eq!(surface.frames, 1);
    }
}
