//! Host-side glue around one engine at a time: the play/pause flag, the
//! displayed score, the high score, and restarts. Terminal and browser
//! front-ends both drive the game through this.

use crate::engine::{Engine, EngineConfig, EngineHooks};
use crate::error::EngineError;
use crate::high_score::{self, HighScoreStore};
use crate::renderer::{Input, Renderer};
use crate::scoring::EndReason;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What happened during one `pump`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub ticks: usize,
    /// Food eaten this pump; hosts hang reward effects off this.
    pub food_eaten: u32,
    pub game_over: Option<EndReason>,
}

/// State the engine callbacks write into and the host reads back.
#[derive(Default)]
struct Shared {
    score: Cell<u32>,
    game_over: Cell<Option<EndReason>>,
    food_eaten: Cell<u32>,
}

pub struct Session<R: Renderer + Clone, S: HighScoreStore> {
    surface: R,
    store: S,
    config: EngineConfig,
    shared: Rc<Shared>,
    engine: Engine<R>,
    high_score: u32,
    is_playing: bool,
    recorded: bool,
    games: u64,
}

impl<R: Renderer + Clone, S: HighScoreStore> Session<R, S> {
    /// Reads the high score once and builds the first, not yet playing, game.
    pub fn start(mut surface: R, mut store: S, config: EngineConfig) -> Result<Self, EngineError> {
        let high_score = store.load().unwrap_or_else(|err| {
            log::warn!("session: could not read high score: {}", err);
            0
        });
        surface.show_high_score(high_score);

        let shared = Rc::new(Shared::default());
        shared.score.set(config.initial_score);
        let engine = Engine::new(
            surface.clone(),
            config.clone(),
            Self::hooks(&shared),
            false,
        )?;

        Ok(Self {
            surface,
            store,
            config,
            shared,
            engine,
            high_score,
            is_playing: false,
            recorded: false,
            games: 1,
        })
    }

    fn hooks(shared: &Rc<Shared>) -> EngineHooks {
        let score = shared.clone();
        let over = shared.clone();
        let eaten = shared.clone();
        EngineHooks::new(
            move |value| score.score.set(value),
            move |reason| over.game_over.set(Some(reason)),
        )
        .with_food_eaten(move || eaten.food_eaten.set(eaten.food_eaten.get() + 1))
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    pub fn score(&self) -> u32 {
        self.shared.score.get()
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn game_over(&self) -> Option<EndReason> {
        self.shared.game_over.get()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn set_playing(&mut self, is_playing: bool) -> Result<(), EngineError> {
        self.is_playing = is_playing;
        self.engine.animate(is_playing);
        self.engine.redraw()
    }

    pub fn handle(&mut self, input: Input) -> Result<Flow, EngineError> {
        match input {
            Input::Direction(direction) => {
                if self.game_over().is_some() {
                    return Ok(Flow::Continue);
                }
                // A movement key also un-pauses, then the turn goes through
                if !self.is_playing {
                    self.set_playing(true)?;
                }
                self.engine.change_movement(direction);
            }
            Input::TogglePause => {
                if self.game_over().is_none() {
                    self.set_playing(!self.is_playing)?;
                }
            }
            Input::Restart => self.restart()?,
            Input::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    pub fn pump(&mut self, now: Duration) -> Result<PumpReport, EngineError> {
        let eaten_before = self.shared.food_eaten.get();
        let ticks = self.engine.pump(now)?;
        let report = PumpReport {
            ticks,
            food_eaten: self.shared.food_eaten.get() - eaten_before,
            game_over: self.game_over(),
        };

        if report.game_over.is_some() && !self.recorded {
            self.recorded = true;
            self.is_playing = false;
            let score = self.score();
            let known = self.high_score;
            self.high_score = match high_score::record_if_higher(&mut self.store, known, score) {
                Ok(best) => best,
                Err(err) => {
                    log::warn!("session: could not save high score: {}", err);
                    self.high_score.max(score)
                }
            };
            self.engine.renderer_mut().show_high_score(self.high_score);
            self.surface.show_high_score(self.high_score);
            self.engine.redraw()?;
        }

        Ok(report)
    }

    /// Closes the current game and builds a fresh one at score 0.
    pub fn restart(&mut self) -> Result<(), EngineError> {
        let shared = Rc::new(Shared::default());
        let config = EngineConfig {
            initial_score: 0,
            rng_seed: self.config.rng_seed.map(|seed| seed.wrapping_add(self.games)),
            ..self.config.clone()
        };
        // The old game lets go of the surface before the new one sets it up
        self.engine.close();
        self.engine = Engine::new(self.surface.clone(), config, Self::hooks(&shared), false)?;
        self.shared = shared;
        self.is_playing = false;
        self.recorded = false;
        self.games += 1;
        log::debug!("session: game {} started", self.games);
        Ok(())
    }
}
