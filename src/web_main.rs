use crate::engine::EngineConfig;
use crate::high_score::{self, HighScoreStore};
use crate::renderer::InputSource;
use crate::session::Session;
use crate::web_renderer::{js_to_io, WebInput, WebRenderer};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const CANVAS_SIDE_PX: u32 = 500;
const CELL_SIZE_PX: u32 = 20;
const REWARD_FLASH_MS: f64 = 150.0;

/// localStorage key the high score lives under.
pub const HIGH_SCORE_KEY: &str = "high-score";

pub struct LocalStorageHighScore {
    storage: web_sys::Storage,
}

impl LocalStorageHighScore {
    pub fn new(window: &web_sys::Window) -> Result<Self, JsValue> {
        let storage = window.local_storage()?.ok_or("no localStorage")?;
        Ok(Self { storage })
    }
}

impl HighScoreStore for LocalStorageHighScore {
    fn load(&mut self) -> io::Result<u32> {
        match self.storage.get_item(HIGH_SCORE_KEY).map_err(js_to_io)? {
            Some(raw) => Ok(high_score::parse_stored(&raw)),
            None => {
                self.save(0)?;
                Ok(0)
            }
        }
    }

    fn save(&mut self, score: u32) -> io::Result<()> {
        self.storage
            .set_item(HIGH_SCORE_KEY, &score.to_string())
            .map_err(js_to_io)
    }
}

struct GameLoop {
    session: Session<WebRenderer, LocalStorageHighScore>,
    input: WebInput,
    canvas: web_sys::HtmlCanvasElement,
    flash_until: Option<f64>,
}

impl GameLoop {
    fn new(canvas_id: &str) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let renderer = WebRenderer::new(canvas_id, CANVAS_SIDE_PX)?;
        let canvas = renderer.canvas().clone();
        let store = LocalStorageHighScore::new(&window)?;
        let input = WebInput::new(&window)?;

        let config = EngineConfig {
            board_side_px: CANVAS_SIDE_PX,
            cell_size_px: CELL_SIZE_PX,
            ..EngineConfig::default()
        };
        let session = Session::start(renderer, store, config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self {
            session,
            input,
            canvas,
            flash_until: None,
        })
    }

    fn set_flash(&self, on: bool) -> Result<(), JsValue> {
        let element: &web_sys::HtmlElement = self.canvas.unchecked_ref();
        let filter = if on { "brightness(1.5)" } else { "none" };
        element.style().set_property("filter", filter)
    }

    fn update_frame(&mut self, now_ms: f64) -> Result<(), JsValue> {
        while let Some(input) = self
            .input
            .poll_input()
            .map_err(|e| JsValue::from_str(&e.to_string()))?
        {
            self.session
                .handle(input)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
        }

        let now = Duration::from_secs_f64(now_ms.max(0.0) / 1000.0);
        let report = self
            .session
            .pump(now)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        // Reward effect lives here, outside the engine
        if report.food_eaten > 0 {
            self.set_flash(true)?;
            self.flash_until = Some(now_ms + REWARD_FLASH_MS);
        } else if matches!(self.flash_until, Some(until) if now_ms >= until) {
            self.set_flash(false)?;
            self.flash_until = None;
        }

        if let Some(reason) = report.game_over.filter(|_| report.ticks > 0) {
            web_sys::console::log_1(
                &format!(
                    "[WASM] Game over ({:?}), score {}, high score {}",
                    reason,
                    self.session.score(),
                    self.session.high_score()
                )
                .into(),
            );
        }

        Ok(())
    }
}

#[wasm_bindgen]
pub fn start_game(canvas_id: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    web_sys::console::log_1(&"[WASM] Starting snake...".into());
    let game_loop = match GameLoop::new(canvas_id) {
        Ok(gl) => Rc::new(RefCell::new(gl)),
        Err(e) => {
            web_sys::console::error_1(&format!("[WASM] Failed to create game loop: {:?}", e).into());
            return Err(e);
        }
    };

    let window = web_sys::window().ok_or("no window")?;
    let performance = window.performance().ok_or("no performance")?;

    // requestAnimationFrame only drives polling; the engine keeps its own fixed tick rate
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let game_loop_clone = game_loop.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let current_time = performance.now();

        if let Err(e) = game_loop_clone.borrow_mut().update_frame(current_time) {
            web_sys::console::error_1(&e);
            return; // Stop loop on error
        }

        let next = web_sys::window().and_then(|window| {
            let callback = f.borrow();
            let callback = callback.as_ref()?;
            window
                .request_animation_frame(callback.as_ref().unchecked_ref())
                .ok()
        });
        if next.is_none() {
            web_sys::console::error_1(&"[WASM] Could not schedule next frame".into());
        }
    }) as Box<dyn FnMut()>));

    {
        let callback = g.borrow();
        let callback = callback.as_ref().ok_or("animation callback missing")?;
        window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    }

    web_sys::console::log_1(&"[WASM] Game loop started".into());
    Ok(())
}
