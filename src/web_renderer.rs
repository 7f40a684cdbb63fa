use crate::engine::EngineState;
use crate::grid::{Cell, Direction};
use crate::renderer::{Frame, Input, InputQueue, InputSource, Renderer};
use crate::scoring::EndReason;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, KeyboardEvent};

// Colors
const COLOR_BOARD: &str = "#111111";
const COLOR_HEAD: &str = "#7CFC00";
const COLOR_BODY: &str = "#2E8B57";
const COLOR_FOOD: &str = "#FF5555";
const COLOR_UI: &str = "#FFFFFF";
const COLOR_SHADE: &str = "rgba(0, 0, 0, 0.8)";

pub(crate) fn js_to_io(err: JsValue) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{:?}", err))
}

/// Canvas surface. Clones share the same canvas and context.
#[derive(Clone)]
pub struct WebRenderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    window: web_sys::Window,
    board_side_px: f64,
    high_score: u32,
}

impl WebRenderer {
    pub fn new(canvas_id: &str, board_side_px: u32) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self {
            canvas,
            context,
            window,
            board_side_px: board_side_px as f64,
            high_score: 0,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn fill(&self, x: f64, y: f64, width: f64, height: f64, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(x, y, width, height);
    }

    fn draw_cell(&self, frame: &Frame<'_>, cell: Cell, color: &str) {
        let rect = frame.grid.to_pixel(cell);
        // 1px gap keeps segments readable
        self.fill(rect.x + 1.0, rect.y + 1.0, rect.width - 2.0, rect.height - 2.0, color);
    }

    fn text(&self, text: &str, x: f64, y: f64, font: &str, align: &str) -> Result<(), JsValue> {
        self.context.set_font(font);
        self.context.set_text_align(align);
        self.context.fill_text(text, x, y)
    }

    fn draw_ui(&self, frame: &Frame<'_>) -> Result<(), JsValue> {
        let side = frame.grid.side_px();
        let middle = side / 2.0;

        self.context.set_fill_style_str(COLOR_UI);
        self.context.set_text_baseline("top");
        self.text(
            &format!(
                "Score: {}   High Score: {}",
                frame.score,
                self.high_score.max(frame.score)
            ),
            8.0,
            8.0,
            "16px monospace",
            "left",
        )?;

        self.context.set_text_baseline("middle");
        match frame.state {
            EngineState::Running => {}
            EngineState::Idle => {
                self.context.set_fill_style_str(COLOR_UI);
                self.text("Press an arrow key to start", middle, middle, "18px monospace", "center")?;
            }
            EngineState::Paused => {
                self.fill(0.0, middle - 30.0, side, 60.0, COLOR_SHADE);
                self.context.set_fill_style_str(COLOR_UI);
                self.text("PAUSED", middle, middle, "bold 28px monospace", "center")?;
            }
            EngineState::GameOver(reason) => {
                let headline = match reason {
                    EndReason::BoardFull => "BOARD CLEARED",
                    EndReason::HitWall | EndReason::HitSelf => "GAME OVER",
                };
                self.fill(middle - 150.0, middle - 60.0, 300.0, 120.0, COLOR_SHADE);
                self.context.set_fill_style_str(COLOR_UI);
                self.text(headline, middle, middle - 20.0, "bold 32px monospace", "center")?;
                self.text(
                    &format!("Final Score: {}", frame.score),
                    middle,
                    middle + 20.0,
                    "16px monospace",
                    "center",
                )?;
                self.text("Press R to play again", middle, middle + 42.0, "12px monospace", "center")?;
            }
        }
        Ok(())
    }
}

impl Renderer for WebRenderer {
    fn init(&mut self) -> io::Result<()> {
        if !self.canvas.is_connected() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "canvas is not attached"));
        }

        // Internal resolution is scaled for high DPI, CSS size stays in board pixels
        let ratio = self.window.device_pixel_ratio();
        let pixels = (self.board_side_px * ratio) as u32;
        if self.canvas.width() != pixels || self.canvas.height() != pixels {
            self.canvas.set_width(pixels);
            self.canvas.set_height(pixels);

            let element: &HtmlElement = self.canvas.unchecked_ref();
            let css = format!("{}px", self.board_side_px);
            element.style().set_property("width", &css).map_err(js_to_io)?;
            element.style().set_property("height", &css).map_err(js_to_io)?;
        }

        self.context
            .set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)
            .map_err(js_to_io)?;
        self.context.set_image_smoothing_enabled(false);
        Ok(())
    }

    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        self.context
            .clear_rect(0.0, 0.0, self.board_side_px, self.board_side_px);
        let side = frame.grid.side_px();
        self.fill(0.0, 0.0, side, side, COLOR_BOARD);

        if let Some(food) = frame.food {
            self.draw_cell(frame, food, COLOR_FOOD);
        }
        for (index, cell) in frame.snake.body().iter().enumerate() {
            let color = if index == 0 { COLOR_HEAD } else { COLOR_BODY };
            self.draw_cell(frame, *cell, color);
        }

        self.draw_ui(frame).map_err(js_to_io)
    }

    fn show_high_score(&mut self, high_score: u32) {
        self.high_score = high_score;
    }

    fn cleanup(&mut self) -> io::Result<()> {
        // Nothing to release; the canvas belongs to the page
        Ok(())
    }
}

/// WASD and the arrow keys move; Space and Escape toggle pause.
pub fn map_key(key: &str) -> Option<Input> {
    match key {
        "ArrowUp" | "w" | "W" => Some(Input::Direction(Direction::Up)),
        "ArrowDown" | "s" | "S" => Some(Input::Direction(Direction::Down)),
        "ArrowLeft" | "a" | "A" => Some(Input::Direction(Direction::Left)),
        "ArrowRight" | "d" | "D" => Some(Input::Direction(Direction::Right)),
        "Escape" | " " => Some(Input::TogglePause),
        "r" | "R" => Some(Input::Restart),
        _ => None,
    }
}

/// Window-level keyboard listener. Keys pressed between two animation
/// frames are queued; see [`InputQueue`] for how turns collapse.
pub struct WebInput {
    pending_input: Rc<RefCell<InputQueue>>,
}

impl WebInput {
    pub fn new(window: &web_sys::Window) -> Result<Self, JsValue> {
        let pending_input = Rc::new(RefCell::new(InputQueue::new()));
        let target = pending_input.clone();

        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if let Some(input) = map_key(event.key().as_str()) {
                target.borrow_mut().push(input);
                event.prevent_default();
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget(); // Keep listener alive

        Ok(Self { pending_input })
    }
}

impl InputSource for WebInput {
    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        Ok(self.pending_input.borrow_mut().pop())
    }
}
