pub mod ai;
pub mod game;
pub mod log;

use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use web_sys::js_sys::Function;

pub use ai::{available_moves, HintAgent, HintStrategy, SwapMove};
pub use game::{
    BattleConfig, BattleState, BoardConfig, BoardEngine, BoardGeometry, BoardMode, BoardPreset,
    BoardSnapshot, ConfigError, GameEvent, GameState, Grid, RuneView, SelectionObserver,
    SwapAction, SwapRejection, TokenType,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn config_to_js_error(error: ConfigError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_config(config_json: Option<String>) -> Result<BoardConfig, JsValue> {
    match config_json {
        Some(json) if !json.trim().is_empty() => {
            serde_json::from_str(&json).map_err(serde_to_js_error)
        }
        _ => Ok(BoardConfig::default()),
    }
}

/// 把选中通知转发给 JS 回调；回调抛出的异常直接忽略。
struct JsSelectionObserver {
    callback: Function,
}

impl SelectionObserver for JsSelectionObserver {
    fn on_selection(&self, center_x: f32, center_y: f32, size_px: f32) {
        let _ = self.callback.call3(
            &JsValue::NULL,
            &JsValue::from_f64(center_x as f64),
            &JsValue::from_f64(center_y as f64),
            &JsValue::from_f64(size_px as f64),
        );
    }
}

#[wasm_bindgen]
pub struct RuneEngine {
    engine: BoardEngine,
}

#[wasm_bindgen]
impl RuneEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, seed: Option<u32>) -> Result<RuneEngine, JsValue> {
        let config = parse_config(config_json)?;
        let engine = match seed {
            Some(seed) => BoardEngine::new(config, seed as u64),
            None => BoardEngine::from_entropy(config),
        }
        .map_err(config_to_js_error)?;
        Ok(RuneEngine { engine })
    }

    /// 每帧调用；返回 true 表示需要重建绘制列表。
    pub fn tick(&mut self, dt: f32) -> bool {
        self.engine.tick(dt)
    }

    pub fn set_viewport(&mut self, width_px: f32, height_px: f32) -> bool {
        self.engine.set_viewport(width_px, height_px)
    }

    pub fn set_geometry(&mut self, left: f32, top: f32, cell_width: f32, cell_height: f32) {
        self.engine
            .set_geometry(BoardGeometry::new(left, top, cell_width, cell_height));
    }

    pub fn pointer_down(&mut self, pointer_id: i32, x: f32, y: f32) -> bool {
        self.engine.pointer_down(pointer_id, x, y)
    }

    pub fn pointer_move(&mut self, pointer_id: i32, x: f32, y: f32) -> bool {
        self.engine.pointer_move(pointer_id, x, y)
    }

    pub fn pointer_up(&mut self, pointer_id: i32, x: f32, y: f32) -> bool {
        self.engine.pointer_up(pointer_id, x, y)
    }

    pub fn pointer_cancel(&mut self, pointer_id: i32) {
        self.engine.pointer_cancel(pointer_id);
    }

    pub fn attempt_swap(&mut self, r1: i32, c1: i32, r2: i32, c2: i32) -> bool {
        self.engine.attempt_swap(r1, c1, r2, c2)
    }

    /// 与 `attempt_swap` 相同，但失败时返回带原因的错误对象。
    pub fn try_swap(&mut self, r1: i32, c1: i32, r2: i32, c2: i32) -> Result<JsValue, JsValue> {
        match self.engine.try_swap(SwapAction::new(r1, c1, r2, c2)) {
            Ok(outcome) => to_value(&outcome).map_err(JsValue::from),
            Err(rejection) => Err(to_value(&rejection)
                .unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))),
        }
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.snapshot()).map_err(serde_to_js_error)
    }

    pub fn draw_list(&self) -> Result<JsValue, JsValue> {
        let runes: Vec<RuneView> = self.engine.runes().collect();
        to_value(&runes).map_err(JsValue::from)
    }

    pub fn is_dirty(&self) -> bool {
        self.engine.is_dirty()
    }

    pub fn mark_clean(&mut self) {
        self.engine.mark_clean();
    }

    pub fn state(&self) -> String {
        self.engine.state().as_str().to_string()
    }

    pub fn battle(&self) -> Result<JsValue, JsValue> {
        to_value(self.engine.battle()).map_err(JsValue::from)
    }

    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.drain_events()).map_err(serde_to_js_error)
    }

    pub fn hint_json(&mut self, strategy: Option<String>) -> Result<String, JsValue> {
        let strategy = strategy
            .as_deref()
            .and_then(|value| HintStrategy::from_str(value).ok())
            .unwrap_or_default();
        serde_json::to_string(&self.engine.hint(strategy)).map_err(serde_to_js_error)
    }

    pub fn has_available_moves(&self) -> bool {
        self.engine.has_available_moves()
    }

    pub fn restart(&mut self, seed: Option<u32>) {
        self.engine.restart(seed.map(u64::from));
    }

    pub fn set_selection_callback(&mut self, callback: Option<Function>) {
        match callback {
            Some(callback) => self
                .engine
                .set_observer(Box::new(JsSelectionObserver { callback })),
            None => self.engine.clear_observer(),
        }
    }
}

/// 返回指定预设（默认 `standard`）的棋盘配置。
#[wasm_bindgen(js_name = "defaultConfig")]
pub fn default_config(preset: Option<String>) -> Result<JsValue, JsValue> {
    let preset = preset
        .as_deref()
        .and_then(|value| BoardPreset::from_str(value).ok())
        .unwrap_or(BoardPreset::Standard);
    to_value(&BoardConfig::from_preset(preset)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateConfig")]
pub fn validate_config(config: JsValue) -> Result<(), JsValue> {
    let config: BoardConfig = from_value(config).map_err(JsValue::from)?;
    config.validate().map_err(config_to_js_error)
}

#[wasm_bindgen(js_name = "setVerboseLogging")]
pub fn set_verbose_logging(enabled: bool) {
    log::set_verbose(enabled);
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
