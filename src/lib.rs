use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod deck;
pub mod error;
pub mod game;
pub mod hand;
pub mod logging;
pub mod sim;
pub mod stats;
pub mod strategy;

pub use error::SimulationError;
pub use hand::{hand_value, Rank};
pub use sim::{run_trials, SimulationConfig, SimulationInput};
pub use stats::{AggregateStatistics, SimulationResult};

#[derive(Serialize)]
struct HandValue {
    total: u32,
    soft: bool,
}

#[wasm_bindgen]
pub fn evaluate_hand(cards: &[u8]) -> Result<JsValue, JsValue> {
    let (total, soft) = hand_value(cards);
    serde_wasm_bindgen::to_value(&HandValue { total, soft })
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let level = level
        .parse::<log::LevelFilter>()
        .map_err(|err| JsValue::from_str(&format!("Invalid log level: {err}")))?;
    logging::init(level).map_err(|err| JsValue::from_str(&format!("Logger setup failed: {err}")))
}

#[wasm_bindgen]
pub fn run_simulation(params: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: sim::SimulationInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let result = sim::run(input)
        .map_err(|err| JsValue::from_str(&format!("Simulation failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn run_simulation_with_progress(
    params: &JsValue,
    progress_callback: &Function,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: sim::SimulationInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let progress_cb = |current: u64, total: u64| {
        let _ = progress_callback.call2(
            &JsValue::NULL,
            &JsValue::from(current as f64),
            &JsValue::from(total as f64),
        );
    };

    let result = sim::run_with_progress(input, progress_cb)
        .map_err(|err| JsValue::from_str(&format!("Simulation failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn run_spot_check(params: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: sim::SpotCheckInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let result = sim::run_spot_check(input)
        .map_err(|err| JsValue::from_str(&format!("Spot check failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn play_single_game(params: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: sim::SimulationInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let result = sim::play_single_round(input)
        .map_err(|err| JsValue::from_str(&format!("Game failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}
