//! WebAssembly bindings for the camel race engine.
//!
//! This module exposes the game engine to JavaScript through wasm-bindgen.
//! Offline play runs its own `GameState` in the browser.

use wasm_bindgen::prelude::*;

use crate::actions::GameAction;
use crate::bot::{Bot, BotDifficulty};
use crate::game::{GameConfig, GameState};

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_json<T: serde::Serialize>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string())
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game from a JSON array of player names and an optional
    /// JSON `GameConfig`
    #[wasm_bindgen(constructor)]
    pub fn new(player_names_json: &str, config_json: Option<String>) -> Result<WasmGame, JsValue> {
        let player_names: Vec<String> = serde_json::from_str(player_names_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid player names: {}", e)))?;

        let config = match config_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?,
            None => GameConfig::default(),
        };

        let state = GameState::with_config(player_names, config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame { state })
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        to_json(&self.state, "{}")
    }

    /// Get the current player ID
    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> u8 {
        self.state.current_player
    }

    #[wasm_bindgen(js_name = getRound)]
    pub fn get_round(&self) -> u32 {
        self.state.round
    }

    /// Get valid actions for a specific player as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self, player: u8) -> String {
        to_json(&self.state.valid_actions(player), "[]")
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, player: u8, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        self.state
            .apply_action(player, action)
            .map(|events| to_json(&events, "[]"))
            .map_err(|e| JsValue::from_str(&format!("Action failed: {}", e)))
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Racing colors from leader to last, as JSON
    #[wasm_bindgen(js_name = getRanking)]
    pub fn get_ranking(&self) -> String {
        to_json(&self.state.ranking(), "[]")
    }

    /// `[player, coins]` pairs, richest first, as JSON
    #[wasm_bindgen(js_name = getStandings)]
    pub fn get_standings(&self) -> String {
        to_json(&self.state.standings(), "[]")
    }

    /// Get the last roll (if any) as JSON
    #[wasm_bindgen(js_name = getLastRoll)]
    pub fn get_last_roll(&self) -> String {
        to_json(&self.state.last_roll, "null")
    }

    /// Get the action log as JSON
    #[wasm_bindgen(js_name = getLog)]
    pub fn get_log(&self) -> String {
        to_json(&self.state.log, "{}")
    }

    /// Get a specific player's state as JSON
    #[wasm_bindgen(js_name = getPlayer)]
    pub fn get_player(&self, player: u8) -> String {
        match self.state.get_player(player) {
            Some(p) => to_json(p, "{}"),
            None => "null".to_string(),
        }
    }

    /// Get a bot's suggested action for a player
    /// difficulty: "Easy", "Medium", or "Hard"
    #[wasm_bindgen(js_name = getBotAction)]
    pub fn get_bot_action(&self, player: u8, difficulty: &str) -> String {
        let diff = match difficulty {
            "Easy" => BotDifficulty::Easy,
            "Hard" => BotDifficulty::Hard,
            _ => BotDifficulty::Medium,
        };

        let mut bot = Bot::new(player, diff);
        match bot.choose_action(&self.state) {
            Some(action) => to_json(&action, "null"),
            None => "null".to_string(),
        }
    }
}
