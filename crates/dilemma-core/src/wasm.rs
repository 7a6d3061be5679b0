//! WASM bindings for a browser frontend
//!
//! Arguments and results cross the boundary as JSON. Strategy names are
//! resolved through the built-in catalog.

#![cfg(feature = "wasm")]

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::catalog;
use crate::{EvolutionConfig, EvolutionEngine, MatchConfig, MatchSimulator, SeededRng};
use crate::{Tournament, TournamentConfig};

/// Parse a JSON config, an empty string meaning "all defaults"
fn parse_config<T: DeserializeOwned + Default>(json: &str) -> Result<T, JsError> {
    if json.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid config: {}", e)))
}

/// Parse a JSON array of strategy names
fn parse_names(json: &str) -> Result<Vec<String>, JsError> {
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid strategy list: {}", e)))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Play a single match with full round-by-round details
///
/// # Arguments
/// * `strategy_a` - Built-in strategy name for player A
/// * `strategy_b` - Built-in strategy name for player B
/// * `config_json` - JSON `MatchConfig` (`{"rounds": 100, "noise": 0.05}`)
/// * `seed` - Match seed
///
/// # Returns
/// Serialized MatchResult
#[wasm_bindgen]
pub fn play_match(
    strategy_a: &str,
    strategy_b: &str,
    config_json: &str,
    seed: u64,
) -> Result<JsValue, JsError> {
    let config: MatchConfig = parse_config(config_json)?;
    let mut agent_a = catalog::agent(strategy_a).map_err(|e| JsError::new(&e.to_string()))?;
    let mut agent_b = catalog::agent(strategy_b).map_err(|e| JsError::new(&e.to_string()))?;

    let simulator = MatchSimulator::new(config).map_err(|e| JsError::new(&e.to_string()))?;
    let result = simulator.play(agent_a.as_mut(), agent_b.as_mut(), SeededRng::new(seed));

    to_js(&result)
}

/// Run a round-robin tournament
///
/// `names_json` is a JSON array of built-in names; `config_json` a
/// `TournamentConfig`. Returns the serialized Leaderboard.
#[wasm_bindgen]
pub fn run_tournament(names_json: &str, config_json: &str) -> Result<JsValue, JsError> {
    let names = parse_names(names_json)?;
    let config: TournamentConfig = parse_config(config_json)?;

    let registry = catalog::registry(&names).map_err(|e| JsError::new(&e.to_string()))?;
    let leaderboard = Tournament::new(config)
        .and_then(|t| t.run(&registry))
        .map_err(|e| JsError::new(&e.to_string()))?;

    to_js(&leaderboard)
}

/// Run an evolutionary simulation
///
/// `names_json` is a JSON array of built-in names; `config_json` an
/// `EvolutionConfig`. Returns the serialized list of GenerationRecords.
#[wasm_bindgen]
pub fn run_evolution(names_json: &str, config_json: &str) -> Result<JsValue, JsError> {
    let names = parse_names(names_json)?;
    let config: EvolutionConfig = parse_config(config_json)?;

    let registry = catalog::registry(&names).map_err(|e| JsError::new(&e.to_string()))?;
    let records = EvolutionEngine::new(config)
        .and_then(|engine| engine.run(&registry))
        .map_err(|e| JsError::new(&e.to_string()))?;

    to_js(&records)
}

#[derive(serde::Serialize)]
struct StrategyInfo {
    name: &'static str,
    description: &'static str,
}

/// Get all available built-in strategies with descriptions
#[wasm_bindgen]
pub fn get_strategy_types() -> Result<JsValue, JsError> {
    let types: Vec<StrategyInfo> = catalog::names()
        .map(|name| StrategyInfo {
            name,
            description: catalog::describe(name).unwrap_or_default(),
        })
        .collect();

    to_js(&types)
}
