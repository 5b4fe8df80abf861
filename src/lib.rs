//! Mole Keys core crate.
//!
//! A whack-a-mole reflex game on a virtual QWERTY keyboard: animal "moles"
//! pop up on letter keys and the player must press the matching physical key
//! before the deadline. One configurable engine covers all three play modes
//! (classic single target, countdown auto-advance, multi-target frenzy); the
//! catalog, scheduler, and engine are pure Rust and test natively, while
//! `ui` binds them to the browser through wasm-bindgen.

use wasm_bindgen::prelude::*;

pub mod catalog;
pub mod engine;
pub mod scheduler;
mod ui;

pub use catalog::{ANIMALS, Animal, animal_for, audio_identifier, audio_url, pick_random};
pub use engine::{
    ActiveTarget, CORRECT_CUE, Command, EngineConfig, MoleEngine, RESPAWN_DEBOUNCE_MS, Snapshot,
    WRONG_KEY_DISPLAY_MS,
};
pub use scheduler::{Scheduler, TimerHandle};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Launch the default (classic) game mode.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    ui::launch("classic")
}

/// Launch a specific game mode: "classic", "countdown", or "frenzy".
/// Unknown names fall back to classic.
#[wasm_bindgen]
pub fn start_game_mode(mode: &str) -> Result<(), JsValue> {
    ui::launch(mode)
}
