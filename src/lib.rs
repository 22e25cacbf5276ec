pub mod config;
pub mod game;
pub mod logging;
pub mod storage;
pub mod ui;
pub mod utils;

use std::cell::RefCell;

use log::LevelFilter;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use config::{ConfigError, GameConfig, MAX_BOARD_PAIRS};
pub use game::{
    shuffle, Card, CardFace, CardId, CardState, DeckError, DeckGenerator, Deferred,
    DeferredAction, GameEvent, GameMode, GameSession, Generation, IntegrityError, MatchEngine,
    Round, RuleError, RuleResolution, Selection, SessionError, MAX_PAIRS,
};
pub use storage::{BestScoreStore, LocalStorageStore, MemoryStore, StoreError};
pub use ui::{BrowserGame, CardVisual, Presenter, ScoreDisplay, Table};

use utils::{serde_to_js_error, set_panic_hook, to_js_error};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

thread_local! {
    static MOUNTED: RefCell<Option<BrowserGame>> = RefCell::new(None);
}

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    logging::init(LevelFilter::Info);
}

/// 在页面上挂载完整的 DOM 版游戏。
#[wasm_bindgen(js_name = "mountGame")]
pub fn mount_game(board_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    let config = GameConfig::from_json(config_json.as_deref()).map_err(to_js_error)?;
    logging::init(config.level_filter());
    let game = BrowserGame::mount(board_id, config)?;
    log::info!("best score so far: {}", game.best_score());
    MOUNTED.with(|slot| *slot.borrow_mut() = Some(game));
    Ok(())
}

#[derive(Serialize)]
struct SessionSnapshot<'a> {
    mode: GameMode,
    best_score: u32,
    round: &'a Round,
}

fn events_json(events: &[GameEvent]) -> Result<String, JsValue> {
    serde_json::to_string(events).map_err(serde_to_js_error)
}

/// 无界面的 JSON 接口，由前端自行渲染与计时。
#[wasm_bindgen]
pub struct MemoryGame {
    session: GameSession<LocalStorageStore>,
}

#[wasm_bindgen]
impl MemoryGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<MemoryGame, JsValue> {
        let config = GameConfig::from_json(config_json.as_deref()).map_err(to_js_error)?;
        let store = LocalStorageStore::new(config.storage_key.clone());
        let session = GameSession::new(config, store).map_err(to_js_error)?;
        Ok(MemoryGame { session })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        let snapshot = SessionSnapshot {
            mode: self.session.mode(),
            best_score: self.session.best_score(),
            round: self.session.round(),
        };
        serde_json::to_string(&snapshot).map_err(serde_to_js_error)
    }

    pub fn best_score(&self) -> u32 {
        self.session.best_score()
    }

    pub fn opening_json(&self) -> Result<String, JsValue> {
        events_json(&self.session.opening_events())
    }

    pub fn start(&mut self) -> Result<String, JsValue> {
        events_json(&self.session.start())
    }

    pub fn select_card(&mut self, card_id: u32) -> Result<String, JsValue> {
        let resolution = self.session.select_card(card_id).map_err(to_js_error)?;
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    pub fn resolve_json(&mut self, deferred_json: &str) -> Result<String, JsValue> {
        let deferred: Deferred = serde_json::from_str(deferred_json).map_err(serde_to_js_error)?;
        events_json(&self.session.resolve(&deferred))
    }

    pub fn restart(&mut self) -> Result<String, JsValue> {
        let events = self.session.restart().map_err(to_js_error)?;
        events_json(&events)
    }
}

#[wasm_bindgen(js_name = "generateDeck")]
pub fn generate_deck(pair_count: i32) -> Result<JsValue, JsValue> {
    let pairs = DeckGenerator::checked_pair_count(i64::from(pair_count)).map_err(to_js_error)?;
    let faces = DeckGenerator::new().generate(pairs).map_err(to_js_error)?;
    to_value(&faces).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateRound")]
pub fn validate_round(round: JsValue) -> Result<(), JsValue> {
    let round: Round = from_value(round).map_err(JsValue::from)?;
    round
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}
