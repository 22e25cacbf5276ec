//! 浏览器驱动：用 `gloo-timers` 调度延迟动作。

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use super::dom::{Controls, DomPresenter, DomScoreBoard};
use super::table::Table;
use crate::config::GameConfig;
use crate::game::{CardId, Deferred, GameSession};
use crate::storage::LocalStorageStore;
use crate::utils::to_js_error;

pub type BrowserTable = Table<LocalStorageStore, DomPresenter, DomScoreBoard>;

pub struct BrowserGame {
    table: Rc<RefCell<BrowserTable>>,
}

impl BrowserGame {
    pub fn mount(board_id: &str, config: GameConfig) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("document is unavailable"))?;

        let presenter = DomPresenter::mount(document.clone(), board_id)?;
        let display = DomScoreBoard::mount(&document, presenter.menu())?;
        let store = LocalStorageStore::new(config.storage_key.clone());
        let session = GameSession::new(config, store).map_err(to_js_error)?;

        let table = Rc::new(RefCell::new(Table::new(session, presenter, display)));
        let controls = Self::controls(&table);
        {
            let mut table = table.borrow_mut();
            table.presenter_mut().bind(controls);
            table.open();
        }
        log::info!("memory game mounted on #{board_id}");
        Ok(Self { table })
    }

    pub fn best_score(&self) -> u32 {
        self.table.borrow().session().best_score()
    }

    fn controls(table: &Rc<RefCell<BrowserTable>>) -> Controls {
        let select_handle = Rc::downgrade(table);
        let start_handle = Rc::downgrade(table);
        let restart_handle = Rc::downgrade(table);

        Controls {
            on_select: Rc::new(move |card_id: CardId| select(&select_handle, card_id)),
            on_start: Rc::new(move || {
                if let Some(table) = start_handle.upgrade() {
                    table.borrow_mut().start();
                }
            }),
            on_restart: Rc::new(move || {
                if let Some(table) = restart_handle.upgrade() {
                    if let Err(error) = table.borrow_mut().restart() {
                        log::error!("restart failed: {error}");
                    }
                }
            }),
        }
    }
}

fn select(handle: &Weak<RefCell<BrowserTable>>, card_id: CardId) {
    let Some(table) = handle.upgrade() else {
        return;
    };
    let outcome = table.borrow_mut().select(card_id);
    match outcome {
        Ok(Some(deferred)) => schedule(Rc::downgrade(&table), deferred),
        Ok(None) => {}
        Err(error) => log::error!("selection of card {card_id} failed: {error}"),
    }
}

/// 到期后回调牌桌；回合代数不符的动作由会话丢弃。
fn schedule(handle: Weak<RefCell<BrowserTable>>, deferred: Deferred) {
    spawn_local(async move {
        TimeoutFuture::new(deferred.delay_ms).await;
        if let Some(table) = handle.upgrade() {
            table.borrow_mut().fire(&deferred);
        }
    });
}
