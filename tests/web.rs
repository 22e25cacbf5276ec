#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use memory_match::ui::{Controls, DomPresenter};
use memory_match::{
    BestScoreStore, GameConfig, GameSession, LocalStorageStore, Presenter, StoreError,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn fresh_store(key: &str) -> LocalStorageStore {
    let storage = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .expect("localStorage should exist in the browser");
    storage.remove_item(key).expect("key should be removable");
    LocalStorageStore::new(key)
}

#[wasm_bindgen_test]
fn local_storage_round_trips_best_score() {
    let mut store = fresh_store("memory-match-test-roundtrip");
    assert_eq!(store.load(), Ok(None));

    store.save(12).expect("save should succeed");
    assert_eq!(store.load(), Ok(Some(12)));
}

#[wasm_bindgen_test]
fn session_seeds_sentinel_into_local_storage() {
    let key = "memory-match-test-sentinel";
    let store = fresh_store(key);
    let config = GameConfig::default().with_seed(1);

    let session = GameSession::new(config, store).expect("session should build");

    assert_eq!(session.best_score(), 1000);
    assert_eq!(LocalStorageStore::new(key).load(), Ok(Some(1000)));
}

#[wasm_bindgen_test]
fn garbage_in_local_storage_is_malformed() {
    let key = "memory-match-test-garbage";
    let store = fresh_store(key);
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .expect("localStorage should exist")
        .set_item(key, "oops")
        .expect("set should succeed");

    assert_eq!(
        store.load(),
        Err(StoreError::Malformed {
            raw: "oops".to_string()
        })
    );
}

#[wasm_bindgen_test]
fn control_buttons_hold_a_single_listener() {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .expect("document should exist");
    let board = document.create_element("div").expect("div");
    board.set_id("memory-match-test-board");
    document
        .body()
        .expect("body should exist")
        .append_child(&board)
        .expect("board should attach");

    let mut presenter =
        DomPresenter::mount(document.clone(), "memory-match-test-board").expect("mount");
    let restarts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&restarts);
    presenter.bind(Controls {
        on_select: Rc::new(|_: u32| {}),
        on_start: Rc::new(|| {}),
        on_restart: Rc::new(move || counter.set(counter.get() + 1)),
    });

    presenter.show_start_control();
    for _ in 0..3 {
        presenter.show_restart_control();
    }
    assert_eq!(presenter.live_listeners(), 1);
    assert_eq!(presenter.menu().child_element_count(), 1);

    let button: HtmlElement = presenter
        .menu()
        .first_element_child()
        .expect("restart button")
        .dyn_into()
        .expect("button is an html element");
    button.click();

    assert_eq!(restarts.get(), 1);
    assert_eq!(presenter.menu().child_element_count(), 0);

    presenter.menu().remove();
    board.remove();
}
