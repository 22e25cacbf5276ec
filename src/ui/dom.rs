//! 浏览器 DOM 实现：菜单、分数标签与卡牌网格。

use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use super::presenter::{CardVisual, Presenter, ScoreDisplay};
use crate::game::{Card, CardId};

/// 界面控件回调，点击后转发给牌桌。
#[derive(Clone)]
pub struct Controls {
    pub on_select: Rc<dyn Fn(CardId)>,
    pub on_start: Rc<dyn Fn()>,
    pub on_restart: Rc<dyn Fn()>,
}

pub struct DomPresenter {
    document: Document,
    board: Element,
    menu: Element,
    cards: Vec<HtmlElement>,
    listeners: Vec<Closure<dyn FnMut()>>,
    /// 当前按钮及其点击回调，显示下一个按钮时一并替换。
    button: Option<(Element, Closure<dyn FnMut()>)>,
    controls: Option<Controls>,
}

impl DomPresenter {
    /// 在 `board_id` 所在页面中挂载，菜单插入到 `<h1>` 之后。
    pub fn mount(document: Document, board_id: &str) -> Result<Self, JsValue> {
        let board = document
            .get_element_by_id(board_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{board_id} element")))?;

        let menu = document.create_element("div")?;
        menu.set_id("menu");
        match document.query_selector("h1")? {
            Some(heading) => {
                heading.insert_adjacent_element("afterend", &menu)?;
            }
            None => {
                board.insert_adjacent_element("beforebegin", &menu)?;
            }
        }

        Ok(Self {
            document,
            board,
            menu,
            cards: Vec::new(),
            listeners: Vec::new(),
            button: None,
            controls: None,
        })
    }

    pub fn menu(&self) -> &Element {
        &self.menu
    }

    pub fn bind(&mut self, controls: Controls) {
        self.controls = Some(controls);
    }

    /// 仍由 DOM 持有的点击回调数量。
    pub fn live_listeners(&self) -> usize {
        self.listeners.len() + usize::from(self.button.is_some())
    }

    /// 按钮点击后移除自身。
    fn button(&mut self, label: &str, on_click: Rc<dyn Fn()>) -> Result<Element, JsValue> {
        if let Some((previous, _)) = self.button.take() {
            previous.remove();
        }
        let button = self.document.create_element("button")?;
        button.set_text_content(Some(label));
        button.set_id("start");

        let target = button.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            target.remove();
            on_click();
        });
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        self.button = Some((button.clone(), closure));
        Ok(button)
    }

    fn try_render(&mut self, card: &Card) -> Result<(), JsValue> {
        let element: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        element.class_list().add_1("card")?;
        element.set_attribute("data-card", &card.id.to_string())?;

        if let Some(controls) = &self.controls {
            let on_select = Rc::clone(&controls.on_select);
            let card_id = card.id;
            let closure = Closure::<dyn FnMut()>::new(move || on_select(card_id));
            element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            self.listeners.push(closure);
        }

        self.board.append_child(&element)?;
        self.cards.push(element);
        Ok(())
    }

    fn try_set_visual(&self, card_id: CardId, visual: CardVisual) -> Result<(), JsValue> {
        let Some(element) = self.cards.get(card_id as usize) else {
            log::warn!("no element rendered for card {card_id}");
            return Ok(());
        };
        let style = element.style();
        let classes = element.class_list();
        match visual {
            CardVisual::FaceDown => {
                style.remove_property("background-color")?;
                classes.remove_2("revealed", "matched")?;
            }
            CardVisual::FaceUp(face) => {
                style.set_property("background-color", &face.css())?;
                classes.add_1("revealed")?;
            }
            CardVisual::Matched(face) => {
                style.set_property("background-color", &face.css())?;
                classes.remove_1("revealed")?;
                classes.add_1("matched")?;
            }
        }
        Ok(())
    }

    fn try_show_start(&mut self) -> Result<(), JsValue> {
        let Some(on_start) = self.controls.as_ref().map(|c| Rc::clone(&c.on_start)) else {
            return Ok(());
        };
        let button = self.button("Start", on_start)?;
        self.menu.insert_adjacent_element("afterbegin", &button)?;
        Ok(())
    }

    fn try_show_restart(&mut self) -> Result<(), JsValue> {
        let Some(on_restart) = self.controls.as_ref().map(|c| Rc::clone(&c.on_restart)) else {
            return Ok(());
        };
        let button = self.button("Restart", on_restart)?;
        match self.document.get_element_by_id("score") {
            Some(score) => {
                score.insert_adjacent_element("beforebegin", &button)?;
            }
            None => {
                self.menu.append_child(&button)?;
            }
        }
        Ok(())
    }
}

impl Presenter for DomPresenter {
    fn render_card(&mut self, card: &Card) {
        if let Err(error) = self.try_render(card) {
            log::warn!("failed to render card {}: {error:?}", card.id);
        }
    }

    fn set_card_visual(&mut self, card_id: CardId, visual: CardVisual) {
        if let Err(error) = self.try_set_visual(card_id, visual) {
            log::warn!("failed to update card {card_id}: {error:?}");
        }
    }

    fn clear_board(&mut self) {
        self.board.set_inner_html("");
        self.cards.clear();
        self.listeners.clear();
    }

    fn show_start_control(&mut self) {
        if let Err(error) = self.try_show_start() {
            log::warn!("failed to show start button: {error:?}");
        }
    }

    fn show_restart_control(&mut self) {
        if let Err(error) = self.try_show_restart() {
            log::warn!("failed to show restart button: {error:?}");
        }
    }

    fn show_win_notice(&mut self, moves: u32) {
        let shown = web_sys::window()
            .map(|window| window.alert_with_message(&format!("You won! Score: {moves}")));
        if !matches!(shown, Some(Ok(()))) {
            log::warn!("could not show win notice");
        }
    }
}

/// “Score” 与 “Best Score” 两个标签。
pub struct DomScoreBoard {
    score: Element,
    best: Element,
    current: u32,
}

impl DomScoreBoard {
    pub fn mount(document: &Document, menu: &Element) -> Result<Self, JsValue> {
        let score = labelled_value(document, menu, "Score: ", "score")?;
        let best = labelled_value(document, menu, "Best Score: ", "topscore")?;
        Ok(Self {
            score,
            best,
            current: 0,
        })
    }
}

fn labelled_value(
    document: &Document,
    menu: &Element,
    text: &str,
    id: &str,
) -> Result<Element, JsValue> {
    let label = document.create_element("label")?;
    label.set_text_content(Some(text));
    let value = document.create_element("div")?;
    value.set_id(id);
    value.set_text_content(Some("0"));
    label.append_child(&value)?;
    menu.append_child(&label)?;
    Ok(value)
}

impl ScoreDisplay for DomScoreBoard {
    fn set_current_score(&mut self, score: u32) {
        self.current = score;
        self.score.set_text_content(Some(&score.to_string()));
    }

    fn current_score(&self) -> u32 {
        self.current
    }

    fn set_best_score(&mut self, score: u32) {
        self.best.set_text_content(Some(&score.to_string()));
    }
}
