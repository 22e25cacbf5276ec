use crate::game::{CardId, CardState, DeckError, Deferred, GameEvent, GameSession, RuleError};
use crate::storage::BestScoreStore;

use super::presenter::{CardVisual, Presenter, ScoreDisplay};

/// 把会话与展示层绑在一起，负责把事件翻译成界面指令。
pub struct Table<S, P, D>
where
    S: BestScoreStore,
    P: Presenter,
    D: ScoreDisplay,
{
    session: GameSession<S>,
    presenter: P,
    display: D,
}

impl<S, P, D> Table<S, P, D>
where
    S: BestScoreStore,
    P: Presenter,
    D: ScoreDisplay,
{
    pub fn new(session: GameSession<S>, presenter: P, display: D) -> Self {
        Self {
            session,
            presenter,
            display,
        }
    }

    pub fn session(&self) -> &GameSession<S> {
        &self.session
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// 首次渲染牌面、分数与开始按钮。
    pub fn open(&mut self) {
        self.display.set_best_score(self.session.best_score());
        let events = self.session.opening_events();
        self.present(&events);
        self.presenter.show_start_control();
    }

    pub fn start(&mut self) {
        let events = self.session.start();
        self.present(&events);
    }

    /// 返回需要由调用方定时触发的延迟动作。
    pub fn select(&mut self, card_id: CardId) -> Result<Option<Deferred>, RuleError> {
        let resolution = self.session.select_card(card_id)?;
        self.present(&resolution.events);
        Ok(resolution.deferred)
    }

    pub fn fire(&mut self, deferred: &Deferred) {
        let events = self.session.resolve(deferred);
        self.present(&events);
    }

    pub fn restart(&mut self) -> Result<(), DeckError> {
        let events = self.session.restart()?;
        self.present(&events);
        Ok(())
    }

    fn present(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::CardRevealed { card_id, face } => {
                    self.presenter
                        .set_card_visual(*card_id, CardVisual::FaceUp(*face));
                }
                GameEvent::PairMatched {
                    first,
                    second,
                    face,
                } => {
                    for card_id in [*first, *second] {
                        self.presenter
                            .set_card_visual(card_id, CardVisual::Matched(*face));
                    }
                }
                GameEvent::CardsHidden { first, second } => {
                    for card_id in [*first, *second] {
                        self.presenter.set_card_visual(card_id, CardVisual::FaceDown);
                    }
                }
                GameEvent::MovesChanged { moves } => {
                    if self.display.current_score() != *moves {
                        self.display.set_current_score(*moves);
                    }
                }
                GameEvent::BestScoreImproved { best, .. } => self.display.set_best_score(*best),
                GameEvent::RoundWon { moves } => self.presenter.show_win_notice(*moves),
                GameEvent::RestartOffered => self.presenter.show_restart_control(),
                GameEvent::BoardCleared { .. } => self.presenter.clear_board(),
                GameEvent::RoundDealt { cards, .. } => {
                    for card in cards {
                        self.presenter.render_card(card);
                        if card.state != CardState::Hidden {
                            let visual = match card.state {
                                CardState::Matched => CardVisual::Matched(card.face),
                                _ => CardVisual::FaceUp(card.face),
                            };
                            self.presenter.set_card_visual(card.id, visual);
                        }
                    }
                }
                GameEvent::PairMismatched { .. }
                | GameEvent::AllPairsMatched { .. }
                | GameEvent::ModeChanged { .. } => {}
            }
        }
    }
}
