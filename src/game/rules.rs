use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{
    CardId, CardState, GameEvent, GameMode, Generation, IntegrityError, Round, Selection,
};

pub const DEFAULT_MISMATCH_DELAY_MS: u32 = 1000;
pub const DEFAULT_WIN_DELAY_MS: u32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("card {card_id} is not part of this round")]
    CardNotFound { card_id: CardId },
    #[error("round integrity violated: {error}")]
    IntegrityViolation { error: IntegrityError },
}

/// 延迟执行的动作。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DeferredAction {
    HideMismatch { first: CardId, second: CardId },
    CompleteRound,
}

/// 绑定到某一局的延迟回调；局数变化后即失效。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deferred {
    pub generation: Generation,
    pub delay_ms: u32,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RuleResolution {
    pub events: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferred: Option<Deferred>,
}

impl RuleResolution {
    pub fn new(events: Vec<GameEvent>, deferred: Option<Deferred>) -> Self {
        Self { events, deferred }
    }

    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn is_ignored(&self) -> bool {
        self.events.is_empty() && self.deferred.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchEngine {
    mismatch_delay_ms: u32,
    win_delay_ms: u32,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MISMATCH_DELAY_MS, DEFAULT_WIN_DELAY_MS)
    }
}

impl MatchEngine {
    pub fn new(mismatch_delay_ms: u32, win_delay_ms: u32) -> Self {
        Self {
            mismatch_delay_ms,
            win_delay_ms,
        }
    }

    fn ensure_integrity(round: &Round) -> Result<(), RuleError> {
        round
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    /// 不能选中时返回原因；这些情况静默忽略。
    fn ignore_reason(round: &Round, mode: GameMode, state: CardState) -> Option<&'static str> {
        if mode != GameMode::Active {
            return Some("game is not active");
        }
        match state {
            CardState::Revealed => return Some("card already revealed"),
            CardState::Matched => return Some("card already matched"),
            CardState::Hidden => {}
        }
        if round.selection.is_full() {
            return Some("resolution pending");
        }
        None
    }

    pub fn select_card(
        &self,
        round: &mut Round,
        mode: GameMode,
        card_id: CardId,
    ) -> Result<RuleResolution, RuleError> {
        let state = round
            .card(card_id)
            .map(|card| card.state)
            .ok_or(RuleError::CardNotFound { card_id })?;

        if let Some(reason) = Self::ignore_reason(round, mode, state) {
            log::debug!("ignored selection of card {card_id}: {reason}");
            return Ok(RuleResolution::ignored());
        }

        Self::ensure_integrity(round)?;

        let first = match round.selection {
            Selection::Empty => None,
            Selection::One { first } => Some(first),
            Selection::Two { .. } => return Ok(RuleResolution::ignored()),
        };

        round.set_state(card_id, CardState::Revealed);
        round.selection.push(card_id);
        let face = round.cards[card_id as usize].face;

        let mut events = vec![GameEvent::CardRevealed { card_id, face }];
        let Some(first) = first else {
            return Ok(RuleResolution::new(events, None));
        };

        let first_face = round
            .card(first)
            .map(|card| card.face)
            .ok_or(RuleError::CardNotFound { card_id: first })?;

        if first_face == face {
            round.set_state(first, CardState::Matched);
            round.set_state(card_id, CardState::Matched);
            round.selection.clear();
            events.push(GameEvent::PairMatched {
                first,
                second: card_id,
                face,
            });
            log::debug!("matched cards {first} and {card_id}");

            if round.is_cleared() {
                events.push(GameEvent::AllPairsMatched { moves: round.moves });
                let deferred = Deferred {
                    generation: round.generation,
                    delay_ms: self.win_delay_ms,
                    action: DeferredAction::CompleteRound,
                };
                return Ok(RuleResolution::new(events, Some(deferred)));
            }
            return Ok(RuleResolution::new(events, None));
        }

        events.push(GameEvent::PairMismatched {
            first,
            second: card_id,
        });
        let deferred = Deferred {
            generation: round.generation,
            delay_ms: self.mismatch_delay_ms,
            action: DeferredAction::HideMismatch {
                first,
                second: card_id,
            },
        };
        Ok(RuleResolution::new(events, Some(deferred)))
    }

    /// 翻回不匹配的两张牌并计一步。过期或已失配的回调直接丢弃。
    pub fn resolve_mismatch(
        &self,
        round: &mut Round,
        generation: Generation,
        first: CardId,
        second: CardId,
    ) -> Vec<GameEvent> {
        if generation != round.generation {
            log::debug!(
                "dropping stale mismatch callback from round {generation} (current {})",
                round.generation
            );
            return Vec::new();
        }
        if round.selection != (Selection::Two { first, second }) {
            log::warn!("mismatch callback for cards {first}/{second} no longer matches selection");
            return Vec::new();
        }

        for card_id in [first, second] {
            if round.card(card_id).map(|card| card.state) == Some(CardState::Revealed) {
                round.set_state(card_id, CardState::Hidden);
            }
        }
        round.moves += 1;
        round.selection.clear();

        vec![
            GameEvent::CardsHidden { first, second },
            GameEvent::MovesChanged { moves: round.moves },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::CardFace;

    const X: CardFace = CardFace::new(10, 20, 30);
    const Y: CardFace = CardFace::new(200, 100, 0);

    fn setup_round() -> Round {
        Round::new(1, vec![X, Y, X, Y])
    }

    fn hide_pending(engine: &MatchEngine, round: &mut Round, deferred: &Deferred) -> Vec<GameEvent> {
        match deferred.action {
            DeferredAction::HideMismatch { first, second } => {
                engine.resolve_mismatch(round, deferred.generation, first, second)
            }
            DeferredAction::CompleteRound => panic!("expected a mismatch callback"),
        }
    }

    #[test]
    fn first_selection_reveals_card() {
        let engine = MatchEngine::default();
        let mut round = setup_round();

        let resolution = engine
            .select_card(&mut round, GameMode::Active, 0)
            .expect("selection should succeed");

        assert_eq!(
            resolution.events,
            vec![GameEvent::CardRevealed { card_id: 0, face: X }]
        );
        assert!(resolution.deferred.is_none());
        assert_eq!(round.cards[0].state, CardState::Revealed);
        assert_eq!(round.selection, Selection::One { first: 0 });
    }

    #[test]
    fn idle_mode_ignores_selection() {
        let engine = MatchEngine::default();
        let mut round = setup_round();

        let resolution = engine.select_card(&mut round, GameMode::Idle, 0).unwrap();

        assert!(resolution.is_ignored());
        assert_eq!(round, setup_round());
    }

    #[test]
    fn unknown_card_is_an_error() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        assert_eq!(
            engine.select_card(&mut round, GameMode::Active, 9),
            Err(RuleError::CardNotFound { card_id: 9 })
        );
    }

    #[test]
    fn reselecting_revealed_card_is_ignored() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        engine.select_card(&mut round, GameMode::Active, 0).unwrap();
        let snapshot = round.clone();

        let resolution = engine.select_card(&mut round, GameMode::Active, 0).unwrap();

        assert!(resolution.is_ignored());
        assert_eq!(round, snapshot);
    }

    #[test]
    fn matching_pair_is_matched_synchronously() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        engine.select_card(&mut round, GameMode::Active, 0).unwrap();

        let resolution = engine.select_card(&mut round, GameMode::Active, 2).unwrap();

        assert!(resolution.events.contains(&GameEvent::PairMatched {
            first: 0,
            second: 2,
            face: X,
        }));
        assert!(resolution.deferred.is_none(), "round is not cleared yet");
        assert_eq!(round.cards[0].state, CardState::Matched);
        assert_eq!(round.cards[2].state, CardState::Matched);
        assert_eq!(round.moves, 0);
        assert!(round.selection.is_empty());
    }

    #[test]
    fn matched_card_is_never_selectable_again() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        engine.select_card(&mut round, GameMode::Active, 0).unwrap();
        engine.select_card(&mut round, GameMode::Active, 2).unwrap();
        let snapshot = round.clone();

        for card_id in [0, 2] {
            let resolution = engine.select_card(&mut round, GameMode::Active, card_id).unwrap();
            assert!(resolution.is_ignored());
        }
        assert_eq!(round, snapshot);
    }

    #[test]
    fn mismatch_waits_for_deferred_hide() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        engine.select_card(&mut round, GameMode::Active, 0).unwrap();

        let resolution = engine.select_card(&mut round, GameMode::Active, 1).unwrap();
        let deferred = resolution.deferred.expect("mismatch schedules a hide");

        assert_eq!(deferred.delay_ms, DEFAULT_MISMATCH_DELAY_MS);
        assert_eq!(deferred.generation, 1);
        assert_eq!(round.cards[0].state, CardState::Revealed);
        assert_eq!(round.cards[1].state, CardState::Revealed);
        assert_eq!(round.moves, 0);

        let events = hide_pending(&engine, &mut round, &deferred);

        assert_eq!(
            events,
            vec![
                GameEvent::CardsHidden { first: 0, second: 1 },
                GameEvent::MovesChanged { moves: 1 },
            ]
        );
        assert!(round.cards[..2].iter().all(|card| card.is_hidden()));
        assert_eq!(round.moves, 1);
        assert!(round.selection.is_empty());
    }

    #[test]
    fn third_selection_is_dropped_while_pending() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        engine.select_card(&mut round, GameMode::Active, 0).unwrap();
        let deferred = engine
            .select_card(&mut round, GameMode::Active, 1)
            .unwrap()
            .deferred
            .unwrap();
        let snapshot = round.clone();

        let resolution = engine.select_card(&mut round, GameMode::Active, 2).unwrap();
        assert!(resolution.is_ignored());
        assert_eq!(round, snapshot);

        hide_pending(&engine, &mut round, &deferred);
        let resolution = engine.select_card(&mut round, GameMode::Active, 2).unwrap();
        assert!(!resolution.is_ignored(), "selection reopens after resolution");
    }

    #[test]
    fn stale_mismatch_callback_is_ignored() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        engine.select_card(&mut round, GameMode::Active, 0).unwrap();
        engine.select_card(&mut round, GameMode::Active, 1).unwrap();
        round.generation += 1;
        let snapshot = round.clone();

        let events = engine.resolve_mismatch(&mut round, 1, 0, 1);

        assert!(events.is_empty());
        assert_eq!(round, snapshot);
    }

    #[test]
    fn clearing_board_schedules_round_completion() {
        let engine = MatchEngine::new(1000, 250);
        let mut round = Round::new(7, vec![X, X]);
        engine.select_card(&mut round, GameMode::Active, 1).unwrap();

        let resolution = engine.select_card(&mut round, GameMode::Active, 0).unwrap();

        assert!(resolution
            .events
            .contains(&GameEvent::AllPairsMatched { moves: 0 }));
        assert_eq!(
            resolution.deferred,
            Some(Deferred {
                generation: 7,
                delay_ms: 250,
                action: DeferredAction::CompleteRound,
            })
        );
    }

    #[test]
    fn corrupted_round_reports_integrity_violation() {
        let engine = MatchEngine::default();
        let mut round = setup_round();
        round.selection = Selection::One { first: 3 };

        assert!(matches!(
            engine.select_card(&mut round, GameMode::Active, 0),
            Err(RuleError::IntegrityViolation { .. })
        ));
    }
}
