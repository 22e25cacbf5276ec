use serde::Serialize;
use thiserror::Error;

use super::deck::{DeckError, DeckGenerator};
use super::rules::{Deferred, DeferredAction, MatchEngine, RuleError, RuleResolution};
use super::state::{CardFace, CardId, GameEvent, GameMode, Generation, IntegrityError, Round};
use crate::config::{ConfigError, GameConfig};
use crate::storage::{BestScoreStore, StoreError};

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Error)]
#[serde(tag = "type", content = "error")]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error("a round needs at least one pair of cards")]
    EmptyBoard,
}

/// 一次游戏会话：模式、当前局、最佳成绩与其存储。
pub struct GameSession<S: BestScoreStore> {
    config: GameConfig,
    engine: MatchEngine,
    deck: DeckGenerator,
    store: S,
    mode: GameMode,
    round: Round,
    best_score: u32,
}

impl<S: BestScoreStore> GameSession<S> {
    pub fn new(config: GameConfig, store: S) -> Result<Self, SessionError> {
        let mut session = Self::assemble(config, store)?;
        session.round = session.deal(1)?;
        Ok(session)
    }

    /// 使用指定卡面开局，后续重开仍由随机牌组生成。
    pub fn with_faces(
        config: GameConfig,
        store: S,
        faces: Vec<CardFace>,
    ) -> Result<Self, SessionError> {
        if faces.is_empty() {
            return Err(SessionError::EmptyBoard);
        }
        let mut session = Self::assemble(config, store)?;
        let round = Round::new(1, faces);
        round.integrity_check()?;
        session.round = round;
        Ok(session)
    }

    fn assemble(config: GameConfig, mut store: S) -> Result<Self, SessionError> {
        config.validate()?;
        let best_score = Self::load_best_score(&mut store, config.default_best_score);
        Ok(Self {
            engine: MatchEngine::new(config.mismatch_delay_ms, config.win_delay_ms),
            deck: DeckGenerator::from_seed(config.seed),
            store,
            mode: GameMode::Idle,
            round: Round::default(),
            best_score,
            config,
        })
    }

    fn load_best_score(store: &mut S, default: u32) -> u32 {
        match store.load() {
            Ok(Some(score)) => return score,
            Ok(None) => log::info!("no best score stored yet, starting at {default}"),
            Err(StoreError::Malformed { raw }) => {
                log::warn!("discarding malformed best score {raw:?}, resetting to {default}")
            }
            Err(error) => {
                log::warn!("best score unavailable ({error}), using {default}");
                return default;
            }
        }
        if let Err(error) = store.save(default) {
            log::warn!("could not initialise best score: {error}");
        }
        default
    }

    fn deal(&mut self, generation: Generation) -> Result<Round, DeckError> {
        let pairs = self.deck.random_pair_count(self.config.pair_range());
        let faces = self.deck.generate(pairs)?;
        log::info!("dealt round {generation} with {pairs} pairs");
        Ok(Round::new(generation, faces))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn moves(&self) -> u32 {
        self.round.moves
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 初次渲染所需的事件。
    pub fn opening_events(&self) -> Vec<GameEvent> {
        vec![
            GameEvent::RoundDealt {
                generation: self.round.generation,
                cards: self.round.cards.clone(),
            },
            GameEvent::MovesChanged {
                moves: self.round.moves,
            },
        ]
    }

    pub fn start(&mut self) -> Vec<GameEvent> {
        if self.mode == GameMode::Active {
            return Vec::new();
        }
        self.mode = GameMode::Active;
        log::info!("game started");
        vec![GameEvent::ModeChanged { mode: self.mode }]
    }

    pub fn select_card(&mut self, card_id: CardId) -> Result<RuleResolution, RuleError> {
        self.engine
            .select_card(&mut self.round, self.mode, card_id)
    }

    pub fn resolve(&mut self, deferred: &Deferred) -> Vec<GameEvent> {
        match deferred.action {
            DeferredAction::HideMismatch { first, second } => {
                self.engine
                    .resolve_mismatch(&mut self.round, deferred.generation, first, second)
            }
            DeferredAction::CompleteRound => self.complete_round(deferred.generation),
        }
    }

    fn complete_round(&mut self, generation: Generation) -> Vec<GameEvent> {
        if generation != self.round.generation || self.round.finished || !self.round.is_cleared()
        {
            log::debug!("dropping stale completion for round {generation}");
            return Vec::new();
        }

        let moves = self.round.moves;
        let mut events = Vec::new();

        if moves < self.best_score {
            let previous = self.best_score;
            self.best_score = moves;
            if let Err(error) = self.store.save(moves) {
                log::warn!("could not persist best score {moves}: {error}");
            }
            events.push(GameEvent::BestScoreImproved {
                previous,
                best: moves,
            });
        }

        log::info!("round {generation} won in {moves} moves");
        events.push(GameEvent::RoundWon { moves });

        self.round.moves = 0;
        self.round.finished = true;
        events.push(GameEvent::MovesChanged { moves: 0 });
        events.push(GameEvent::RestartOffered);
        events
    }

    /// 丢弃当前局并发新牌，随后重新激活。
    pub fn restart(&mut self) -> Result<Vec<GameEvent>, DeckError> {
        let generation = self.round.generation.wrapping_add(1);
        let round = self.deal(generation)?;
        let previous = std::mem::replace(&mut self.round, round);

        let mut events = vec![
            GameEvent::BoardCleared {
                generation: previous.generation,
            },
            GameEvent::RoundDealt {
                generation,
                cards: self.round.cards.clone(),
            },
            GameEvent::MovesChanged { moves: 0 },
        ];
        if self.mode != GameMode::Active {
            self.mode = GameMode::Active;
            events.push(GameEvent::ModeChanged { mode: self.mode });
        }
        Ok(events)
    }
}
