use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// 回合内卡牌的位置标识。
pub type CardId = u32;
/// 回合代数，用于识别过期的延迟回调。
pub type Generation = u32;

/// 卡牌的身份标识，以 RGB 颜色表示。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CardFace {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl CardFace {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CardFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardState {
    Hidden,
    Revealed,
    Matched,
}

impl Default for CardState {
    fn default() -> Self {
        CardState::Hidden
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub face: CardFace,
    #[serde(default)]
    pub state: CardState,
}

impl Card {
    pub fn new(id: CardId, face: CardFace) -> Self {
        Self {
            id,
            face,
            state: CardState::Hidden,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.state == CardState::Hidden
    }

    pub fn is_matched(&self) -> bool {
        self.state == CardState::Matched
    }
}

/// 当前翻开但尚未配对的卡牌，最多两张。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Selection {
    Empty,
    One { first: CardId },
    Two { first: CardId, second: CardId },
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Empty
    }
}

impl Selection {
    pub fn len(&self) -> usize {
        match self {
            Selection::Empty => 0,
            Selection::One { .. } => 1,
            Selection::Two { .. } => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Selection::Two { .. })
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards().contains(&card_id)
    }

    pub fn cards(&self) -> Vec<CardId> {
        match *self {
            Selection::Empty => Vec::new(),
            Selection::One { first } => vec![first],
            Selection::Two { first, second } => vec![first, second],
        }
    }

    /// 追加一张卡牌，已满时返回 `false` 且保持不变。
    pub fn push(&mut self, card_id: CardId) -> bool {
        *self = match *self {
            Selection::Empty => Selection::One { first: card_id },
            Selection::One { first } => Selection::Two {
                first,
                second: card_id,
            },
            Selection::Two { .. } => return false,
        };
        true
    }

    pub fn clear(&mut self) {
        *self = Selection::Empty;
    }
}

/// 是否接受玩家的选牌操作。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameMode {
    Idle,
    Active,
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Idle
    }
}

/// 游戏事件流，驱动展示层更新。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    CardRevealed {
        card_id: CardId,
        face: CardFace,
    },
    PairMatched {
        first: CardId,
        second: CardId,
        face: CardFace,
    },
    PairMismatched {
        first: CardId,
        second: CardId,
    },
    CardsHidden {
        first: CardId,
        second: CardId,
    },
    MovesChanged {
        moves: u32,
    },
    AllPairsMatched {
        moves: u32,
    },
    RoundWon {
        moves: u32,
    },
    BestScoreImproved {
        previous: u32,
        best: u32,
    },
    RestartOffered,
    BoardCleared {
        generation: Generation,
    },
    RoundDealt {
        generation: Generation,
        cards: Vec<Card>,
    },
    ModeChanged {
        mode: GameMode,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("card at index {index} carries id {card_id}")]
    CardIdMismatch { index: usize, card_id: CardId },
    #[error("selected card {card_id} does not exist")]
    UnknownSelectedCard { card_id: CardId },
    #[error("card {card_id} is selected twice")]
    DuplicateSelection { card_id: CardId },
    #[error("selected card {card_id} is {state:?}, expected Revealed")]
    SelectedCardNotRevealed { card_id: CardId, state: CardState },
    #[error("face {face} appears {count} times")]
    UnpairedFace { face: CardFace, count: usize },
}

/// 一局游戏的全部卡牌、步数与当前选择。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Round {
    pub generation: Generation,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub moves: u32,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub finished: bool,
}

impl Round {
    pub fn new(generation: Generation, faces: Vec<CardFace>) -> Self {
        let cards = faces
            .into_iter()
            .enumerate()
            .map(|(index, face)| Card::new(index as CardId, face))
            .collect();
        Self {
            generation,
            cards,
            moves: 0,
            selection: Selection::Empty,
            finished: false,
        }
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.get(card_id as usize)
    }

    pub fn card_mut(&mut self, card_id: CardId) -> Option<&mut Card> {
        self.cards.get_mut(card_id as usize)
    }

    pub fn set_state(&mut self, card_id: CardId, state: CardState) {
        if let Some(card) = self.card_mut(card_id) {
            card.state = state;
        }
    }

    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_matched()).count()
    }

    /// 所有卡牌均已配对。空牌局视为未完成。
    pub fn is_cleared(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(Card::is_matched)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        for (index, card) in self.cards.iter().enumerate() {
            if card.id as usize != index {
                return Err(IntegrityError::CardIdMismatch {
                    index,
                    card_id: card.id,
                });
            }
        }

        let mut seen = HashSet::new();
        for card_id in self.selection.cards() {
            if !seen.insert(card_id) {
                return Err(IntegrityError::DuplicateSelection { card_id });
            }
            let card = self
                .card(card_id)
                .ok_or(IntegrityError::UnknownSelectedCard { card_id })?;
            if card.state != CardState::Revealed {
                return Err(IntegrityError::SelectedCardNotRevealed {
                    card_id,
                    state: card.state,
                });
            }
        }

        let mut counts: HashMap<CardFace, usize> = HashMap::new();
        for card in &self.cards {
            *counts.entry(card.face).or_default() += 1;
        }
        if let Some((face, count)) = counts.into_iter().find(|(_, count)| *count != 2) {
            return Err(IntegrityError::UnpairedFace { face, count });
        }

        Ok(())
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new(0, Vec::new())
    }
}
