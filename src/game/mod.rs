//! 游戏核心逻辑模块（牌组生成、配对规则、会话）。

pub mod deck;
pub mod rules;
pub mod session;
pub mod state;

pub use deck::{shuffle, DeckError, DeckGenerator, MAX_PAIRS};
pub use rules::{
    Deferred, DeferredAction, MatchEngine, RuleError, RuleResolution, DEFAULT_MISMATCH_DELAY_MS,
    DEFAULT_WIN_DELAY_MS,
};
pub use session::{GameSession, SessionError};
pub use state::{
    Card,
    CardFace,
    CardId,
    CardState,
    GameEvent,
    GameMode,
    Generation,
    IntegrityError,
    Round,
    Selection,
};
