//! 展示层接口、牌桌以及浏览器实现。

pub mod dom;
pub mod driver;
pub mod presenter;
pub mod table;

pub use dom::{Controls, DomPresenter, DomScoreBoard};
pub use driver::{BrowserGame, BrowserTable};
pub use presenter::{CardVisual, Presenter, ScoreDisplay};
pub use table::Table;
