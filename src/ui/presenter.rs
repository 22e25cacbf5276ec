use crate::game::{Card, CardFace, CardId};

/// 卡牌在界面上的外观。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVisual {
    FaceDown,
    FaceUp(CardFace),
    Matched(CardFace),
}

/// 渲染层：只响应引擎发出的指令，不保存游戏状态。
pub trait Presenter {
    fn render_card(&mut self, card: &Card);
    fn set_card_visual(&mut self, card_id: CardId, visual: CardVisual);
    fn clear_board(&mut self);
    fn show_start_control(&mut self);
    fn show_restart_control(&mut self);
    fn show_win_notice(&mut self, moves: u32);
}

pub trait ScoreDisplay {
    fn set_current_score(&mut self, score: u32);
    fn current_score(&self) -> u32;
    fn set_best_score(&mut self, score: u32);
}
