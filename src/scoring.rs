use crate::snake::Advance;

/// Why a game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    HitWall,
    HitSelf,
    /// The snake covers the whole board, so no food can be placed.
    BoardFull,
}

impl EndReason {
    pub fn is_win(&self) -> bool {
        matches!(self, EndReason::BoardFull)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub score: u32,
    pub game_over: Option<EndReason>,
    pub respawn_food: bool,
}

/// Turns the outcome of one snake step into the new score and what the
/// engine has to do next. Each food is worth a flat `points_per_food`.
pub fn judge(advance: Advance, score: u32, points_per_food: u32) -> Verdict {
    match advance {
        Advance::Moved => Verdict {
            score,
            game_over: None,
            respawn_food: false,
        },
        Advance::Ate => Verdict {
            score: score.saturating_add(points_per_food),
            game_over: None,
            respawn_food: true,
        },
        Advance::HitWall => Verdict {
            score,
            game_over: Some(EndReason::HitWall),
            respawn_food: false,
        },
        Advance::HitSelf => Verdict {
            score,
            game_over: Some(EndReason::HitSelf),
            respawn_food: false,
        },
    }
}
