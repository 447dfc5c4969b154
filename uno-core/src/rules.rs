use uno_types::{Card, CardColor, CardValue, TurnDirection};

/// Whether `card` may be played on `top` while `active_color` is in force.
///
/// Wilds always match. Otherwise the card must share the active color or the
/// value of the discard top. `active_color` is `None` only when the opening
/// discard was a wild, in which case anything goes.
pub fn is_legal_play(card: &Card, top: &Card, active_color: Option<CardColor>) -> bool {
    if card.is_wild() {
        return true;
    }
    match active_color {
        Some(color) => card.color == color || card.value == top.value,
        None => true,
    }
}

/// Seat reached after moving `steps` seats from `current`
pub fn seat_after(current: usize, steps: usize, direction: TurnDirection, seats: usize) -> usize {
    if seats == 0 {
        return 0;
    }
    let steps = steps % seats;
    match direction {
        TurnDirection::Clockwise => (current + steps) % seats,
        TurnDirection::CounterClockwise => (current + seats - steps) % seats,
    }
}

/// How a played card moves the turn along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnEffect {
    /// Seats to advance after the effect, in the (possibly flipped) direction
    pub advance: usize,
    pub reverses: bool,
    /// Cards the next seat draws before being skipped
    pub penalty: usize,
}

pub fn turn_effect(value: CardValue) -> TurnEffect {
    match value {
        CardValue::Skip => TurnEffect {
            advance: 2,
            reverses: false,
            penalty: 0,
        },
        CardValue::Reverse => TurnEffect {
            advance: 1,
            reverses: true,
            penalty: 0,
        },
        CardValue::DrawTwo | CardValue::WildDrawFour => TurnEffect {
            advance: 2,
            reverses: false,
            penalty: value.penalty(),
        },
        CardValue::Number(_) | CardValue::Wild => TurnEffect {
            advance: 1,
            reverses: false,
            penalty: 0,
        },
    }
}
