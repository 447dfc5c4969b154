use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CardColor {
    Red,
    Blue,
    Green,
    Yellow,
    Wild, // Carried by wild cards until a color is nominated
}

impl CardColor {
    /// The four colors a player can match or nominate
    pub const PLAYABLE: [CardColor; 4] = [
        CardColor::Red,
        CardColor::Blue,
        CardColor::Green,
        CardColor::Yellow,
    ];

    pub fn is_wild(self) -> bool {
        self == CardColor::Wild
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CardValue {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl CardValue {
    /// Cards the next player is forced to draw when this value is played
    pub fn penalty(self) -> usize {
        match self {
            CardValue::DrawTwo => 2,
            CardValue::WildDrawFour => 4,
            _ => 0,
        }
    }

    pub fn is_wild(self) -> bool {
        matches!(self, CardValue::Wild | CardValue::WildDrawFour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Card {
    pub value: CardValue,
    pub color: CardColor,
}

impl Card {
    pub fn new(value: CardValue, color: CardColor) -> Self {
        Self { value, color }
    }

    pub fn number(n: u8, color: CardColor) -> Self {
        Self::new(CardValue::Number(n), color)
    }

    pub fn wild() -> Self {
        Self::new(CardValue::Wild, CardColor::Wild)
    }

    pub fn wild_draw_four() -> Self {
        Self::new(CardValue::WildDrawFour, CardColor::Wild)
    }

    pub fn is_wild(&self) -> bool {
        self.value.is_wild()
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardColor::Red => "red",
            CardColor::Blue => "blue",
            CardColor::Green => "green",
            CardColor::Yellow => "yellow",
            CardColor::Wild => "wild",
        };
        f.write_str(name)
    }
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardValue::Number(n) => write!(f, "{}", n),
            CardValue::Skip => f.write_str("skip"),
            CardValue::Reverse => f.write_str("reverse"),
            CardValue::DrawTwo => f.write_str("draw-two"),
            CardValue::Wild => f.write_str("wild"),
            CardValue::WildDrawFour => f.write_str("wild-draw-four"),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wild() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.color, self.value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCardError(pub String);

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized card component '{}'", self.0)
    }
}

impl std::error::Error for ParseCardError {}

impl FromStr for CardColor {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" => Ok(CardColor::Red),
            "blue" => Ok(CardColor::Blue),
            "green" => Ok(CardColor::Green),
            "yellow" => Ok(CardColor::Yellow),
            "wild" | "none" | "" => Ok(CardColor::Wild),
            other => Err(ParseCardError(other.to_string())),
        }
    }
}

impl FromStr for CardValue {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "skip" => Ok(CardValue::Skip),
            "reverse" => Ok(CardValue::Reverse),
            "draw-two" | "draw2" | "drawtwo" => Ok(CardValue::DrawTwo),
            "wild" => Ok(CardValue::Wild),
            "wild-draw-four" | "wild4" | "wilddrawfour" => Ok(CardValue::WildDrawFour),
            digits => match digits.parse::<u8>() {
                Ok(n) if n <= 9 => Ok(CardValue::Number(n)),
                _ => Err(ParseCardError(normalized)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card_components() {
        assert_eq!("7".parse::<CardValue>(), Ok(CardValue::Number(7)));
        assert_eq!("Draw-Two".parse::<CardValue>(), Ok(CardValue::DrawTwo));
        assert_eq!("wild4".parse::<CardValue>(), Ok(CardValue::WildDrawFour));
        assert!("10".parse::<CardValue>().is_err());
        assert_eq!("RED".parse::<CardColor>(), Ok(CardColor::Red));
        assert!("purple".parse::<CardColor>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let card = Card::new(CardValue::Reverse, CardColor::Green);
        assert_eq!(card.to_string(), "green reverse");
        assert_eq!(Card::wild_draw_four().to_string(), "wild-draw-four");
        assert_eq!(card.value.to_string().parse::<CardValue>(), Ok(card.value));
    }

    #[test]
    fn test_penalties() {
        assert_eq!(CardValue::DrawTwo.penalty(), 2);
        assert_eq!(CardValue::WildDrawFour.penalty(), 4);
        assert_eq!(CardValue::Skip.penalty(), 0);
    }
}
