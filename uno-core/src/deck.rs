//! Deck composition, shuffling and the draw/discard piles of a single game.
//!
//! Randomness never comes from global state: every shuffle takes an explicit
//! RNG, and the piles of a game derive theirs from the game's seed plus the
//! number of shuffles performed so far. Replaying a game with the same seed and
//! the same moves reproduces the same deck order.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use uno_types::{Card, CardColor, CardValue};

/// Number of cards in a full deck
pub const DECK_SIZE: usize = 108;

/// Cards dealt to each player when the game starts
pub const HAND_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeckError {
    #[error("cannot draw {requested} cards, only {available} left even after recycling")]
    EmptyPile { requested: usize, available: usize },
}

/// Build the 108 card deck in a fixed order.
///
/// Per color: one 0, two each of 1-9, Skip, Reverse and DrawTwo.
/// Plus four Wild and four WildDrawFour.
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);

    for color in CardColor::PLAYABLE {
        deck.push(Card::number(0, color));
        for _ in 0..2 {
            for n in 1..=9 {
                deck.push(Card::number(n, color));
            }
            deck.push(Card::new(CardValue::Skip, color));
            deck.push(Card::new(CardValue::Reverse, color));
            deck.push(Card::new(CardValue::DrawTwo, color));
        }
    }

    for _ in 0..4 {
        deck.push(Card::wild());
        deck.push(Card::wild_draw_four());
    }

    deck
}

/// Uniform in-place permutation (Fisher-Yates via `SliceRandom`)
pub fn shuffle<R: Rng + ?Sized>(deck: &mut [Card], rng: &mut R) {
    deck.shuffle(rng);
}

/// RNG for the `round`-th shuffle of a game seeded with `seed`
pub fn deck_rng(seed: u64, round: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(round));
    rng
}

/// Draw and discard piles owned by one game.
/// The top of each pile is the last element of its vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckManager {
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
    seed: u64,
    shuffles: u32,
}

impl DeckManager {
    /// Empty piles; nothing exists until `reset` is called at game start
    pub fn new(seed: u64) -> Self {
        Self {
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            seed,
            shuffles: 0,
        }
    }

    /// Restore piles captured from an earlier state of a game
    pub fn from_piles(draw_pile: Vec<Card>, discard_pile: Vec<Card>, seed: u64) -> Self {
        Self {
            draw_pile,
            discard_pile,
            seed,
            shuffles: 1,
        }
    }

    /// Replace both piles with a freshly built and shuffled deck
    pub fn reset(&mut self) {
        let mut deck = build_deck();
        let mut rng = self.next_rng();
        shuffle(&mut deck, &mut rng);
        self.draw_pile = deck;
        self.discard_pile.clear();
    }

    pub fn draw_pile(&self) -> &[Card] {
        &self.draw_pile
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn discard_top(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// How many times the piles have been shuffled, including the initial one
    pub fn shuffles(&self) -> u32 {
        self.shuffles
    }

    /// Cards that can still be drawn, counting the recyclable part of the discard pile
    pub fn available(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len().saturating_sub(1)
    }

    /// Cards currently held by the piles
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn discard(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    /// Pop `n` cards from the draw pile, recycling the discard pile when it runs dry.
    /// Nothing is moved when fewer than `n` cards are available.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        let available = self.available();
        if available < n {
            return Err(DeckError::EmptyPile {
                requested: n,
                available,
            });
        }

        let mut drawn = Vec::with_capacity(n);
        for _ in 0..n {
            if self.draw_pile.is_empty() {
                self.recycle_discards();
            }
            match self.draw_pile.pop() {
                Some(card) => drawn.push(card),
                None => {
                    // Checked above; put everything back rather than lose cards
                    self.draw_pile.extend(drawn.drain(..).rev());
                    return Err(DeckError::EmptyPile {
                        requested: n,
                        available,
                    });
                }
            }
        }

        Ok(drawn)
    }

    /// Turn the discard pile, minus its top card, into a new shuffled draw pile
    fn recycle_discards(&mut self) {
        let Some(top) = self.discard_pile.pop() else {
            return;
        };
        let mut recycled = std::mem::take(&mut self.discard_pile);
        let mut rng = self.next_rng();
        shuffle(&mut recycled, &mut rng);
        tracing::debug!("Recycled {} discarded cards into the draw pile", recycled.len());
        self.draw_pile.append(&mut recycled);
        self.discard_pile.push(top);
    }

    fn next_rng(&mut self) -> ChaCha8Rng {
        let rng = deck_rng(self.seed, self.shuffles);
        self.shuffles += 1;
        rng
    }
}
