#![allow(dead_code)]

use uno_core::{DeckManager, Game, MAX_PLAYERS, MIN_PLAYERS, build_deck, is_legal_play};
use uno_types::{Card, CardColor, GameStatus, PlayerId};
use uuid::Uuid;

/// Creates a game with the named players joined in order; the first is host
pub fn created_game(names: &[&str], seed: u64) -> (Game, Vec<PlayerId>) {
    let mut game = Game::new(Uuid::new_v4(), seed);
    let ids: Vec<PlayerId> = names.iter().map(|_| Uuid::new_v4()).collect();
    for (id, name) in ids.iter().zip(names) {
        game.join(*id, name, MAX_PLAYERS).unwrap();
    }
    (game, ids)
}

/// Creates a dealt game ready for the host's first turn
pub fn started_game(names: &[&str], seed: u64) -> (Game, Vec<PlayerId>) {
    let (mut game, ids) = created_game(names, seed);
    game.start(ids[0], MIN_PLAYERS).unwrap();
    (game, ids)
}

/// Removes one copy of `card` from `deck`, panicking if none is left
pub fn take_card(deck: &mut Vec<Card>, card: Card) -> Card {
    let index = deck
        .iter()
        .position(|c| *c == card)
        .unwrap_or_else(|| panic!("no {} left in the deck", card));
    deck.remove(index)
}

/// Creates an in-progress game with exact hands and discard top.
/// Every other card goes to the draw pile, so the card total stays at 108.
pub fn rigged_game(hands: &[Vec<Card>], top: Card) -> (Game, Vec<PlayerId>) {
    let mut remaining = build_deck();
    for hand in hands {
        for card in hand {
            take_card(&mut remaining, *card);
        }
    }
    take_card(&mut remaining, top);
    rigged_game_with_piles(hands, remaining, vec![top])
}

/// Like `rigged_game` but with both piles given explicitly (top = last element)
pub fn rigged_game_with_piles(
    hands: &[Vec<Card>],
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
) -> (Game, Vec<PlayerId>) {
    let names: Vec<String> = (0..hands.len()).map(|i| format!("Player{}", i + 1)).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let (mut game, ids) = created_game(&name_refs, 42);

    for (player, hand) in game.players.iter_mut().zip(hands) {
        player.hand = hand.clone();
    }
    let top = *discard_pile.last().expect("discard pile needs a top card");
    game.deck = DeckManager::from_piles(draw_pile, discard_pile, 42);
    game.active_color = (!top.is_wild()).then_some(top.color);
    game.status = GameStatus::InProgress;
    game.check_invariants().unwrap();
    (game, ids)
}

/// First card in the current player's hand that may legally be played
pub fn first_legal(game: &Game) -> Option<Card> {
    let top = game.deck.discard_top()?;
    let player = game.current_player()?;
    player
        .hand
        .iter()
        .find(|c| is_legal_play(c, top, game.active_color))
        .copied()
}

/// Colour to nominate when `card` is a wild
pub fn color_for(card: Card) -> Option<CardColor> {
    card.is_wild().then_some(CardColor::Red)
}

pub fn hand_size(game: &Game, id: PlayerId) -> usize {
    game.player(id).map(|p| p.hand.len()).unwrap_or_default()
}
