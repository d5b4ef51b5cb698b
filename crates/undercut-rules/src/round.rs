//! Round resolution: scoring, elimination, and the special rules.
//!
//! [`resolve_round`] takes the room's player list after every active
//! player has a submission and applies, in order: the
//! duplicate-invalidation rule, target computation, the reversal rule,
//! the penalty rule, and elimination. It mutates scores and per-round
//! flags in place and reports what happened; the caller (the room actor)
//! decides the state transition from the outcome.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Player;

/// Room capacity.
pub const MAX_PLAYERS: usize = 20;
/// Minimum players to start a game.
pub const MIN_PLAYERS: usize = 2;
/// Largest submittable number (the smallest is 0).
pub const MAX_NUMBER: i32 = 100;
/// The target is this fraction of the average submission.
pub const TARGET_FACTOR: f64 = 0.8;
/// A score at or below this eliminates the player.
pub const ELIMINATION_FLOOR: i32 = -10;
/// The duplicate-invalidation rule applies at this many active players
/// or fewer.
pub const DUPLICATE_RULE_MAX_ACTIVE: usize = 4;
/// The doubled penalty for an exact target hit applies at this many
/// active players or fewer.
pub const EXACT_HIT_MAX_ACTIVE: usize = 3;
/// The reversal rule applies at this many active players or fewer.
pub const REVERSAL_MAX_ACTIVE: usize = 2;
/// Tolerance when comparing the winner's number to the rounded target.
pub const EXACT_HIT_TOLERANCE: f64 = 1e-3;

/// One row of a round's scoreboard.
///
/// Players whose submission was nullified by the duplicate rule do not
/// get a row; their only trace is the immediate 1-point deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub username: String,
    pub number: i32,
    /// Absolute distance from the target (even under the reversal rule,
    /// where the win condition uses the raw average instead).
    pub distance: f64,
    /// 0 for the winner, `-penalty` for everyone else.
    pub score_change: i32,
    pub total_score: i32,
    pub is_winner: bool,
    pub is_eliminated: bool,
}

/// The finalized outcome of one round, as shown to players and handed
/// to the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub average: f64,
    pub target: f64,
    /// Empty when no winner could be determined.
    pub winner_username: String,
    /// One row per player with an accepted submission, in join order.
    pub results: Vec<PlayerScore>,
}

/// What [`resolve_round`] did to the player list.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub result: RoundResult,
    /// At most one active player remains; the game is over.
    pub finished: bool,
    /// The sole survivor, when `finished`.
    pub champion: Option<String>,
}

/// Result of attempting to resolve a round.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The round was scored; flags were reset for the next round.
    Resolved(RoundOutcome),
    /// Some active player had no submission. Under correct scheduling
    /// this is unreachable (the deadline forces stragglers first); the
    /// per-round flags are reset so the room can recover.
    NotReady,
    /// Every submission was nullified by the duplicate rule. The round
    /// must be retried; flags are reset.
    NoValidNumbers,
}

/// Scores one round over `players`, mutating scores, elimination flags,
/// and per-round fields in place.
///
/// Only non-eliminated players participate. The caller guarantees the
/// room was in the playing state; this function is otherwise defensive
/// about missing submissions.
pub fn resolve_round(players: &mut [Player]) -> Resolution {
    let active: Vec<usize> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_eliminated)
        .map(|(i, _)| i)
        .collect();

    if active.iter().any(|&i| !players[i].has_submitted) {
        reset_round_fields(players, &active);
        return Resolution::NotReady;
    }

    apply_duplicate_rule(players, &active);

    let valid: Vec<usize> = active
        .iter()
        .copied()
        .filter(|&i| players[i].current_number.is_some())
        .collect();

    if valid.is_empty() {
        reset_round_fields(players, &active);
        return Resolution::NoValidNumbers;
    }

    let sum: f64 = valid
        .iter()
        .filter_map(|&i| players[i].current_number)
        .map(f64::from)
        .sum();
    let average = sum / valid.len() as f64;
    let target = average * TARGET_FACTOR;

    let winner = pick_winner(players, &active, &valid, average, target);
    let penalty = penalty_for(players, &active, winner, target);

    let mut results = Vec::with_capacity(valid.len());
    for &i in &valid {
        let Some(number) = players[i].current_number else {
            continue;
        };
        let is_winner = winner == Some(i);
        let mut score_change = 0;
        if !is_winner {
            players[i].score -= penalty;
            score_change = -penalty;
            if players[i].score <= ELIMINATION_FLOOR {
                players[i].is_eliminated = true;
            }
        }
        results.push(PlayerScore {
            username: players[i].username.clone(),
            number,
            distance: (f64::from(number) - target).abs(),
            score_change,
            total_score: players[i].score,
            is_winner,
            is_eliminated: players[i].is_eliminated,
        });
    }

    let winner_username = winner
        .map(|i| players[i].username.clone())
        .unwrap_or_default();

    reset_round_fields(players, &active);

    let remaining = active
        .iter()
        .filter(|&&i| !players[i].is_eliminated)
        .count();
    let finished = remaining <= 1;
    let champion = if finished {
        players
            .iter()
            .find(|p| !p.is_eliminated)
            .map(|p| p.username.clone())
    } else {
        None
    };

    Resolution::Resolved(RoundOutcome {
        result: RoundResult {
            average,
            target,
            winner_username,
            results,
        },
        finished,
        champion,
    })
}

/// With few enough players, any value picked by more than one of them is
/// nullified for all of them, with an immediate 1-point deduction each.
fn apply_duplicate_rule(players: &mut [Player], active: &[usize]) {
    if active.len() > DUPLICATE_RULE_MAX_ACTIVE {
        return;
    }

    let mut counts: HashMap<i32, usize> = HashMap::new();
    for &i in active {
        if let Some(n) = players[i].current_number {
            *counts.entry(n).or_default() += 1;
        }
    }

    for &i in active {
        let Some(n) = players[i].current_number else {
            continue;
        };
        if counts.get(&n).copied().unwrap_or(0) > 1 {
            players[i].current_number = None;
            players[i].score -= 1;
            if players[i].score <= ELIMINATION_FLOOR {
                players[i].is_eliminated = true;
            }
        }
    }
}

/// Selects the round winner among `valid` players.
///
/// Standard rule: closest to the target. Reversal rule (two or fewer
/// active players and a surviving submission of exactly 100): farthest
/// from the raw average. Both comparisons are strict, so ties go to the
/// first player in join order.
fn pick_winner(
    players: &[Player],
    active: &[usize],
    valid: &[usize],
    average: f64,
    target: f64,
) -> Option<usize> {
    let reversal = active.len() <= REVERSAL_MAX_ACTIVE
        && valid
            .iter()
            .any(|&i| players[i].current_number == Some(MAX_NUMBER));

    let mut winner = None;
    let mut best = if reversal { f64::NEG_INFINITY } else { f64::INFINITY };
    for &i in valid {
        let Some(n) = players[i].current_number else {
            continue;
        };
        let n = f64::from(n);
        if reversal {
            let distance = (n - average).abs();
            if distance > best {
                best = distance;
                winner = Some(i);
            }
        } else {
            let distance = (n - target).abs();
            if distance < best {
                best = distance;
                winner = Some(i);
            }
        }
    }
    winner
}

/// Base penalty is 1; doubled when few players remain and the winner's
/// number lands exactly on the rounded target.
fn penalty_for(
    players: &[Player],
    active: &[usize],
    winner: Option<usize>,
    target: f64,
) -> i32 {
    if let Some(w) = winner {
        if let Some(n) = players[w].current_number {
            if active.len() <= EXACT_HIT_MAX_ACTIVE
                && (f64::from(n) - target.round()).abs() < EXACT_HIT_TOLERANCE
            {
                return 2;
            }
        }
    }
    1
}

fn reset_round_fields(players: &mut [Player], active: &[usize]) {
    for &i in active {
        players[i].reset_for_round();
    }
}
