//! Turn state machine: whose turn it is, the dice phase within the turn, the
//! bonus-roll and three-six rules, and win detection.
//!
//! The machine is purely mechanical; it knows player count and dice values
//! but nothing about the board. The room layers board-aware checks (legal
//! moves, winner detection) on top of it.

use shared::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    WaitingForPlayers,
    InProgress,
    Finished,
}

/// Sub-phase of the current player's turn while the game is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingRoll,
    AwaitingMove,
}

/// What a recorded roll means for the rest of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    /// Dice stored; the player now moves (or passes, or is auto-passed).
    AwaitMove,
    /// Third consecutive six: dice discarded, turn already advanced.
    ForfeitThirdSix,
}

#[derive(Debug, Clone)]
pub struct TurnState {
    phase: GamePhase,
    turn_phase: TurnPhase,
    current: usize,
    dice: u8,
    six_streak: u8,
    winner: Option<Color>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::WaitingForPlayers,
            turn_phase: TurnPhase::AwaitingRoll,
            current: 0,
            dice: 0,
            six_streak: 0,
            winner: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn dice_value(&self) -> u8 {
        self.dice
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn has_rolled(&self) -> bool {
        self.turn_phase == TurnPhase::AwaitingMove
    }

    /// Begin play. The first joiner (index 0) rolls first.
    pub fn start(&mut self) {
        debug_assert_eq!(self.phase, GamePhase::WaitingForPlayers);
        self.phase = GamePhase::InProgress;
        self.turn_phase = TurnPhase::AwaitingRoll;
        self.current = 0;
        self.dice = 0;
        self.six_streak = 0;
    }

    /// Record the current player's roll.
    pub fn record_roll(&mut self, value: u8, player_count: usize) -> RollOutcome {
        debug_assert_eq!(self.phase, GamePhase::InProgress);
        debug_assert_eq!(self.turn_phase, TurnPhase::AwaitingRoll);

        if value == 6 {
            self.six_streak += 1;
            if self.six_streak >= 3 {
                // Dice discarded, no move allowed.
                self.advance_turn(player_count);
                return RollOutcome::ForfeitThirdSix;
            }
        } else {
            self.six_streak = 0;
        }

        self.dice = value;
        self.turn_phase = TurnPhase::AwaitingMove;
        RollOutcome::AwaitMove
    }

    /// A move was applied. Returns true when the player keeps the turn for a
    /// bonus roll (the move consumed a 6).
    pub fn finish_move(&mut self, player_count: usize) -> bool {
        debug_assert_eq!(self.turn_phase, TurnPhase::AwaitingMove);
        let bonus = self.dice == 6;
        self.dice = 0;
        if bonus {
            self.turn_phase = TurnPhase::AwaitingRoll;
        } else {
            self.advance_turn(player_count);
        }
        bonus
    }

    /// Give up the rest of the turn (voluntary pass or no-legal-move auto-pass).
    pub fn pass(&mut self, player_count: usize) {
        self.advance_turn(player_count);
    }

    /// End the game with a winner. Terminal: no rolls or moves after this.
    pub fn declare_winner(&mut self, color: Color) {
        self.phase = GamePhase::Finished;
        self.winner = Some(color);
        self.dice = 0;
    }

    /// Keep the current index coherent after removing the player that sat at
    /// `removed` in join order.
    pub fn player_removed(&mut self, removed: usize, remaining: usize) {
        if remaining == 0 {
            self.current = 0;
            return;
        }
        if removed < self.current {
            self.current -= 1;
        } else if removed == self.current {
            // Their turn (or pending turn) passes to the next survivor.
            self.current %= remaining;
            self.dice = 0;
            self.six_streak = 0;
            self.turn_phase = TurnPhase::AwaitingRoll;
        }
    }

    fn advance_turn(&mut self, player_count: usize) {
        debug_assert!(player_count > 0);
        self.current = (self.current + 1) % player_count;
        self.dice = 0;
        self.six_streak = 0;
        self.turn_phase = TurnPhase::AwaitingRoll;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(players: usize) -> (TurnState, usize) {
        let mut turn = TurnState::new();
        turn.start();
        (turn, players)
    }

    #[test]
    fn test_initial_state() {
        let turn = TurnState::new();
        assert_eq!(turn.phase(), GamePhase::WaitingForPlayers);
        assert_eq!(turn.dice_value(), 0);
        assert_eq!(turn.winner(), None);
    }

    #[test]
    fn test_start_enters_progress_with_first_player() {
        let (turn, _) = started(3);
        assert_eq!(turn.phase(), GamePhase::InProgress);
        assert_eq!(turn.current_index(), 0);
        assert!(!turn.has_rolled());
    }

    #[test]
    fn test_non_six_roll_then_move_advances_turn() {
        let (mut turn, n) = started(3);

        assert_eq!(turn.record_roll(4, n), RollOutcome::AwaitMove);
        assert_eq!(turn.dice_value(), 4);
        assert!(turn.has_rolled());

        let bonus = turn.finish_move(n);
        assert!(!bonus);
        assert_eq!(turn.current_index(), 1);
        assert_eq!(turn.dice_value(), 0);
        assert!(!turn.has_rolled());
    }

    #[test]
    fn test_turn_order_cycles_in_join_order() {
        let (mut turn, n) = started(3);

        for expected in [0, 1, 2, 0, 1, 2, 0] {
            assert_eq!(turn.current_index(), expected);
            turn.record_roll(2, n);
            turn.finish_move(n);
        }
    }

    #[test]
    fn test_six_grants_bonus_roll() {
        let (mut turn, n) = started(2);

        turn.record_roll(6, n);
        let bonus = turn.finish_move(n);
        assert!(bonus);
        assert_eq!(turn.current_index(), 0);
        assert!(!turn.has_rolled());
    }

    #[test]
    fn test_third_consecutive_six_forfeits() {
        let (mut turn, n) = started(2);

        assert_eq!(turn.record_roll(6, n), RollOutcome::AwaitMove);
        assert!(turn.finish_move(n));
        assert_eq!(turn.record_roll(6, n), RollOutcome::AwaitMove);
        assert!(turn.finish_move(n));

        // Third six in the same turn sequence: no move, turn lost.
        assert_eq!(turn.record_roll(6, n), RollOutcome::ForfeitThirdSix);
        assert_eq!(turn.current_index(), 1);
        assert_eq!(turn.dice_value(), 0);
        assert!(!turn.has_rolled());
    }

    #[test]
    fn test_six_streak_resets_on_non_six() {
        let (mut turn, n) = started(2);

        turn.record_roll(6, n);
        turn.finish_move(n);
        turn.record_roll(3, n);
        turn.finish_move(n);

        // Player 1's sixes start a fresh streak.
        turn.record_roll(6, n);
        turn.finish_move(n);
        turn.record_roll(6, n);
        turn.finish_move(n);
        assert_eq!(turn.record_roll(6, n), RollOutcome::ForfeitThirdSix);
    }

    #[test]
    fn test_six_streak_resets_on_turn_change() {
        let (mut turn, n) = started(2);

        turn.record_roll(6, n);
        turn.finish_move(n);
        turn.record_roll(6, n);
        turn.finish_move(n);
        // Voluntary end of the sequence: pass is not possible on a six, but a
        // no-legal-move auto-pass is.
        turn.pass(n);

        assert_eq!(turn.current_index(), 1);
        turn.record_roll(6, n);
        turn.finish_move(n);
        turn.record_roll(6, n);
        turn.finish_move(n);
        assert_eq!(turn.record_roll(6, n), RollOutcome::ForfeitThirdSix);
    }

    #[test]
    fn test_pass_advances_and_clears_dice() {
        let (mut turn, n) = started(4);

        turn.record_roll(3, n);
        turn.pass(n);
        assert_eq!(turn.current_index(), 1);
        assert_eq!(turn.dice_value(), 0);
    }

    #[test]
    fn test_declare_winner_is_terminal() {
        let (mut turn, n) = started(2);
        turn.record_roll(2, n);
        turn.declare_winner(Color::Red);

        assert_eq!(turn.phase(), GamePhase::Finished);
        assert_eq!(turn.winner(), Some(Color::Red));
        assert_eq!(turn.dice_value(), 0);
    }

    #[test]
    fn test_player_removed_before_current() {
        let (mut turn, n) = started(3);
        turn.record_roll(2, n);
        turn.finish_move(n);
        turn.record_roll(2, n);
        turn.finish_move(n);
        assert_eq!(turn.current_index(), 2);

        turn.player_removed(0, 2);
        assert_eq!(turn.current_index(), 1);
    }

    #[test]
    fn test_player_removed_is_current() {
        let (mut turn, n) = started(3);
        turn.record_roll(5, n);
        assert!(turn.has_rolled());

        turn.player_removed(0, 2);
        assert_eq!(turn.current_index(), 0);
        assert_eq!(turn.dice_value(), 0);
        assert!(!turn.has_rolled());
    }

    #[test]
    fn test_last_player_removed_wraps_current() {
        let (mut turn, n) = started(3);
        turn.record_roll(2, n);
        turn.finish_move(n);
        turn.record_roll(2, n);
        turn.finish_move(n);
        assert_eq!(turn.current_index(), 2);

        turn.player_removed(2, 2);
        assert_eq!(turn.current_index(), 0);
    }
}
