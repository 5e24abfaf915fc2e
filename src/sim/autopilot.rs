//! Idle/demo driver
//!
//! Greedy one-step lookahead: take the non-reversing move that keeps the head
//! on the board, off the cable, off every obstacle (now and after its next
//! linear step) and closest to the outlet.

use super::grid::{Direction, manhattan};
use super::tick::GameLoop;

/// Suggest the next heading, or `None` if every move looks fatal
pub fn suggest(game: &GameLoop) -> Option<Direction> {
    if game.is_finished() {
        return None;
    }

    let board = game.board();
    let cable = game.cable();
    let head = cable.head();
    let occupied = game.obstacles().occupied_cells();
    let predicted = game.obstacles().predicted_cells(board);

    Direction::ALL
        .into_iter()
        .filter(|dir| !dir.is_opposite(cable.direction()))
        .map(|dir| (dir, head + dir.offset()))
        .filter(|&(_, cell)| {
            board.is_inside(cell)
                && !cable.contains(cell)
                && !occupied.contains(&cell)
                && !predicted.contains(&cell)
        })
        .min_by_key(|&(_, cell)| manhattan(cell, board.outlet()))
        .map(|(dir, _)| dir)
}
