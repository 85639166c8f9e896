//! HTTP surface: shared state, health probes and the server loop.

mod health;
mod server;

pub use health::*;
pub use server::*;

use crate::board::BoardService;

pub struct AppState {
    pub board: BoardService,
}

impl AppState {
    pub fn new(board: BoardService) -> Self {
        Self { board }
    }
}
