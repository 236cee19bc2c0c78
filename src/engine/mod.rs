pub mod cast;
pub mod clock;
pub mod database;
pub mod economy;
pub mod game;
pub mod game_data;
pub mod inbox;
pub mod offline;
pub mod persistence;
pub mod prestige;
pub mod resolver;
pub mod scheduler;
pub mod state;
