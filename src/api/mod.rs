pub mod analytics;
pub mod health;
pub mod matchups;
pub mod players;
pub mod routes;
pub mod teams;
pub mod trades;
pub mod waivers;
