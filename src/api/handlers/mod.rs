pub mod auth;
pub mod dna;
pub mod health;
