pub mod config;
pub mod engine;
pub mod pokeapi;
pub mod web;
