pub mod auth;
pub mod errors;
pub mod forms;
pub mod models;
pub mod query;
pub mod state;
pub mod views;

#[cfg(test)]
mod tests;
