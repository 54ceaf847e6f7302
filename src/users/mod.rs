pub mod groups;
pub mod models;
pub mod services;
pub mod user_groups;
pub mod views;

#[cfg(test)]
mod tests;
