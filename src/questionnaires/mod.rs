pub mod groupes;
pub mod questions;
pub mod services;
pub mod templates;
pub mod views;

#[cfg(test)]
mod tests;
