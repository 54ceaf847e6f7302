pub mod cities;
pub mod divisions;
pub mod import;
pub mod provinces;
pub mod services;
pub mod sub_divisions;
pub mod territories;
pub mod views;
