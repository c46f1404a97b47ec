pub mod auth;
pub mod clients;
pub mod content;
pub mod goals;
pub mod products;
pub mod reminders;
pub mod reports;
pub mod sales;
pub mod teams;
pub mod users;
