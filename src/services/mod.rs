pub mod auth_service;
pub mod client_service;
pub mod content_service;
pub mod goal_engine;
pub mod goal_service;
pub mod product_service;
pub mod reminder_service;
pub mod report_service;
pub mod sale_service;
pub mod team_service;
pub mod user_service;
