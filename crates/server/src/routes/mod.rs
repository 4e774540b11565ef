pub mod groups;
pub mod health;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod users;
