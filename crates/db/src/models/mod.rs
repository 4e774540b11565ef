pub mod activity_log;
pub mod attachment;
pub mod comment;
pub mod group;
pub mod project;
pub mod task;
pub mod user;
