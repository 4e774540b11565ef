pub mod completion;
pub mod config;
pub mod messaging;
pub mod notification;
pub mod reminder;
pub mod report;
pub mod task_lifecycle;
pub mod transition_queue;

#[cfg(test)]
pub(crate) mod test_support;
