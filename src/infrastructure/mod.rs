pub mod fetch;
pub mod queue;
pub mod telegram;
