//! The verb executor: one linear pipeline per invocation, over a single
//! store transaction.

mod executor;
mod group;

pub use self::executor::Executor;
