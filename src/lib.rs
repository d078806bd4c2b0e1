pub mod config;
pub mod dispatcher;
pub mod gateway;
pub mod messages;
pub mod reset;
pub mod server;
pub mod sink;
pub mod store;

pub use config::ServiceConfig;
pub use dispatcher::Dispatcher;
pub use store::{CounterDocument, CounterStore, StoreError, VersionToken};
