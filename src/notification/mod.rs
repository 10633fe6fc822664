pub mod dispatcher;
pub mod fetcher;
pub mod listener;
pub mod model;
pub mod store;
