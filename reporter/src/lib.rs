pub mod api;
pub mod context;
pub mod dispatch;
pub mod events;
pub mod prometheus;
pub mod record;
pub mod reporter;
pub mod sanitize;
pub mod sinks;
