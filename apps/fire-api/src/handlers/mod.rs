//! Handlers 模块

pub mod alarms;
pub mod auth;
pub mod brigades;
pub mod buildings;
pub mod changes;
pub mod floors;
pub mod history;
pub mod metrics;
pub mod realtime;
pub mod users;

pub use alarms::*;
pub use auth::*;
pub use brigades::*;
pub use buildings::*;
pub use changes::*;
pub use floors::*;
pub use history::*;
pub use metrics::*;
pub use realtime::*;
pub use users::*;
