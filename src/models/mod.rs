//! Data models

mod certificate;
mod command;
mod event_count;
mod fact;
mod node;
mod query;
mod view;

pub use certificate::*;
pub use command::*;
pub use event_count::*;
pub use fact::*;
pub use node::*;
pub use query::*;
pub use view::*;
