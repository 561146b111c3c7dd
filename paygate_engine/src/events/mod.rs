mod channel;
mod event_types;
mod hooks;

pub use channel::{Delivery, EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{SuccessEventHub, Subscription};
