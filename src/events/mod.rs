pub mod channel;

pub use channel::{EventChannel, SubscriberId, Subscription};
