pub mod adapter;
pub mod attach;
pub mod eligibility;
pub mod handler;
pub mod identity;
pub mod send;

pub use adapter::SlackAdapter;
pub use eligibility::Eligibility;
pub use identity::BotIdentity;
pub use send::OutgoingMessage;
