//! Value types shared by the parser, the command encoder and the client.

mod capability;
mod mailbox;
mod response_code;
mod uid;

pub use capability::Capability;
pub use mailbox::MailboxStatus;
pub use response_code::ResponseCode;
pub use uid::Uid;
