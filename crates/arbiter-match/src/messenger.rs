//! Outbound text delivery.

use arbiter_protocol::{GroupId, UserId};

/// Where a message goes once the match has resolved its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// A private message to one user.
    User(UserId),
    /// A message to a group's shared channel.
    Group(GroupId),
}

/// Sends text to users and groups.
///
/// Called while the sending match is locked. Implementations must not
/// call back into the match; queue the text and return.
pub trait Messenger: Send + Sync + 'static {
    fn deliver(&self, to: Delivery, text: &str);
}

/// Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMessenger;

impl Messenger for NullMessenger {
    fn deliver(&self, _to: Delivery, _text: &str) {}
}
