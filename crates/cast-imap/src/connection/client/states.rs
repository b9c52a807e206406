//! Type-state markers for the client connection states.

/// Connected, greeting received, not yet logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in; mailbox selection is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is selected; SEARCH and FETCH are allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selected;
