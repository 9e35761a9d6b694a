use crate::domain::Address;

/// Notifications pushed by the injected provider, independent of any
/// in-flight request.
#[derive(Debug, Clone)]
pub enum Event {
    AccountsChanged(Vec<Address>),
    ChainChanged,
}
