//! Transport boundary between the service bus and a concrete message bus

use crate::error::BusError;
use crate::message::{MethodCall, Reply};

/// A broadcast signal with an optional single string argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub path: String,
    pub interface: String,
    pub name: String,
    pub arg: Option<String>,
}

/// Message bus connection that already owns the service name
pub trait Transport {
    /// Next queued method call, without blocking
    fn try_recv(&mut self) -> Option<MethodCall>;

    /// Answer the call identified by `token`
    fn reply(&mut self, token: u64, reply: Reply) -> Result<(), BusError>;

    /// Forget a call that will never be answered
    fn discard(&mut self, token: u64);

    /// Publish a signal
    fn emit(&mut self, signal: &Signal) -> Result<(), BusError>;
}
