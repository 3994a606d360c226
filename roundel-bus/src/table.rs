//! Method dispatch table
//!
//! Filled once during service setup, then sealed; lookups during dispatch
//! never see a half-built table.

use std::collections::HashMap;

use crate::error::BusError;
use crate::message::{MethodCall, Reply};

/// Method handler; `S` is the owning service's state
pub type Handler<S> = fn(&mut S, &MethodCall) -> Reply;

/// (interface, member) -> handler
pub struct MethodTable<S> {
    routes: HashMap<(String, String), Handler<S>>,
    sealed: bool,
}

impl<S> Default for MethodTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MethodTable<S> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            sealed: false,
        }
    }

    /// Add a route; a later registration for the same route replaces the
    /// earlier one
    pub fn register(&mut self, interface: &str, member: &str, handler: Handler<S>) -> Result<(), BusError> {
        if self.sealed {
            return Err(BusError::Sealed);
        }
        self.routes
            .insert((interface.to_string(), member.to_string()), handler);
        Ok(())
    }

    /// Refuse further registrations
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Exact-match lookup
    pub fn lookup(&self, interface: &str, member: &str) -> Option<Handler<S>> {
        self.routes
            .get(&(interface.to_string(), member.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(count: &mut u32, _call: &MethodCall) -> Reply {
        *count += 1;
        Reply::ok()
    }

    #[test]
    fn test_exact_match() {
        let mut t = MethodTable::<u32>::new();
        t.register("org.roundel.Test", "Ping", ping).unwrap();
        assert!(t.lookup("org.roundel.Test", "Ping").is_some());
        assert!(t.lookup("org.roundel.Test", "ping").is_none());
        assert!(t.lookup("org.roundel.Other", "Ping").is_none());
    }

    #[test]
    fn test_sealed_rejects_registration() {
        let mut t = MethodTable::<u32>::new();
        t.seal();
        assert!(matches!(t.register("a.b", "C", ping), Err(BusError::Sealed)));
        assert!(t.is_empty());
    }
}
