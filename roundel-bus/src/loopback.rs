//! In-memory transport
//!
//! The service side and a [`LoopbackClient`] share one mailbox, so tests
//! (and local tools) can drive a [`ServiceBus`](crate::ServiceBus) without
//! a bus daemon.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::BusError;
use crate::message::{MethodCall, Reply, Value};
use crate::transport::{Signal, Transport};

#[derive(Debug, Default)]
struct Mailbox {
    next_token: u64,
    inbound: VecDeque<MethodCall>,
    replies: HashMap<u64, Reply>,
    signals: Vec<Signal>,
    discarded: Vec<u64>,
}

fn lock(mailbox: &Mutex<Mailbox>) -> MutexGuard<'_, Mailbox> {
    mailbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Service side of the loopback
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    mailbox: Arc<Mutex<Mailbox>>,
}

/// Caller side of the loopback
#[derive(Debug, Clone)]
pub struct LoopbackClient {
    mailbox: Arc<Mutex<Mailbox>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> LoopbackClient {
        LoopbackClient {
            mailbox: self.mailbox.clone(),
        }
    }
}

impl LoopbackClient {
    /// Queue a method call; returns its token
    pub fn call(&self, interface: &str, member: &str, args: Vec<Value>) -> u64 {
        let mut m = lock(&self.mailbox);
        m.next_token += 1;
        let token = m.next_token;
        m.inbound
            .push_back(MethodCall::new(token, interface, member, args));
        token
    }

    /// Take the reply for `token`, if one was sent
    pub fn take_reply(&self, token: u64) -> Option<Reply> {
        lock(&self.mailbox).replies.remove(&token)
    }

    /// True if the service dropped the call without answering
    pub fn was_discarded(&self, token: u64) -> bool {
        lock(&self.mailbox).discarded.contains(&token)
    }

    /// Take every signal emitted so far
    pub fn take_signals(&self) -> Vec<Signal> {
        std::mem::take(&mut lock(&self.mailbox).signals)
    }
}

impl Transport for LoopbackTransport {
    fn try_recv(&mut self) -> Option<MethodCall> {
        lock(&self.mailbox).inbound.pop_front()
    }

    fn reply(&mut self, token: u64, reply: Reply) -> Result<(), BusError> {
        lock(&self.mailbox).replies.insert(token, reply);
        Ok(())
    }

    fn discard(&mut self, token: u64) {
        lock(&self.mailbox).discarded.push(token);
    }

    fn emit(&mut self, signal: &Signal) -> Result<(), BusError> {
        lock(&self.mailbox).signals.push(signal.clone());
        Ok(())
    }
}
