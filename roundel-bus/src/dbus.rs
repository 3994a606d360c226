//! System bus transport (D-Bus via zbus)
//!
//! A reader thread pulls every incoming message off the connection and
//! queues method calls; [`Transport::try_recv`] drains that queue without
//! blocking. Calls are remembered by token until answered or discarded,
//! since a reply must reference the original call's header.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};
use zbus::blocking::{Connection, MessageIterator};
use zbus::fdo::{RequestNameFlags, RequestNameReply};
use zbus::message::Type as MessageType;
use zbus::zvariant::{DynamicType, Signature};
use zbus::Message;

use crate::error::BusError;
use crate::message::{signature_of, Args, MethodCall, Reply, Value};
use crate::transport::{Signal, Transport};

/// Inbound call queue depth
const INBOUND_DEPTH: usize = 16;

type Inbound = Channel<CriticalSectionRawMutex, Message, INBOUND_DEPTH>;

impl DynamicType for Args<'_> {
    fn signature(&self) -> Signature {
        format!("({})", signature_of(self.0))
            .parse()
            .unwrap_or(Signature::Unit)
    }
}

/// Connection to the system bus owning one well-known name
pub struct SystemBusTransport {
    conn: Connection,
    inbound: Arc<Inbound>,
    pending: HashMap<u64, Message>,
    next_token: u64,
}

impl SystemBusTransport {
    /// Connect to the system bus and claim `service_name` exclusively
    pub fn connect(service_name: &str) -> Result<Self, BusError> {
        Self::with_connection(Connection::system()?, service_name)
    }

    /// Claim `service_name` on an existing connection
    ///
    /// Fails with [`BusError::NameTaken`] if another peer owns the name.
    pub fn with_connection(conn: Connection, service_name: &str) -> Result<Self, BusError> {
        // Subscribe before owning the name so no early call is missed
        let messages = MessageIterator::from(&conn);

        let reply = conn.request_name_with_flags(service_name, RequestNameFlags::DoNotQueue.into())?;
        match reply {
            RequestNameReply::PrimaryOwner | RequestNameReply::AlreadyOwner => {}
            _ => return Err(BusError::NameTaken(service_name.to_string())),
        }

        let inbound: Arc<Inbound> = Arc::new(Channel::new());
        let queue = inbound.clone();
        thread::Builder::new()
            .name("bus-reader".to_string())
            .spawn(move || read_loop(messages, &queue))?;

        info!("Bus name acquired: {}", service_name);
        Ok(Self {
            conn,
            inbound,
            pending: HashMap::new(),
            next_token: 0,
        })
    }
}

fn read_loop(messages: MessageIterator, queue: &Inbound) {
    for msg in messages {
        match msg {
            Ok(msg) if msg.message_type() == MessageType::MethodCall => {
                if queue.try_send(msg).is_err() {
                    warn!("Bus inbound queue full, dropping call");
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Bus read error: {}", e),
        }
    }
    debug!("Bus reader exiting");
}

/// Decode the argument shapes the services accept
fn decode_args(msg: &Message) -> Vec<Value> {
    let body = msg.body();
    let signature = body.signature().to_string();
    let decoded = match signature.as_str() {
        "" => Ok(Vec::new()),
        "s" => body.deserialize::<String>().map(|s| vec![Value::Str(s)]),
        "u" => body.deserialize::<u32>().map(|v| vec![Value::U32(v)]),
        other => {
            debug!("Unsupported argument signature '{}'", other);
            Ok(Vec::new())
        }
    };
    decoded.unwrap_or_else(|e| {
        warn!("Failed to decode call arguments: {}", e);
        Vec::new()
    })
}

impl Transport for SystemBusTransport {
    fn try_recv(&mut self) -> Option<MethodCall> {
        loop {
            let msg = self.inbound.try_receive().ok()?;
            let (interface, member) = {
                let header = msg.header();
                match (header.interface(), header.member()) {
                    (Some(i), Some(m)) => (i.to_string(), m.to_string()),
                    _ => continue,
                }
            };
            let args = decode_args(&msg);

            self.next_token += 1;
            let token = self.next_token;
            self.pending.insert(token, msg);
            return Some(MethodCall {
                token,
                interface,
                member,
                args,
            });
        }
    }

    fn reply(&mut self, token: u64, reply: Reply) -> Result<(), BusError> {
        let msg = self
            .pending
            .remove(&token)
            .ok_or(BusError::UnknownCall(token))?;
        let header = msg.header();

        match reply {
            Reply::Return(values) if values.is_empty() => {
                self.conn.reply(&header, &())?;
            }
            Reply::Return(values) => {
                self.conn.reply(&header, &Args(&values))?;
            }
            Reply::Error { name, message } => {
                self.conn.reply_error(&header, name.as_str(), &message)?;
            }
        }
        Ok(())
    }

    fn discard(&mut self, token: u64) {
        self.pending.remove(&token);
    }

    fn emit(&mut self, signal: &Signal) -> Result<(), BusError> {
        let path = signal.path.as_str();
        let interface = signal.interface.as_str();
        let name = signal.name.as_str();
        match &signal.arg {
            Some(arg) => self
                .conn
                .emit_signal(None::<&str>, path, interface, name, &arg.as_str())?,
            None => self
                .conn
                .emit_signal(None::<&str>, path, interface, name, &())?,
        }
        Ok(())
    }
}
