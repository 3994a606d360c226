//! Service bus: name ownership, method dispatch, signals and supervision

use log::{debug, info, warn};

use crate::dbus::SystemBusTransport;
use crate::error::BusError;
use crate::message::Reply;
use crate::notify::{Notifier, SdNotifier};
use crate::table::{Handler, MethodTable};
use crate::transport::{Signal, Transport};

/// One service's presence on the bus
///
/// `S` is the service state handed to every handler.
pub struct ServiceBus<S, T = SystemBusTransport, N = SdNotifier> {
    service_name: String,
    object_path: String,
    table: MethodTable<S>,
    transport: T,
    notifier: N,
}

impl<S> ServiceBus<S> {
    /// Connect to the system bus and claim `service_name`
    ///
    /// Failing to claim the name is fatal for the caller.
    pub fn init(service_name: &str, object_path: &str) -> Result<Self, BusError> {
        let transport = SystemBusTransport::connect(service_name)?;
        Ok(Self::with_transport(service_name, object_path, transport, SdNotifier))
    }
}

impl<S, T: Transport, N: Notifier> ServiceBus<S, T, N> {
    /// Build over an already-connected transport
    pub fn with_transport(service_name: &str, object_path: &str, transport: T, notifier: N) -> Self {
        info!("Service bus ready: {} at {}", service_name, object_path);
        Self {
            service_name: service_name.to_string(),
            object_path: object_path.to_string(),
            table: MethodTable::new(),
            transport,
            notifier,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    /// Add a method route; only allowed before the first [`process`](Self::process)
    pub fn register_method(&mut self, interface: &str, method: &str, handler: Handler<S>) -> Result<(), BusError> {
        self.table.register(interface, method, handler)?;
        debug!("Registered {}.{}", interface, method);
        Ok(())
    }

    /// Dispatch every queued call; returns how many were answered
    ///
    /// Calls with no matching route are dropped without a reply.
    pub fn process(&mut self, state: &mut S) -> usize {
        self.table.seal();
        let mut handled = 0;

        while let Some(call) = self.transport.try_recv() {
            match self.table.lookup(&call.interface, &call.member) {
                Some(handler) => {
                    let reply = handler(state, &call);
                    if let Reply::Error { name, .. } = &reply {
                        debug!("{}.{} -> error {}", call.interface, call.member, name);
                    }
                    match self.transport.reply(call.token, reply) {
                        Ok(()) => handled += 1,
                        Err(e) => warn!("Failed to reply to {}.{}: {}", call.interface, call.member, e),
                    }
                }
                None => {
                    debug!("Unhandled call {}.{}", call.interface, call.member);
                    self.transport.discard(call.token);
                }
            }
        }

        handled
    }

    /// Broadcast a signal from this service's object path
    pub fn send_signal(&mut self, interface: &str, name: &str, payload: Option<&str>) -> Result<(), BusError> {
        let signal = Signal {
            path: self.object_path.clone(),
            interface: interface.to_string(),
            name: name.to_string(),
            arg: payload.map(str::to_string),
        };
        self.transport.emit(&signal)
    }

    /// Tell the supervisor startup is complete
    pub fn notify_ready(&self) {
        self.notifier.ready();
    }

    /// Liveness ping for the supervisor's watchdog
    pub fn send_watchdog(&self) {
        self.notifier.watchdog();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackTransport;
    use crate::message::{MethodCall, Value};
    use crate::notify::RecordingNotifier;

    const IFACE: &str = "org.roundel.Test";

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    fn add(state: &mut Counter, call: &MethodCall) -> Reply {
        match call.arg_u32(0) {
            Ok(n) => {
                state.value += n;
                Reply::ok()
            }
            Err(e) => Reply::invalid_args(&e),
        }
    }

    fn get(state: &mut Counter, _call: &MethodCall) -> Reply {
        Reply::values(vec![Value::U32(state.value)])
    }

    fn bus() -> (ServiceBus<Counter, LoopbackTransport, RecordingNotifier>, crate::LoopbackClient) {
        let transport = LoopbackTransport::new();
        let client = transport.client();
        let mut bus = ServiceBus::with_transport(IFACE, "/org/roundel/Test", transport, RecordingNotifier::default());
        bus.register_method(IFACE, "Add", add).unwrap();
        bus.register_method(IFACE, "Get", get).unwrap();
        (bus, client)
    }

    #[test]
    fn test_dispatch_and_reply() {
        let (mut bus, client) = bus();
        let mut state = Counter::default();

        let a = client.call(IFACE, "Add", vec![Value::U32(5)]);
        let g = client.call(IFACE, "Get", vec![]);
        assert_eq!(bus.process(&mut state), 2);

        assert_eq!(client.take_reply(a), Some(Reply::ok()));
        assert_eq!(client.take_reply(g), Some(Reply::values(vec![Value::U32(5)])));
    }

    #[test]
    fn test_unknown_route_gets_no_reply() {
        let (mut bus, client) = bus();
        let mut state = Counter::default();

        let t = client.call(IFACE, "Missing", vec![]);
        let other = client.call("org.roundel.Other", "Add", vec![Value::U32(1)]);
        assert_eq!(bus.process(&mut state), 0);

        assert_eq!(client.take_reply(t), None);
        assert_eq!(client.take_reply(other), None);
        assert!(client.was_discarded(t));
        assert_eq!(state.value, 0);
    }

    #[test]
    fn test_bad_argument_is_error_reply() {
        let (mut bus, client) = bus();
        let mut state = Counter::default();
        let t = client.call(IFACE, "Add", vec![Value::Str("x".into())]);
        bus.process(&mut state);
        assert!(matches!(client.take_reply(t), Some(Reply::Error { .. })));
    }

    #[test]
    fn test_late_registration_rejected() {
        let (mut bus, _client) = bus();
        bus.process(&mut Counter::default());
        assert!(matches!(bus.register_method(IFACE, "Late", get), Err(BusError::Sealed)));
    }

    #[test]
    fn test_signals_and_notifications() {
        let transport = LoopbackTransport::new();
        let client = transport.client();
        let notifier = RecordingNotifier::default();
        let mut bus: ServiceBus<Counter, _, _> =
            ServiceBus::with_transport(IFACE, "/org/roundel/Test", transport, notifier.clone());

        bus.send_signal(IFACE, "Changed", Some("active")).unwrap();
        bus.send_signal(IFACE, "Poke", None).unwrap();
        let signals = client.take_signals();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].path, "/org/roundel/Test");
        assert_eq!(signals[0].arg.as_deref(), Some("active"));
        assert_eq!(signals[1].arg, None);

        bus.notify_ready();
        bus.send_watchdog();
        bus.send_watchdog();
        assert_eq!(notifier.ready_count(), 1);
        assert_eq!(notifier.watchdog_count(), 2);
    }
}
