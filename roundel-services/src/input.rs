//! Input service (`org.roundel.Input`)
//!
//! Broadcasts every touch and button sample the pollers produce and keeps
//! the most recent one of each for `GetLastTouch` / `GetLastButton`.

use std::sync::Arc;

use log::trace;

use roundel_bus::{BusError, MethodCall, Notifier, Reply, ServiceBus, Transport, Value};
use roundel_core::input::{ButtonSample, TouchSample};
use roundel_drivers::channels::drain;
use roundel_drivers::{ButtonQueue, TouchQueue};

use crate::runloop::{Outbound, Service};

pub const INPUT_SERVICE: &str = "org.roundel.Input";
pub const INPUT_INTERFACE: &str = "org.roundel.Input";
pub const INPUT_PATH: &str = "/org/roundel/Input";

/// `kind,x,y,timestamp`
pub fn touch_payload(sample: &TouchSample) -> String {
    format!(
        "{},{},{},{}",
        sample.kind.as_str(),
        sample.x,
        sample.y,
        sample.timestamp_ms
    )
}

/// `kind,timestamp,duration`
pub fn button_payload(sample: &ButtonSample) -> String {
    format!(
        "{},{},{}",
        sample.kind.as_str(),
        sample.timestamp_ms,
        sample.duration_ms
    )
}

/// Input service state
pub struct InputService {
    touch: Arc<TouchQueue>,
    button: Arc<ButtonQueue>,
    last_touch: Option<TouchSample>,
    last_button: Option<ButtonSample>,
    outbound: Vec<Outbound>,
}

impl InputService {
    pub fn new(touch: Arc<TouchQueue>, button: Arc<ButtonQueue>) -> Self {
        Self {
            touch,
            button,
            last_touch: None,
            last_button: None,
            outbound: Vec::new(),
        }
    }

    /// Register the input methods
    pub fn register<T: Transport, N: Notifier>(bus: &mut ServiceBus<Self, T, N>) -> Result<(), BusError> {
        bus.register_method(INPUT_INTERFACE, "GetLastTouch", get_last_touch)?;
        bus.register_method(INPUT_INTERFACE, "GetLastButton", get_last_button)?;
        Ok(())
    }

    pub fn last_touch(&self) -> Option<TouchSample> {
        self.last_touch
    }

    pub fn last_button(&self) -> Option<ButtonSample> {
        self.last_button
    }
}

impl Service for InputService {
    fn name(&self) -> &'static str {
        "input"
    }

    fn tick(&mut self) {
        for sample in drain(&self.touch) {
            trace!("touch {:?}", sample);
            self.last_touch = Some(sample);
            self.outbound.push(Outbound {
                interface: INPUT_INTERFACE,
                name: "TouchEvent",
                payload: Some(touch_payload(&sample)),
            });
        }

        for sample in drain(&self.button) {
            trace!("button {:?}", sample);
            self.last_button = Some(sample);
            self.outbound.push(Outbound {
                interface: INPUT_INTERFACE,
                name: "ButtonEvent",
                payload: Some(button_payload(&sample)),
            });
        }
    }

    fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }
}

/// `(x, y, timestamp)`, zeros before the first touch
fn get_last_touch(svc: &mut InputService, _call: &MethodCall) -> Reply {
    let (x, y, ts) = svc
        .last_touch
        .map_or((0, 0, 0), |s| (s.x, s.y, s.timestamp_ms));
    Reply::values(vec![Value::I16(x), Value::I16(y), Value::U32(ts)])
}

/// `(type, timestamp, duration)`, zeros before the first press
fn get_last_button(svc: &mut InputService, _call: &MethodCall) -> Reply {
    let (code, ts, duration) = svc
        .last_button
        .map_or((0, 0, 0), |s| (s.kind.code(), s.timestamp_ms, s.duration_ms));
    Reply::values(vec![Value::U32(code), Value::U32(ts), Value::U16(duration)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runloop::ServiceLoop;
    use roundel_bus::{LoopbackClient, LoopbackTransport, RecordingNotifier};
    use roundel_core::input::{ButtonKind, TouchKind};
    use roundel_drivers::channels::{button_queue, offer, touch_queue};

    type Loop = ServiceLoop<InputService, LoopbackTransport, RecordingNotifier>;

    fn service() -> (Loop, LoopbackClient, Arc<TouchQueue>, Arc<ButtonQueue>) {
        let touch = touch_queue();
        let button = button_queue();
        let transport = LoopbackTransport::new();
        let client = transport.client();
        let mut bus = ServiceBus::with_transport(INPUT_SERVICE, INPUT_PATH, transport, RecordingNotifier::default());
        InputService::register(&mut bus).unwrap();
        let lp = ServiceLoop::new(bus, InputService::new(touch.clone(), button.clone()));
        (lp, client, touch, button)
    }

    #[test]
    fn test_signals_in_arrival_order() {
        let (mut lp, client, touch, button) = service();
        offer(
            &touch,
            TouchSample { x: 10, y: 20, kind: TouchKind::Press, timestamp_ms: 100 },
            "touch",
        );
        offer(
            &touch,
            TouchSample { x: 10, y: 90, kind: TouchKind::SwipeDown, timestamp_ms: 140 },
            "touch",
        );
        offer(
            &button,
            ButtonSample { kind: ButtonKind::LongPress, timestamp_ms: 900, duration_ms: 600 },
            "button",
        );

        lp.step();
        let signals = client.take_signals();
        let payloads: Vec<(&str, Option<&str>)> = signals
            .iter()
            .map(|s| (s.name.as_str(), s.arg.as_deref()))
            .collect();
        assert_eq!(
            payloads,
            vec![
                ("TouchEvent", Some("press,10,20,100")),
                ("TouchEvent", Some("swipe_down,10,90,140")),
                ("ButtonEvent", Some("long_press,900,600")),
            ]
        );
    }

    #[test]
    fn test_last_event_queries() {
        let (mut lp, client, touch, button) = service();

        let t = client.call(INPUT_INTERFACE, "GetLastTouch", vec![]);
        lp.step();
        assert_eq!(
            client.take_reply(t),
            Some(Reply::values(vec![Value::I16(0), Value::I16(0), Value::U32(0)]))
        );

        offer(&touch, TouchSample { x: 5, y: 7, kind: TouchKind::Tap, timestamp_ms: 42 }, "touch");
        offer(
            &button,
            ButtonSample { kind: ButtonKind::DoublePress, timestamp_ms: 200, duration_ms: 50 },
            "button",
        );
        lp.step();

        let t = client.call(INPUT_INTERFACE, "GetLastTouch", vec![]);
        let b = client.call(INPUT_INTERFACE, "GetLastButton", vec![]);
        lp.step();
        assert_eq!(
            client.take_reply(t),
            Some(Reply::values(vec![Value::I16(5), Value::I16(7), Value::U32(42)]))
        );
        assert_eq!(
            client.take_reply(b),
            Some(Reply::values(vec![Value::U32(1), Value::U32(200), Value::U16(50)]))
        );
    }
}
