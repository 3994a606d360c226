//! Power service (`org.roundel.Power`)
//!
//! Holds the system power state, turns the screen off after the idle
//! timeout and applies each state to the panel, the CPU governor and the
//! init system. Every state change is announced with `PowerStateChanged`.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, info, warn};

use roundel_bus::{BusError, MethodCall, Notifier, Reply, ServiceBus, Transport, Value};
use roundel_core::power::{PowerController, PowerState};
use roundel_drivers::{Clock, FrameBufferDisplay};
use roundel_hal::{Backlight, Scanout};

use crate::config::PowerConfig;
use crate::runloop::{Outbound, Service};

pub const POWER_SERVICE: &str = "org.roundel.Power";
pub const POWER_INTERFACE: &str = "org.roundel.Power";
pub const POWER_PATH: &str = "/org/roundel/Power";

/// Error reply for an unrecognised state name
pub const ERROR_INVALID_STATE: &str = "org.roundel.Error.InvalidState";

/// Side effects of entering a power state
pub trait PowerActions {
    fn set_panel(&mut self, on: bool);
    fn set_brightness(&mut self, level: u8);
    fn set_governor(&mut self, governor: &str);
    fn shutdown(&mut self);
}

/// Panel, cpufreq and init-system actions for the real device
pub struct SystemPowerActions<S: Scanout, B: Backlight> {
    display: FrameBufferDisplay<S, B>,
    cpu_root: PathBuf,
    cpu_count: u32,
    shutdown_command: Vec<String>,
}

impl<S: Scanout, B: Backlight> SystemPowerActions<S, B> {
    pub fn new(display: FrameBufferDisplay<S, B>, config: &PowerConfig) -> Self {
        Self {
            display,
            cpu_root: config.cpu_root.clone(),
            cpu_count: config.cpu_count,
            shutdown_command: config.shutdown_command.clone(),
        }
    }

    pub fn display(&self) -> &FrameBufferDisplay<S, B> {
        &self.display
    }
}

impl<S: Scanout, B: Backlight> PowerActions for SystemPowerActions<S, B> {
    fn set_panel(&mut self, on: bool) {
        if let Err(e) = self.display.set_power(on) {
            warn!("Failed to switch panel {}: {}", if on { "on" } else { "off" }, e);
        }
    }

    fn set_brightness(&mut self, level: u8) {
        self.display.set_brightness(level);
    }

    fn set_governor(&mut self, governor: &str) {
        for cpu in 0..self.cpu_count {
            let path = self
                .cpu_root
                .join(format!("cpu{}", cpu))
                .join("cpufreq/scaling_governor");
            if let Err(e) = fs::write(&path, governor) {
                debug!("Cannot set governor via {}: {}", path.display(), e);
            }
        }
        debug!("CPU governor {}", governor);
    }

    fn shutdown(&mut self) {
        let Some((program, args)) = self.shutdown_command.split_first() else {
            warn!("No shutdown command configured");
            return;
        };
        match Command::new(program).args(args).status() {
            Ok(status) if status.success() => info!("Shutdown requested"),
            Ok(status) => warn!("{} exited with {}", program, status),
            Err(e) => warn!("Failed to run {}: {}", program, e),
        }
    }
}

/// Power service state
pub struct PowerService<A> {
    controller: PowerController,
    actions: A,
    clock: Box<dyn Clock>,
    active_governor: String,
    screen_off_governor: String,
    outbound: Vec<Outbound>,
}

impl<A: PowerActions> PowerService<A> {
    /// Start in `Active` with the active CPU governor applied
    pub fn new(config: &PowerConfig, mut actions: A, clock: Box<dyn Clock>) -> Self {
        let controller = PowerController::new(config.screen_timeout_ms, clock.now_ms());
        info!(
            "Power service: screen timeout {} ms, governors {}/{}",
            config.screen_timeout_ms, config.active_governor, config.screen_off_governor
        );
        actions.set_governor(&config.active_governor);
        Self {
            controller,
            actions,
            clock,
            active_governor: config.active_governor.clone(),
            screen_off_governor: config.screen_off_governor.clone(),
            outbound: Vec::new(),
        }
    }

    /// Register the power methods
    pub fn register<T: Transport, N: Notifier>(bus: &mut ServiceBus<Self, T, N>) -> Result<(), BusError> {
        bus.register_method(POWER_INTERFACE, "SetPowerState", set_power_state::<A>)?;
        bus.register_method(POWER_INTERFACE, "GetPowerState", get_power_state::<A>)?;
        bus.register_method(POWER_INTERFACE, "SetScreenTimeout", set_screen_timeout::<A>)?;
        bus.register_method(POWER_INTERFACE, "ResetIdleTimer", reset_idle_timer::<A>)?;
        Ok(())
    }

    pub fn state(&self) -> PowerState {
        self.controller.state()
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    /// Move to `state`, applying and announcing it if it differs
    pub fn request(&mut self, state: PowerState) {
        if let Some(changed) = self.controller.request(state) {
            self.enter(changed);
        }
    }

    pub fn reset_idle_timer(&mut self) {
        if let Some(changed) = self.controller.reset_idle_timer(self.clock.now_ms()) {
            self.enter(changed);
        }
    }

    fn enter(&mut self, state: PowerState) {
        info!("Power state -> {}", state.as_str());
        match state {
            PowerState::Active => {
                self.actions.set_panel(true);
                self.actions.set_brightness(u8::MAX);
                self.actions.set_governor(&self.active_governor);
            }
            PowerState::ScreenOff => {
                self.actions.set_panel(false);
                self.actions.set_governor(&self.screen_off_governor);
            }
            PowerState::Suspended => warn!("Suspend is not supported, state recorded only"),
            PowerState::Shutdown => self.actions.shutdown(),
        }
        self.outbound.push(Outbound {
            interface: POWER_INTERFACE,
            name: "PowerStateChanged",
            payload: Some(state.as_str().to_string()),
        });
    }
}

impl<A: PowerActions> Service for PowerService<A> {
    fn name(&self) -> &'static str {
        "power"
    }

    fn tick(&mut self) {
        if let Some(changed) = self.controller.check_idle(self.clock.now_ms()) {
            debug!("Idle timeout reached");
            self.enter(changed);
        }
    }

    fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }
}

fn set_power_state<A: PowerActions>(svc: &mut PowerService<A>, call: &MethodCall) -> Reply {
    let name = match call.arg_str(0) {
        Ok(name) => name,
        Err(e) => return Reply::invalid_args(&e),
    };
    match PowerState::parse(name) {
        Some(state) => {
            svc.request(state);
            Reply::ok()
        }
        None => {
            warn!("Rejected power state '{}'", name);
            Reply::error(ERROR_INVALID_STATE, &format!("unknown power state '{}'", name))
        }
    }
}

fn get_power_state<A: PowerActions>(svc: &mut PowerService<A>, _call: &MethodCall) -> Reply {
    Reply::values(vec![Value::Str(svc.state().as_str().to_string())])
}

fn set_screen_timeout<A: PowerActions>(svc: &mut PowerService<A>, call: &MethodCall) -> Reply {
    match call.arg_u32(0) {
        Ok(ms) => {
            svc.controller.set_screen_timeout(ms);
            info!("Screen timeout {} ms", ms);
            Reply::ok()
        }
        Err(e) => Reply::invalid_args(&e),
    }
}

fn reset_idle_timer<A: PowerActions>(svc: &mut PowerService<A>, _call: &MethodCall) -> Reply {
    svc.reset_idle_timer();
    Reply::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runloop::ServiceLoop;
    use roundel_bus::{LoopbackClient, LoopbackTransport, RecordingNotifier};
    use roundel_drivers::{ManualClock, MemoryScanout};
    use roundel_hal::NoBacklight;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Action {
        Panel(bool),
        Brightness(u8),
        Governor(String),
        Shutdown,
    }

    #[derive(Default)]
    struct Recorder(Vec<Action>);

    impl PowerActions for Recorder {
        fn set_panel(&mut self, on: bool) {
            self.0.push(Action::Panel(on));
        }
        fn set_brightness(&mut self, level: u8) {
            self.0.push(Action::Brightness(level));
        }
        fn set_governor(&mut self, governor: &str) {
            self.0.push(Action::Governor(governor.to_string()));
        }
        fn shutdown(&mut self) {
            self.0.push(Action::Shutdown);
        }
    }

    type Loop = ServiceLoop<PowerService<Recorder>, LoopbackTransport, RecordingNotifier>;

    fn service(timeout_ms: u32) -> (Loop, LoopbackClient, ManualClock) {
        let clock = ManualClock::new(0);
        let config = PowerConfig {
            screen_timeout_ms: timeout_ms,
            ..PowerConfig::default()
        };
        let svc = PowerService::new(&config, Recorder::default(), Box::new(clock.clone()));

        let transport = LoopbackTransport::new();
        let client = transport.client();
        let mut bus = ServiceBus::with_transport(POWER_SERVICE, POWER_PATH, transport, RecordingNotifier::default());
        PowerService::register(&mut bus).unwrap();
        (ServiceLoop::new(bus, svc), client, clock)
    }

    fn state_of(lp: &mut Loop, client: &LoopbackClient) -> Reply {
        let t = client.call(POWER_INTERFACE, "GetPowerState", vec![]);
        lp.step();
        client.take_reply(t).unwrap()
    }

    #[test]
    fn test_idle_timeout_turns_screen_off() {
        let (mut lp, client, clock) = service(30_000);

        clock.set(29_999);
        lp.step();
        assert_eq!(lp.service().state(), PowerState::Active);

        clock.set(30_000);
        lp.step();
        assert_eq!(lp.service().state(), PowerState::ScreenOff);
        assert_eq!(
            lp.service().actions().0[1..],
            [Action::Panel(false), Action::Governor("powersave".into())]
        );

        let signals = client.take_signals();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].name, "PowerStateChanged");
        assert_eq!(signals[0].arg.as_deref(), Some("screen_off"));
    }

    #[test]
    fn test_reset_idle_timer_wakes_screen() {
        let (mut lp, client, clock) = service(1_000);
        clock.set(1_000);
        lp.step();
        client.take_signals();

        clock.set(1_500);
        let t = client.call(POWER_INTERFACE, "ResetIdleTimer", vec![]);
        lp.step();
        assert_eq!(client.take_reply(t), Some(Reply::ok()));
        assert_eq!(lp.service().state(), PowerState::Active);
        assert_eq!(
            lp.service().actions().0[3..],
            [
                Action::Panel(true),
                Action::Brightness(255),
                Action::Governor("schedutil".into())
            ]
        );

        // Timer restarted from the reset
        clock.set(2_400);
        lp.step();
        assert_eq!(lp.service().state(), PowerState::Active);
    }

    #[test]
    fn test_set_and_get_state() {
        let (mut lp, client, _clock) = service(30_000);

        let t = client.call(POWER_INTERFACE, "SetPowerState", vec![Value::Str("shutdown".into())]);
        lp.step();
        assert_eq!(client.take_reply(t), Some(Reply::ok()));
        assert_eq!(lp.service().actions().0[1..], [Action::Shutdown]);
        assert_eq!(state_of(&mut lp, &client), Reply::values(vec![Value::Str("shutdown".into())]));
    }

    #[test]
    fn test_same_state_is_not_reannounced() {
        let (mut lp, client, _clock) = service(30_000);
        let t = client.call(POWER_INTERFACE, "SetPowerState", vec![Value::Str("active".into())]);
        lp.step();
        assert_eq!(client.take_reply(t), Some(Reply::ok()));
        assert!(client.take_signals().is_empty());
        assert_eq!(lp.service().actions().0.len(), 1);
    }

    #[test]
    fn test_startup_applies_active_governor() {
        let (mut lp, client, _clock) = service(30_000);
        assert_eq!(lp.service().actions().0, vec![Action::Governor("schedutil".into())]);

        lp.step();
        assert!(client.take_signals().is_empty());
        assert_eq!(lp.service().state(), PowerState::Active);
    }

    #[test]
    fn test_unknown_state_is_error_reply() {
        let (mut lp, client, _clock) = service(30_000);
        let t = client.call(POWER_INTERFACE, "SetPowerState", vec![Value::Str("hibernate".into())]);
        lp.step();
        match client.take_reply(t) {
            Some(Reply::Error { name, .. }) => assert_eq!(name, ERROR_INVALID_STATE),
            other => panic!("unexpected reply {:?}", other),
        }
        assert_eq!(lp.service().state(), PowerState::Active);
    }

    #[test]
    fn test_zero_timeout_disables_idle() {
        let (mut lp, client, clock) = service(30_000);
        let t = client.call(POWER_INTERFACE, "SetScreenTimeout", vec![Value::U32(0)]);
        lp.step();
        assert_eq!(client.take_reply(t), Some(Reply::ok()));

        clock.set(1_000_000);
        lp.step();
        assert_eq!(lp.service().state(), PowerState::Active);
    }

    #[test]
    fn test_system_actions_write_governors() {
        let root = tempfile::tempdir().unwrap();
        for cpu in 0..2 {
            fs::create_dir_all(root.path().join(format!("cpu{}/cpufreq", cpu))).unwrap();
        }
        let config = PowerConfig {
            cpu_root: root.path().to_path_buf(),
            cpu_count: 2,
            ..PowerConfig::default()
        };
        let display = FrameBufferDisplay::open(MemoryScanout::panel(), NoBacklight).unwrap();
        let mut actions = SystemPowerActions::new(display, &config);

        actions.set_governor("powersave");
        actions.set_panel(false);
        for cpu in 0..2 {
            let path = root.path().join(format!("cpu{}/cpufreq/scaling_governor", cpu));
            assert_eq!(fs::read_to_string(path).unwrap(), "powersave");
        }
        assert!(!actions.display().scanout().is_powered());
    }
}
