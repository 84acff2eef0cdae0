//! Demo object set
//!
//! Three objects with a handful of methods each. They are spawned in a fixed
//! order so listener sheets can refer to them by handle: the door is
//! `0`, the lamp `1` and the console `2`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use bolts_core::ObjectHandle;
use bolts_event::{BoltsEvent, ListenerError, MethodRegistry, PersistentListener, Value};
use parking_lot::Mutex;

// ========== Objects ==========

/// A door that can be opened and closed
#[derive(Debug, Default)]
pub struct Door {
    open: AtomicBool,
    toggles: AtomicU32,
}

impl Door {
    pub fn set_open(&self, open: bool) {
        if self.open.swap(open, Ordering::SeqCst) != open {
            self.toggles.fetch_add(1, Ordering::SeqCst);
        }
        log::info!("Door is now {}", if open { "open" } else { "closed" });
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn toggles(&self) -> u32 {
        self.toggles.load(Ordering::SeqCst)
    }
}

/// A dimmable lamp
#[derive(Debug)]
pub struct Lamp {
    lit: AtomicBool,
    brightness: Mutex<f32>,
}

impl Default for Lamp {
    fn default() -> Self {
        Self {
            lit: AtomicBool::new(false),
            brightness: Mutex::new(1.0),
        }
    }
}

impl Lamp {
    pub fn toggle(&self) {
        let lit = !self.lit.fetch_xor(true, Ordering::SeqCst);
        log::info!("Lamp {}", if lit { "on" } else { "off" });
    }

    pub fn set_brightness(&self, brightness: f32) -> Result<(), ListenerError> {
        if !(0.0..=1.0).contains(&brightness) {
            return Err(ListenerError::failed(format!(
                "brightness {} out of range 0..=1",
                brightness
            )));
        }
        *self.brightness.lock() = brightness;
        log::info!("Lamp brightness set to {:.2}", brightness);
        Ok(())
    }

    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::SeqCst)
    }

    pub fn brightness(&self) -> f32 {
        *self.brightness.lock()
    }
}

/// Collects printed lines
#[derive(Debug, Default)]
pub struct Console {
    lines: Mutex<Vec<String>>,
}

impl Console {
    pub fn print(&self, line: String) {
        log::info!("[console] {}", line);
        self.lines.lock().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

// ========== Scene ==========

/// The demo objects and the registry that resolves methods on them
pub struct Scene {
    pub registry: MethodRegistry,
    pub door: ObjectHandle,
    pub lamp: ObjectHandle,
    pub console: ObjectHandle,
}

impl Scene {
    /// Register methods and spawn the objects
    pub fn build() -> Self {
        let registry = MethodRegistry::new();

        registry
            .register_typed::<Door, (), _, _>("open", |door: &Door, ()| door.set_open(true))
            .register_typed::<Door, (), _, _>("close", |door: &Door, ()| door.set_open(false))
            .register_typed::<Door, (bool,), _, _>("set_open", |door: &Door, (open,): (bool,)| {
                door.set_open(open)
            });

        registry
            .register_typed::<Lamp, (), _, _>("toggle", |lamp: &Lamp, ()| lamp.toggle())
            .register_typed::<Lamp, (f32,), _, _>("set_brightness", |lamp: &Lamp, (b,): (f32,)| {
                lamp.set_brightness(b)
            });

        registry
            .register_typed::<Console, (Value,), _, _>("log", |console: &Console, (value,): (Value,)| {
                console.print(format!("{:?}", value))
            })
            .register_typed::<Console, (String, i32), _, _>(
                "log_pair",
                |console: &Console, (label, n): (String, i32)| console.print(format!("{} = {}", label, n)),
            );

        let door = registry.spawn("door", Door::default());
        let lamp = registry.spawn("lamp", Lamp::default());
        let console = registry.spawn("console", Console::default());

        Self {
            registry,
            door,
            lamp,
            console,
        }
    }

    /// Listener sheet used when no file is configured
    pub fn default_sheet(&self) -> BoltsEvent {
        let mut event = BoltsEvent::new();
        event.add_persistent_listener(PersistentListener::new(self.door, "open"));
        event.add_persistent_listener(PersistentListener::new(self.lamp, "toggle"));
        event.add_persistent_listener(
            PersistentListener::new(self.lamp, "set_brightness").with_parameter(0.5f32),
        );
        event.add_persistent_listener(
            PersistentListener::new(self.console, "log").with_parameter("door opened"),
        );
        event
    }

    pub fn door(&self) -> Option<Arc<Door>> {
        self.registry.get(self.door)
    }

    pub fn lamp(&self) -> Option<Arc<Lamp>> {
        self.registry.get(self.lamp)
    }

    pub fn console(&self) -> Option<Arc<Console>> {
        self.registry.get(self.console)
    }

    /// Log the state of every object
    pub fn print_state(&self) {
        if let Some(door) = self.door() {
            log::info!("  door: open={}, toggles={}", door.is_open(), door.toggles());
        }
        if let Some(lamp) = self.lamp() {
            log::info!("  lamp: lit={}, brightness={:.2}", lamp.is_lit(), lamp.brightness());
        }
        if let Some(console) = self.console() {
            log::info!("  console: {} line(s)", console.lines().len());
        }
    }
}
