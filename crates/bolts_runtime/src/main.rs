//! Bolts demo host
//!
//! Boots logging, loads the run configuration, spawns the demo scene and
//! fires a listener sheet against it.

mod config;
mod scene;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bolts_event::persist::{self, PersistFormat};
use bolts_event::{Action, BoltsEvent, DispatchReport, DynamicListener, Value};

use crate::config::RunConfig;
use crate::scene::Scene;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunConfig::load();
    config.print_summary();

    let scene = Scene::build();
    let mut event = load_sheet(&config, &scene);
    event.set_config(config.dispatch.clone());

    let args = config.args();
    let fired = Arc::new(AtomicU32::new(0));
    attach_runtime_listeners(&event, &fired, args.len());

    for pass in 1..=config.run.repeat {
        let report = if args.is_empty() {
            event.invoke(&scene.registry)
        } else {
            event.invoke_with(&scene.registry, &args)
        };
        log_report(pass, &report);
    }

    log::info!("Event fired {} time(s)", fired.load(Ordering::SeqCst));
    log::info!("Scene state:");
    scene.print_state();
}

/// Load the configured listener sheet, falling back to the built-in one
fn load_sheet(config: &RunConfig, scene: &Scene) -> BoltsEvent {
    let Some(path) = &config.run.listeners else {
        log::info!("No listener sheet configured, using the built-in sheet");
        return scene.default_sheet();
    };

    match persist::load(path, PersistFormat::from_path(path)) {
        Ok(event) => {
            log::info!(
                "Loaded {} persistent listener(s) from {}",
                event.persistent_count(),
                path.display()
            );
            event
        }
        Err(e) => {
            log::warn!("Failed to load listener sheet {}: {}", path.display(), e);
            log::info!("Falling back to the built-in sheet");
            scene.default_sheet()
        }
    }
}

fn attach_runtime_listeners(event: &BoltsEvent, fired: &Arc<AtomicU32>, arity: usize) {
    let counter = Arc::clone(fired);
    event.add_listener(
        Action::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .named("fire counter"),
    );

    if arity > 0 {
        event.add_listener(
            DynamicListener::new(arity, |args: &[Value]| {
                log::info!("Event fired with {:?}", args);
            })
            .named("argument echo"),
        );
    }
}

fn log_report(pass: u32, report: &DispatchReport) {
    if report.is_clean() {
        log::info!("Pass {}: {} listener(s) ran", pass, report.attempted);
    } else {
        log::warn!(
            "Pass {}: {}/{} listener(s) succeeded",
            pass,
            report.succeeded(),
            report.attempted
        );
    }
}
