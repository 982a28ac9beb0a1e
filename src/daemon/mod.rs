//! Overlay daemon: the single thread that owns the coordinator
//!
//! Each pass of the loop fires timers that came due during the sleep, drains
//! X events, samples the pointer, applies control requests, fires due timers
//! again and then sleeps until the next poll or timer deadline, whichever is
//! sooner.

pub mod ipc_handler;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;

use crate::actions::ActionRunner;
use crate::config::Config;
use crate::coordinator::{HoverTriggerCoordinator, OverlayState};
use crate::display::DisplaySource;
use crate::ipc::{ControlRequest, ControlResponse, ControlServer};
use crate::overlay::{OverlaySurface, SwitchPanel};
use crate::pointer::PointerSampler;
use crate::x11::{check_randr, AppContext, CachedAtoms, OverlayStyle, X11Displays, X11Overlay, X11Pointer};

use ipc_handler::{spawn_ipc_listener, ControlEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Shutdown,
}

/// Apply one control request to the coordinator
pub fn handle_control<D: DisplaySource, O: OverlaySurface>(
    coordinator: &mut HoverTriggerCoordinator<D, O>,
    request: &ControlRequest,
    show_once_default: Duration,
    now: Instant,
) -> (ControlResponse, LoopControl) {
    match request {
        ControlRequest::ShowOnce { duration_ms } => {
            let duration = duration_ms.map(Duration::from_millis).unwrap_or(show_once_default);
            coordinator.show_once(duration, None, now);
            if coordinator.overlay().is_visible() {
                (ControlResponse::Ready, LoopControl::Continue)
            } else {
                (
                    ControlResponse::Error("overlay could not be presented".to_string()),
                    LoopControl::Continue,
                )
            }
        }
        ControlRequest::Hide => {
            coordinator.hide_immediately();
            (ControlResponse::Ready, LoopControl::Continue)
        }
        ControlRequest::UpdateDelays { show_ms, hide_ms } => {
            coordinator.update_delays(show_ms / 1000.0, hide_ms / 1000.0);
            (ControlResponse::Ready, LoopControl::Continue)
        }
        ControlRequest::Status => (status(coordinator), LoopControl::Continue),
        ControlRequest::Ping => (ControlResponse::Pong, LoopControl::Continue),
        ControlRequest::Shutdown => {
            info!("Shutdown requested over IPC");
            (ControlResponse::Ready, LoopControl::Shutdown)
        }
    }
}

fn status<D: DisplaySource, O: OverlaySurface>(coordinator: &HoverTriggerCoordinator<D, O>) -> ControlResponse {
    let state = coordinator.state();
    let display = match state {
        OverlayState::PendingShow { display, .. } => Some(display.to_string()),
        _ => state.shown_display().map(|d| d.name.clone()),
    };
    let config = coordinator.config();
    ControlResponse::Status {
        phase: state.phase(),
        visible: coordinator.overlay().is_visible(),
        display,
        show_delay_ms: config.show_delay.as_micros() as f64 / 1000.0,
        hide_delay_ms: config.hide_delay.as_micros() as f64 / 1000.0,
    }
}

/// Re-read the config file and push every runtime-tunable value through.
/// A broken file keeps the running settings.
fn reload_config(
    path: &Path,
    config: &mut Config,
    coordinator: &mut HoverTriggerCoordinator<X11Displays<'_>, X11Overlay<'_>>,
    actions: &mut ActionRunner,
) {
    let fresh = match Config::load_from(path) {
        Ok(fresh) => fresh,
        Err(e) => {
            error!(error = ?e, "Config reload failed, keeping current settings");
            return;
        }
    };

    coordinator.update_delays(fresh.show_delay_ms / 1000.0, fresh.hide_delay_ms / 1000.0);
    coordinator.update_trigger_ratio(fresh.trigger_width_ratio);
    coordinator.set_layout(fresh.layout());
    coordinator.displays_mut().set_config(&fresh);
    coordinator
        .overlay_mut()
        .set_appearance(fresh.layout(), OverlayStyle::from_config(&fresh));
    actions.set_bindings(fresh.actions.clone());

    if fresh.poll_interval_ms != config.poll_interval_ms {
        info!(from = config.poll_interval_ms, to = fresh.poll_interval_ms, "Pointer poll interval changed");
    }
    *config = fresh;
    info!(path = %path.display(), "Config reloaded");
}

fn register_signals() -> Result<(Arc<AtomicBool>, Arc<AtomicBool>)> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

    let reload = Arc::new(AtomicBool::new(false));
    let terminate = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGHUP, Arc::clone(&reload)).context("Failed to register SIGHUP handler")?;
    signal_hook::flag::register(SIGINT, Arc::clone(&terminate)).context("Failed to register SIGINT handler")?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&terminate)).context("Failed to register SIGTERM handler")?;
    Ok((reload, terminate))
}

pub fn run_daemon(config_path: &Path, socket_path: PathBuf) -> Result<()> {
    let mut config = Config::load_from(config_path)?;
    debug!(config = ?config, "Effective configuration");

    let (conn, screen_num) = x11rb::connect(None)
        .context("Failed to connect to X11 server. Is DISPLAY set correctly?")?;
    let screen = &conn.setup().roots[screen_num];
    info!(
        screen = screen_num,
        width = screen.width_in_pixels,
        height = screen.height_in_pixels,
        "Connected to X11 server"
    );
    check_randr(&conn)?;

    // Pre-cache atoms once at startup
    let atoms = CachedAtoms::new(&conn).context("Failed to cache X11 atoms at startup")?;
    let ctx = AppContext {
        conn: &conn,
        screen,
        atoms: &atoms,
    };

    let mut coordinator = HoverTriggerCoordinator::new(
        config.trigger_config(),
        config.layout(),
        SwitchPanel::default(),
        X11Displays::new(&ctx, &config),
        X11Overlay::new(&ctx, config.layout(), OverlayStyle::from_config(&config)),
    );
    let mut sampler = PointerSampler::new(X11Pointer::new(&ctx));
    let mut actions = ActionRunner::new(config.actions.clone());

    let (reload, terminate) = register_signals()?;

    let server = ControlServer::bind_to(socket_path.clone())?;
    let (command_tx, command_rx) = mpsc::channel::<ControlEnvelope>();
    let _ipc_handle = spawn_ipc_listener(server, command_tx);

    info!(socket = %socket_path.display(), "Overlay daemon running");

    let result = run_loop(
        &conn,
        config_path,
        &mut config,
        &mut coordinator,
        &mut sampler,
        &mut actions,
        &command_rx,
        &reload,
        &terminate,
    );

    coordinator.hide_immediately();
    coordinator.overlay_mut().release_all();
    // The listener thread is parked in accept(); its server never drops
    if let Err(e) = std::fs::remove_file(&socket_path) {
        debug!(error = %e, "Control socket already gone");
    }
    info!(running_actions = actions.running(), "Overlay daemon stopped");
    result
}

#[allow(clippy::too_many_arguments)]
fn run_loop(
    conn: &impl Connection,
    config_path: &Path,
    config: &mut Config,
    coordinator: &mut HoverTriggerCoordinator<X11Displays<'_>, X11Overlay<'_>>,
    sampler: &mut PointerSampler<X11Pointer<'_>>,
    actions: &mut ActionRunner,
    commands: &mpsc::Receiver<ControlEnvelope>,
    reload: &AtomicBool,
    terminate: &AtomicBool,
) -> Result<()> {
    loop {
        if terminate.load(Ordering::Relaxed) {
            info!("Termination signal received");
            return Ok(());
        }
        if reload.swap(false, Ordering::Relaxed) {
            reload_config(config_path, config, coordinator, actions);
            sampler.reset();
        }

        // Timers that came due while sleeping go before anything that arrived after them
        coordinator.fire_due_timers(Instant::now());

        while let Some(event) = conn
            .poll_for_event()
            .context("Lost connection to X11 server")?
        {
            let Some(action) = coordinator.overlay_mut().handle_event(&event) else {
                continue;
            };
            let hide_after = actions
                .run(action)
                .inspect_err(|e| error!(action = ?action, error = ?e, "Action failed"))
                .unwrap_or(false);
            if hide_after {
                coordinator.hide_immediately();
            }
        }

        match sampler.poll() {
            Ok(Some(point)) => coordinator.handle_pointer(point, Instant::now()),
            Ok(None) => {}
            Err(e) => warn!(error = ?e, "Pointer sample failed"),
        }

        while let Ok(envelope) = commands.try_recv() {
            let (response, control) = handle_control(
                coordinator,
                &envelope.request,
                config.show_once_duration(),
                Instant::now(),
            );
            envelope.respond(response);
            if control == LoopControl::Shutdown {
                return Ok(());
            }
        }

        let now = Instant::now();
        coordinator.fire_due_timers(now);
        coordinator.overlay_mut().release_expired(now);
        actions.reap();

        let mut wake = now + config.poll_interval();
        if let Some(deadline) = coordinator.next_deadline() {
            wake = wake.min(deadline);
        }
        std::thread::sleep(wake.saturating_duration_since(Instant::now()));
    }
}
