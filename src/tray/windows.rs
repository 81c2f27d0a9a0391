//! Windows system tray implementation.

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem},
    TrayIcon, TrayIconBuilder,
};
use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::WindowId;

use crate::config::SupervisorConfig;
use crate::controller::{Controller, StartOutcome};
use crate::status::{StatusSink, TrayStatus, ICON_SIZE};

/// Menu item IDs
mod menu_ids {
    pub const STATUS: &str = "status";
    pub const START: &str = "start";
    pub const STOP: &str = "stop";
    pub const RESTART: &str = "restart";
    pub const OPEN_LOGS: &str = "open_logs";
    pub const EXIT: &str = "exit";
}

/// Events delivered into the tray event loop.
#[derive(Debug)]
enum UserEvent {
    Menu(MenuEvent),
    StatusChanged,
    Interrupt,
}

/// Status sink that stores the latest status and wakes the event loop to draw it.
struct TrayIndicator {
    status: Mutex<TrayStatus>,
    proxy: EventLoopProxy<UserEvent>,
}

impl TrayIndicator {
    fn new(proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            status: Mutex::new(TrayStatus::Stopped),
            proxy,
        }
    }

    fn current(&self) -> TrayStatus {
        *self.status.lock()
    }
}

impl StatusSink for TrayIndicator {
    fn set_status(&self, status: TrayStatus) {
        *self.status.lock() = status;
        let _ = self.proxy.send_event(UserEvent::StatusChanged);
    }
}

/// Menu entries that change with the status.
struct StatusMenu {
    header: MenuItem,
    start: MenuItem,
    stop: MenuItem,
}

/// Application state for the tray icon
struct TrayApp {
    config: SupervisorConfig,
    controller: Controller,
    indicator: Arc<TrayIndicator>,
    tray_icon: Option<TrayIcon>,
    status_menu: Option<StatusMenu>,
}

impl TrayApp {
    fn new(config: SupervisorConfig, indicator: Arc<TrayIndicator>) -> Self {
        let controller = Controller::new(&config, indicator.clone());
        Self {
            config,
            controller,
            indicator,
            tray_icon: None,
            status_menu: None,
        }
    }

    fn create_menu(&self) -> Result<(Menu, StatusMenu)> {
        let menu = Menu::new();
        let title = TrayStatus::Stopped.title(&self.config.display_name);

        // Status item (disabled, just shows info)
        let header = MenuItem::with_id(menu_ids::STATUS, &title, false, None);
        menu.append(&header)?;

        menu.append(&PredefinedMenuItem::separator())?;

        let start = MenuItem::with_id(menu_ids::START, "Start", true, None);
        menu.append(&start)?;

        let stop = MenuItem::with_id(menu_ids::STOP, "Stop", false, None);
        menu.append(&stop)?;

        let restart = MenuItem::with_id(menu_ids::RESTART, "Restart", true, None);
        menu.append(&restart)?;

        let logs_item = MenuItem::with_id(menu_ids::OPEN_LOGS, "Open Logs Folder...", true, None);
        menu.append(&logs_item)?;

        menu.append(&PredefinedMenuItem::separator())?;

        // Exit
        let exit_item = MenuItem::with_id(menu_ids::EXIT, "Exit", true, None);
        menu.append(&exit_item)?;

        Ok((menu, StatusMenu { header, start, stop }))
    }

    /// Build the icon in the stopped state, then auto-start the process.
    fn init(&mut self) -> Result<()> {
        let (menu, status_menu) = self.create_menu()?;
        let status = TrayStatus::Stopped;

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(status.title(&self.config.display_name))
            .with_icon(status_icon(status)?)
            .build()
            .map_err(|e| anyhow!("Failed to create tray icon: {}", e))?;

        self.tray_icon = Some(tray_icon);
        self.status_menu = Some(status_menu);
        info!("System tray icon created");

        self.start_process();
        self.refresh();
        Ok(())
    }

    /// Apply the latest status to the icon, tooltip and menu.
    fn refresh(&self) {
        let status = self.indicator.current();
        let title = status.title(&self.config.display_name);

        if let Some(tray_icon) = &self.tray_icon {
            match status_icon(status) {
                Ok(icon) => {
                    if let Err(e) = tray_icon.set_icon(Some(icon)) {
                        warn!(error = %e, "Failed to update tray icon");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to render tray icon"),
            }
            if let Err(e) = tray_icon.set_tooltip(Some(&title)) {
                warn!(error = %e, "Failed to update tray tooltip");
            }
        }

        if let Some(menu) = &self.status_menu {
            menu.header.set_text(&title);
            menu.start.set_enabled(!status.is_running());
            menu.stop.set_enabled(status.is_running());
        }
    }

    fn start_process(&self) {
        match self.controller.start() {
            Ok(StartOutcome::Started { pid, log_path }) => {
                info!(pid, log = %log_path.display(), "Process started successfully");
            }
            Ok(StartOutcome::AlreadyRunning { pid }) => info!(pid, "Process already running"),
            Err(e) => error!(error = %e, "Failed to start process"),
        }
    }

    fn handle_menu_event(&self, event_loop: &ActiveEventLoop, event: MenuEvent) {
        // Liveness is only ever observed on demand; pick up external exits first
        self.controller.is_running();

        match event.id.0.as_str() {
            menu_ids::START => self.start_process(),
            menu_ids::STOP => {
                let outcome = self.controller.stop();
                info!(outcome = ?outcome, "Stop requested from menu");
            }
            menu_ids::RESTART => match self.controller.restart() {
                Ok(outcome) => info!(outcome = ?outcome, "Process restarted"),
                Err(e) => error!(error = %e, "Failed to restart process"),
            },
            menu_ids::OPEN_LOGS => {
                if let Err(e) = self.open_logs() {
                    error!(error = %e, "Failed to open logs");
                }
            }
            menu_ids::EXIT => self.exit(event_loop),
            _ => {}
        }
    }

    fn open_logs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.log_dir)?;
        std::process::Command::new("explorer")
            .arg(&self.config.log_dir)
            .spawn()?;
        Ok(())
    }

    fn exit(&self, event_loop: &ActiveEventLoop) {
        super::shutdown(&self.controller);
        event_loop.exit();
    }
}

impl ApplicationHandler<UserEvent> for TrayApp {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        if matches!(cause, StartCause::Init) && self.tray_icon.is_none() {
            if let Err(e) = self.init() {
                error!(error = %e, "Failed to initialize tray");
                super::shutdown(&self.controller);
                event_loop.exit();
            }
        }
    }

    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // We don't have any windows, just the tray icon
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Menu(event) => self.handle_menu_event(event_loop, event),
            UserEvent::StatusChanged => self.refresh(),
            UserEvent::Interrupt => {
                info!("Signal received, stopping tray");
                self.exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}

/// Render the tray icon for `status`.
fn status_icon(status: TrayStatus) -> Result<tray_icon::Icon> {
    let rgba = status.icon_image(ICON_SIZE);
    let (width, height) = rgba.dimensions();

    tray_icon::Icon::from_rgba(rgba.into_raw(), width, height)
        .map_err(|e| anyhow!("Failed to create icon: {}", e))
}

/// Run the system tray application
pub async fn run_tray(config: SupervisorConfig) -> Result<()> {
    info!("Starting system tray; right-click the icon for options");

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    let proxy = event_loop.create_proxy();

    let menu_proxy = proxy.clone();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        let _ = menu_proxy.send_event(UserEvent::Menu(event));
    }));

    let interrupt_proxy = proxy.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        let _ = interrupt_proxy.send_event(UserEvent::Interrupt);
    });

    let indicator = Arc::new(TrayIndicator::new(proxy));
    let mut app = TrayApp::new(config, indicator);

    event_loop.run_app(&mut app)?;

    Ok(())
}
