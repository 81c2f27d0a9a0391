//! Running/stopped status and its visual representation.

use std::fmt;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tracing::info;

/// Edge length of the generated tray bitmap.
#[cfg_attr(not(windows), allow(dead_code))]
pub const ICON_SIZE: u32 = 64;

/// Supervised process status as shown in the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrayStatus {
    Running,
    #[default]
    Stopped,
}

impl TrayStatus {
    pub fn from_running(running: bool) -> Self {
        if running {
            TrayStatus::Running
        } else {
            TrayStatus::Stopped
        }
    }

    pub fn is_running(self) -> bool {
        self == TrayStatus::Running
    }

    /// Title shown for the tray icon, e.g. "StudioPresence Running".
    pub fn title(self, name: &str) -> String {
        format!("{} {}", name, self)
    }

    /// Primary and secondary colors of the icon.
    #[cfg_attr(not(windows), allow(dead_code))]
    pub fn palette(self) -> (Rgba<u8>, Rgba<u8>) {
        match self {
            // #00C853 / #009624
            TrayStatus::Running => (Rgba([0x00, 0xC8, 0x53, 0xFF]), Rgba([0x00, 0x96, 0x24, 0xFF])),
            // #F44336 / #D32F2F
            TrayStatus::Stopped => (Rgba([0xF4, 0x43, 0x36, 0xFF]), Rgba([0xD3, 0x2F, 0x2F, 0xFF])),
        }
    }

    /// Square bitmap in the primary color with the top-right and bottom-left
    /// quadrants in the secondary color.
    #[cfg_attr(not(windows), allow(dead_code))]
    pub fn icon_image(self, size: u32) -> RgbaImage {
        let (primary, secondary) = self.palette();
        let half = size / 2;
        RgbaImage::from_fn(size, size, |x, y| {
            if (x >= half) != (y >= half) {
                secondary
            } else {
                primary
            }
        })
    }
}

impl fmt::Display for TrayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrayStatus::Running => write!(f, "Running"),
            TrayStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Receives status updates from the controller.
///
/// Implementations may be called from any thread and must keep only the most
/// recent status.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, status: TrayStatus);
}

/// Sink that reports transitions through the log, for shells without an icon.
#[cfg_attr(windows, allow(dead_code))]
pub struct LogIndicator {
    name: String,
    last: Mutex<Option<TrayStatus>>,
}

impl LogIndicator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last: Mutex::new(None),
        }
    }

    #[cfg_attr(windows, allow(dead_code))]
    pub fn current(&self) -> TrayStatus {
        let last = *self.last.lock();
        last.unwrap_or_default()
    }
}

impl StatusSink for LogIndicator {
    fn set_status(&self, status: TrayStatus) {
        let mut last = self.last.lock();
        if *last != Some(status) {
            info!(status = %status, "{}", status.title(&self.name));
        }
        *last = Some(status);
    }
}
