//! OS-facing presentation surfaces the core drives but does not implement.

use tracing::info;

/// Connection badge and tooltip.
pub trait Indicator: Send + Sync {
    /// Badge text: empty when connected, `!` when disconnected, or the
    /// unread count.
    fn set_badge(&self, text: &str);

    /// Tooltip reflecting connection status.
    fn set_title(&self, title: &str);
}

/// Opens conversation pages in the user's browser.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Log-backed indicator.
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn set_badge(&self, text: &str) {
        info!(badge = %text, "badge");
    }

    fn set_title(&self, title: &str) {
        info!(title = %title, "status");
    }
}

/// Log-backed opener.
pub struct LogOpener;

impl UrlOpener for LogOpener {
    fn open(&self, url: &str) {
        info!(url = %url, "open");
    }
}
