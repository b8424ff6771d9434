/// Debug sink for the matching engine: indented lines through the `log`
/// facade, depth threaded explicitly through recursive calls. All calls are
/// no-ops unless a logger is installed at debug level, so the engine itself
/// stays free of mutable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace {
    depth: usize,
}

impl Trace {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn nested(self) -> Self {
        Self {
            depth: self.depth + 1,
        }
    }

    pub fn enabled(&self) -> bool {
        log::log_enabled!(log::Level::Debug)
    }

    pub fn line(&self, message: impl AsRef<str>) {
        if self.enabled() {
            log::debug!("{:indent$}{}", "", message.as_ref(), indent = self.depth * 4);
        }
    }
}
