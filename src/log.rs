use std::sync::atomic::{AtomicBool, Ordering};

/// 详细日志开关（仅影响 `debug`）。
static VERBOSE_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(enabled: bool) {
    VERBOSE_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE_LOGGING.load(Ordering::Relaxed)
}

#[cfg(target_arch = "wasm32")]
mod sink {
    pub fn info(message: &str) {
        web_sys::console::log_1(&message.into());
    }

    pub fn warn(message: &str) {
        web_sys::console::warn_1(&message.into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod sink {
    pub fn info(message: &str) {
        println!("{message}");
    }

    pub fn warn(message: &str) {
        eprintln!("{message}");
    }
}

pub fn info(message: &str) {
    sink::info(&format!("[runebound] {message}"));
}

pub fn warn(message: &str) {
    sink::warn(&format!("[runebound] warning: {message}"));
}

pub fn debug(message: &str) {
    if is_verbose() {
        sink::info(&format!("[runebound] {message}"));
    }
}
