//! Test helpers: capture `log::warn!` output of the current thread and read
//! back Item fields.

use crate::stac::Item;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            CAPTURED.with(|c| c.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Run `f` and return its result with the warnings it logged
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Warn);
        }
    });

    CAPTURED.with(|c| c.borrow_mut().clear());
    let result = f();
    let warnings = CAPTURED.with(|c| c.borrow_mut().drain(..).collect());
    (result, warnings)
}

/// The bbox of an Item as `[xmin, ymin, xmax, ymax]`
pub fn item_bbox(item: &Item) -> [f64; 4] {
    serde_json::from_value(serde_json::to_value(&item.bbox).unwrap()).unwrap()
}
