//! Built-in middleware.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::Instant;
use log::{error, log, Level};

use crate::server::context::Context;
use crate::server::response::StatusCode;

/// Log the status, URI and duration of every request passing through.
///
/// Error responses are logged at warn level, everything else at info.
pub fn logger() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |ctx: &mut Context| {
        let start = Instant::now();
        ctx.next();
        let status = ctx.status_code();
        let level = if status.is_error() { Level::Warn } else { Level::Info };
        log!(level, "[{}] {} in {:?}", status.as_u16(), ctx.request_uri(), start.elapsed());
    }
}

thread_local! {
    static RECOVERY_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Route panics raised under [`recovery`] to a quiet capture of the panic
/// site; every other panic still reaches the previous hook.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if RECOVERY_DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }
            let mut frames = Vec::new();
            if let Some(location) = info.location() {
                frames.push(format!("{}: {}", location.file(), location.line()));
            }
            frames.extend(backtrace_frames(&Backtrace::force_capture()));
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(frames));
        }));
    });
}

/// The `file:line` locations of a captured backtrace, innermost first.
fn backtrace_frames(backtrace: &Backtrace) -> Vec<String> {
    backtrace
        .to_string()
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("at "))
        .map(str::to_string)
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn trace(message: &str, frames: &[String]) -> String {
    let mut out = format!("{message}\nTraceback:");
    for frame in frames {
        out.push_str("\n\t");
        out.push_str(frame);
    }
    out
}

/// Turn a panic anywhere later in the chain into a 500 response.
///
/// The panic message and the locations it unwound through are logged at
/// error level. Whatever the failing handlers had written is discarded and
/// replaced by `{"message": "Internal Server Error"}`. Register it first so
/// it covers every other handler.
pub fn recovery() -> impl Fn(&mut Context) + Send + Sync + 'static {
    install_panic_hook();
    |ctx: &mut Context| {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        let result = panic::catch_unwind(AssertUnwindSafe(|| ctx.next()));
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() - 1));

        if let Err(payload) = result {
            let message = panic_message(payload.as_ref());
            let frames = LAST_PANIC.with(|slot| slot.borrow_mut().take()).unwrap_or_default();
            error!("{}\n\n", trace(&message, &frames));

            ctx.reset();
            ctx.fail(StatusCode::InternalServerError, "Internal Server Error");
        }
    }
}
