//! # FAHBench C Interface
//!
//! A flat, callback-based surface over [`SimulationSet`] for embedding the
//! benchmark in front ends written in other languages.
//!
//! A handle is created with [`fahbench_create`], driven with
//! [`fahbench_prepare`] and [`fahbench_run`], and released with
//! [`fahbench_destroy`]. Every function accepts a null handle.
//!
//! Nothing here installs a global logger. Status text reaches the caller
//! through the message callback; fatal errors are reported as
//! [`FAHBENCH_ERROR`] and described by [`fahbench_last_error`].

use fahbench_core::workflows::{SimulationError, SimulationSet, Updater};
use std::ffi::{CString, c_char, c_int, c_void};
use std::ptr;
use std::time::Duration;
use tracing::error;

pub const FAHBENCH_QUEUED: c_int = 0;
pub const FAHBENCH_CANCELLED: c_int = 1;
pub const FAHBENCH_FAILED: c_int = 2;
pub const FAHBENCH_FINISHED: c_int = 3;
pub const FAHBENCH_ERROR: c_int = -1;

/// `(user_data, elapsed_ms, total_ms, ns_per_day)`
pub type ProgressCallback = Option<extern "C" fn(*mut c_void, c_int, c_int, f32)>;
/// `(user_data, text)`; `text` is only valid for the duration of the call.
pub type MessageCallback = Option<extern "C" fn(*mut c_void, *const c_char)>;
/// `(user_data) -> cancelled`; must not block.
pub type CancelledCallback = Option<extern "C" fn(*mut c_void) -> bool>;

/// Opaque handle owning one simulation per usable device.
pub struct FahBenchHandle {
    set: SimulationSet,
    summary: CString,
    last_error: Option<CString>,
}

impl FahBenchHandle {
    fn new(set: SimulationSet) -> Self {
        Self {
            set,
            summary: CString::default(),
            last_error: None,
        }
    }

    fn record_error(&mut self, err: &SimulationError) {
        error!(error = %err, "Benchmark failed.");
        self.last_error = Some(to_c_string(&err.to_string()));
    }
}

fn to_c_string(text: &str) -> CString {
    CString::new(text.replace('\0', " ")).unwrap_or_default()
}

fn clamp_ms(ms: u64) -> c_int {
    c_int::try_from(ms).unwrap_or(c_int::MAX)
}

fn updater<'a>(
    progress: ProgressCallback,
    message: MessageCallback,
    cancelled: CancelledCallback,
    user_data: *mut c_void,
) -> Updater<'a> {
    let mut updater = Updater::new();
    if let Some(cb) = progress {
        updater = updater.on_progress(move |elapsed, total, score| {
            cb(user_data, clamp_ms(elapsed), clamp_ms(total), score as f32)
        });
    }
    if let Some(cb) = message {
        updater = updater.on_message(move |text| {
            let text = to_c_string(text);
            cb(user_data, text.as_ptr());
        });
    }
    if let Some(cb) = cancelled {
        updater = updater.on_cancelled(move || cb(user_data));
    }
    updater
}

/// Builds one simulation per device of every non-reference platform,
/// skipping Intel devices, each running the default work unit for
/// `duration_ms` milliseconds.
///
/// Returns null on failure. Directories are resolved from
/// `FAHBENCH_PLUGIN_DIR` and `FAHBENCH_WORKUNIT_DIR`, falling back to
/// locations relative to the executable.
#[unsafe(no_mangle)]
pub extern "C" fn fahbench_create(duration_ms: u64) -> *mut FahBenchHandle {
    match SimulationSet::for_devices(Duration::from_millis(duration_ms)) {
        Ok(set) => Box::into_raw(Box::new(FahBenchHandle::new(set))),
        Err(err) => {
            error!(error = %err, "Failed to create simulation set.");
            ptr::null_mut()
        }
    }
}

/// Releases a handle and any context it still holds.
///
/// # Safety
///
/// `handle` must be null or a pointer returned by [`fahbench_create`] that
/// has not been destroyed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fahbench_destroy(handle: *mut FahBenchHandle) {
    if handle.is_null() {
        return;
    }
    // Safety: ownership was handed out by fahbench_create.
    drop(unsafe { Box::from_raw(handle) });
}

/// Prepares every simulation in sequence. Returns [`FAHBENCH_CANCELLED`] if
/// cancelled, [`FAHBENCH_FAILED`] if any simulation failed to prepare,
/// [`FAHBENCH_QUEUED`] otherwise, or [`FAHBENCH_ERROR`] on a fatal error.
///
/// # Safety
///
/// `handle` must be null or a live handle. Callbacks are invoked on the
/// calling thread with `user_data`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fahbench_prepare(
    handle: *mut FahBenchHandle,
    progress: ProgressCallback,
    message: MessageCallback,
    cancelled: CancelledCallback,
    user_data: *mut c_void,
) -> c_int {
    // Safety: guaranteed by the caller.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return FAHBENCH_ERROR;
    };
    let updater = updater(progress, message, cancelled, user_data);
    match handle.set.prepare_all(&updater) {
        Ok(result) => {
            handle.last_error = None;
            result.status().code()
        }
        Err(err) => {
            handle.record_error(&err);
            FAHBENCH_ERROR
        }
    }
}

/// Runs every simulation in sequence and returns the best scaled score, or
/// a negative value on a fatal error.
///
/// # Safety
///
/// Same as [`fahbench_prepare`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fahbench_run(
    handle: *mut FahBenchHandle,
    progress: ProgressCallback,
    message: MessageCallback,
    cancelled: CancelledCallback,
    user_data: *mut c_void,
) -> f32 {
    // Safety: guaranteed by the caller.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return FAHBENCH_ERROR as f32;
    };
    let updater = updater(progress, message, cancelled, user_data);
    match handle.set.run_all(&updater) {
        Ok(score) => {
            handle.last_error = None;
            score as f32
        }
        Err(err) => {
            handle.record_error(&err);
            FAHBENCH_ERROR as f32
        }
    }
}

/// Concatenated summaries of every simulation. The string is owned by the
/// handle and stays valid until the next call on the same handle or its
/// destruction.
///
/// # Safety
///
/// `handle` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fahbench_summary(handle: *mut FahBenchHandle) -> *const c_char {
    // Safety: guaranteed by the caller.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return ptr::null();
    };
    handle.summary = to_c_string(&handle.set.summary());
    handle.summary.as_ptr()
}

/// Message of the last fatal error on this handle, or null if the last
/// prepare or run succeeded.
///
/// # Safety
///
/// `handle` must be null or a live handle. The string is invalidated by the
/// next prepare or run on the handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fahbench_last_error(handle: *const FahBenchHandle) -> *const c_char {
    // Safety: guaranteed by the caller.
    match unsafe { handle.as_ref() }.and_then(|h| h.last_error.as_ref()) {
        Some(message) => message.as_ptr(),
        None => ptr::null(),
    }
}
