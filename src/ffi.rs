//! FFI bindings for Session Insights
//!
//! This module provides C-compatible functions for calling the aggregation from
//! the mobile host app. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `insights_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};

use crate::adapter::SessionAdapter;
use crate::config::InsightsConfig;
use crate::error::InsightsError;
use crate::pipeline::InsightsProcessor;
use crate::types::SessionRecord;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// NULL means "now"; anything else must be RFC 3339
unsafe fn read_now(now: *const c_char) -> Result<DateTime<Utc>, InsightsError> {
    if now.is_null() {
        return Ok(Utc::now());
    }
    let text = cstr_to_string(now)
        .ok_or_else(|| InsightsError::InvalidTimestamp("now is not valid UTF-8".to_string()))?;
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| InsightsError::InvalidTimestamp(format!("{}: {}", text, e)))
}

/// Shared body of the stateless entry points
unsafe fn run_stateless<T, F>(
    json: *const c_char,
    now: *const c_char,
    timezone: *const c_char,
    op: F,
) -> Result<T, InsightsError>
where
    F: FnOnce(&InsightsProcessor, &[SessionRecord], DateTime<Utc>) -> Result<T, InsightsError>,
{
    let json_str = cstr_to_string(json)
        .ok_or_else(|| InsightsError::ParseError("Invalid JSON string pointer".to_string()))?;
    let tz_str = cstr_to_string(timezone)
        .ok_or_else(|| InsightsError::InvalidTimezone("Invalid timezone string pointer".to_string()))?;
    let now = read_now(now)?;

    let processor = InsightsProcessor::new(InsightsConfig::with_timezone(tz_str))?;
    let parsed = SessionAdapter::parse_array(&json_str)?;
    op(&processor, &parsed.records, now)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute the full summary (history, streak, weekly activity) as JSON.
///
/// # Safety
/// - `json` and `timezone` must be valid null-terminated C strings.
/// - `now` must be a valid null-terminated RFC 3339 C string, or NULL for the current time.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_summarize(
    json: *const c_char,
    now: *const c_char,
    timezone: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = run_stateless(json, now, timezone, |processor, records, now| {
        Ok(serde_json::to_string(&processor.summarize(records, now))?)
    });

    match result {
        Ok(out) => string_to_cstr(&out),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Group sessions into history sections, returned as a JSON array.
///
/// # Safety
/// - Same pointer contract as `insights_summarize`.
#[no_mangle]
pub unsafe extern "C" fn insights_group_sessions(
    json: *const c_char,
    now: *const c_char,
    timezone: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = run_stateless(json, now, timezone, |processor, records, now| {
        Ok(serde_json::to_string(&processor.group(records, now))?)
    });

    match result {
        Ok(out) => string_to_cstr(&out),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute weekly activity, returned as `{"minutes": [..7], "bars": [..7]}`.
///
/// # Safety
/// - Same pointer contract as `insights_summarize`.
#[no_mangle]
pub unsafe extern "C" fn insights_weekly_activity(
    json: *const c_char,
    now: *const c_char,
    timezone: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = run_stateless(json, now, timezone, |processor, records, now| {
        Ok(serde_json::to_string(&processor.weekly(records, now))?)
    });

    match result {
        Ok(out) => string_to_cstr(&out),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute the current streak.
///
/// # Safety
/// - Same pointer contract as `insights_summarize`.
/// - Returns the streak (>= 0), or -1 on error; call `insights_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn insights_compute_streak(
    json: *const c_char,
    now: *const c_char,
    timezone: *const c_char,
) -> i64 {
    clear_last_error();

    let result = run_stateless(json, now, timezone, |processor, records, now| {
        Ok(processor.streak(records, now))
    });

    match result {
        Ok(streak) => i64::from(streak),
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Processor API
// ============================================================================

/// Opaque handle to an InsightsProcessor
pub struct InsightsProcessorHandle {
    processor: InsightsProcessor,
}

/// Create a processor from a JSON configuration.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL for defaults.
/// - Returns a pointer that must be freed with `insights_processor_free`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_new(
    config_json: *const c_char,
) -> *mut InsightsProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        Ok(InsightsConfig::default())
    } else {
        match cstr_to_string(config_json) {
            Some(s) => InsightsConfig::from_json(&s),
            None => Err(InsightsError::InvalidConfig(
                "Invalid config string pointer".to_string(),
            )),
        }
    };

    match config.and_then(InsightsProcessor::new) {
        Ok(processor) => Box::into_raw(Box::new(InsightsProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insights_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_free(processor: *mut InsightsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Compute the full summary with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insights_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - `now` must be a valid null-terminated RFC 3339 C string, or NULL for the current time.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_summarize(
    processor: *const InsightsProcessorHandle,
    json: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = read_now(now).and_then(|now| handle.processor.process_json(&json_str, now));

    match result {
        Ok(out) => string_to_cstr(&out),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Session Insights functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an `insights_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insights_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `insights_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn insights_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn insights_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
