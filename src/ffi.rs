//! FFI bindings for Blinksense
//!
//! This module provides C-compatible functions for calling Blinksense from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `blinksense_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::report::ReportEncoder;
use crate::session::{process_frames, BlinkSession};
use crate::types::{FrameSample, TimestampMs};

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

/// Parse a config JSON pointer; NULL means defaults
unsafe fn parse_config(config_json: *const c_char) -> Result<EngineConfig, String> {
    match cstr_to_string(config_json) {
        Some(json) => EngineConfig::from_json(&json).map_err(|e| e.to_string()),
        None => Ok(EngineConfig::default()),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Process a JSON array of frame samples and return a JSON array of frame
/// updates, using a fresh session.
///
/// # Safety
/// - `frames_json` must be a valid null-terminated C string.
/// - `config_json` may be NULL to use default configuration.
/// - Returns a newly allocated string that must be freed with
///   `blinksense_free_string`.
/// - Returns NULL on error; call `blinksense_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn blinksense_process_frames(
    frames_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let frames_str = match cstr_to_string(frames_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frames string pointer");
            return ptr::null_mut();
        }
    };

    let config = match parse_config(config_json) {
        Ok(c) => c,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    let frames: Vec<FrameSample> = match serde_json::from_str(&frames_str) {
        Ok(f) => f,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match process_frames(config, &frames) {
        Ok(updates) => match serde_json::to_string(&updates) {
            Ok(json) => string_to_cstr(&json),
            Err(e) => {
                set_last_error(&e.to_string());
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Session API
// ============================================================================

/// Opaque handle to a BlinkSession
pub struct BlinkSessionHandle {
    session: BlinkSession,
}

/// Create a new session.
///
/// # Safety
/// - `config_json` may be NULL to use default configuration.
/// - Returns a pointer that must be freed with `blinksense_session_free`.
/// - Returns NULL on error; call `blinksense_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_new(
    config_json: *const c_char,
) -> *mut BlinkSessionHandle {
    clear_last_error();

    let config = match parse_config(config_json) {
        Ok(c) => c,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    match BlinkSession::new(config) {
        Ok(session) => Box::into_raw(Box::new(BlinkSessionHandle { session })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a session.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `blinksense_session_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_free(handle: *mut BlinkSessionHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Process one frame sample JSON and return the frame update JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `blinksense_session_new`.
/// - `frame_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `blinksense_free_string`.
/// - Returns NULL on error; call `blinksense_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_process_frame(
    handle: *mut BlinkSessionHandle,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let frame_str = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    let frame: FrameSample = match serde_json::from_str(&frame_str) {
        Ok(f) => f,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let update = (*handle).session.process_frame(&frame);
    match serde_json::to_string(&update) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Pause detection. Frames are still acknowledged but mutate nothing.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `blinksense_session_new`.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_pause(handle: *mut BlinkSessionHandle) {
    if !handle.is_null() {
        (*handle).session.pause();
    }
}

/// Resume detection.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `blinksense_session_new`.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_resume(handle: *mut BlinkSessionHandle) {
    if !handle.is_null() {
        (*handle).session.resume();
    }
}

/// Dismiss the asserted low-rate alert.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `blinksense_session_new`.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_acknowledge_alert(handle: *mut BlinkSessionHandle) {
    if !handle.is_null() {
        (*handle).session.acknowledge_alert();
    }
}

/// Reconfigure the EAR threshold. Returns 0 on success, -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `blinksense_session_new`.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_set_ear_threshold(
    handle: *mut BlinkSessionHandle,
    threshold: f64,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }

    match (*handle).session.set_ear_threshold(threshold) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Encode the session report as of `now_ms` on the session's frame clock.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `blinksense_session_new`.
/// - Returns a newly allocated string that must be freed with
///   `blinksense_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn blinksense_session_report(
    handle: *mut BlinkSessionHandle,
    now_ms: u64,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let encoder = ReportEncoder::new();
    match encoder.encode_to_json(&(*handle).session, now_ms as TimestampMs) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Blinksense functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Blinksense function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn blinksense_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Blinksense call on this
///   thread. Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn blinksense_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Blinksense library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn blinksense_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames_json() -> CString {
        CString::new(
            r#"[
                {"timestamp_ms": 0, "landmarks": null},
                {"timestamp_ms": 33, "landmarks": null},
                {"timestamp_ms": 66, "landmarks": null}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_process_frames() {
        let frames = frames_json();

        unsafe {
            let result = blinksense_process_frames(frames.as_ptr(), ptr::null());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let updates: Vec<crate::types::FrameUpdate> =
                serde_json::from_str(result_str).unwrap();
            assert_eq!(updates.len(), 3);
            assert!(updates.iter().all(|u| !u.face_detected));

            blinksense_free_string(result);
        }
    }

    #[test]
    fn test_ffi_session_lifecycle() {
        unsafe {
            let session = blinksense_session_new(ptr::null());
            assert!(!session.is_null());

            let frame = CString::new(r#"{"timestamp_ms": 0, "landmarks": null}"#).unwrap();
            let update = blinksense_session_process_frame(session, frame.as_ptr());
            assert!(!update.is_null());
            blinksense_free_string(update);

            blinksense_session_pause(session);
            let update = blinksense_session_process_frame(session, frame.as_ptr());
            let update_str = CStr::from_ptr(update).to_str().unwrap();
            assert!(update_str.contains("\"paused\":true"));
            blinksense_free_string(update);
            blinksense_session_resume(session);

            assert_eq!(blinksense_session_set_ear_threshold(session, 0.3), 0);
            assert_eq!(blinksense_session_set_ear_threshold(session, 2.0), -1);

            let report = blinksense_session_report(session, 60_000);
            assert!(!report.is_null());
            let report_str = CStr::from_ptr(report).to_str().unwrap();
            assert!(report_str.contains("report_version"));
            blinksense_free_string(report);

            blinksense_session_free(session);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = blinksense_process_frames(invalid.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = blinksense_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_rejects_invalid_config() {
        unsafe {
            let config = CString::new(r#"{"ear_threshold": 2.0}"#).unwrap();
            let session = blinksense_session_new(config.as_ptr());
            assert!(session.is_null());
            assert!(!blinksense_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = blinksense_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
