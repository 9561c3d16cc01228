//! FFI bindings for TouchCare Core
//!
//! This module provides C-compatible functions for calling the core from the
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `touchcare_free_string`.
//!
//! Timestamps cross the boundary as epoch milliseconds. A `now_ms` of zero or
//! less means "the current time". Stateless calls take the device calendar's
//! `utc_offset_minutes` and label in Korean; use the processor API for other
//! locales.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDateTime;

use crate::aggregate::{compute_period_pattern, compute_time_distribution, compute_trend, delete_record};
use crate::calendar::{Calendar, Locale};
use crate::config::CareConfig;
use crate::error::CareError;
use crate::pipeline::{records_to_report, RecordProcessor};
use crate::schema::RecordAdapter;
use crate::types::{PeriodKind, TouchRecord};

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

/// Read a required string argument, recording an error naming it when absent
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Local wall time for `now_ms`, or the calendar's current time
fn resolve_now(calendar: &Calendar, now_ms: i64) -> Result<NaiveDateTime, CareError> {
    if now_ms <= 0 {
        Ok(calendar.now())
    } else {
        calendar.local_datetime(now_ms)
    }
}

/// Settings for a stateless call: Korean labels on a calendar `minutes` east of UTC
fn offset_config(utc_offset_minutes: i32) -> Result<CareConfig, CareError> {
    let config = CareConfig::default().with_utc_offset(utc_offset_minutes);
    config.validate()?;
    Ok(config)
}

/// Validate a record array under `calendar`
fn parse_records(json: &str, calendar: &Calendar) -> Result<Vec<TouchRecord>, CareError> {
    let raw = RecordAdapter::parse_array(json)?;
    RecordAdapter::to_records(&raw, calendar)
}

/// Hand a result to the caller as an allocated string, or record its error
fn finish(result: Result<String, CareError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn report_json(
    records_json: &str,
    period: &str,
    now_ms: i64,
    utc_offset_minutes: i32,
) -> Result<String, CareError> {
    let config = offset_config(utc_offset_minutes)?;
    let period: PeriodKind = period.parse()?;
    let now = resolve_now(&config.calendar()?, now_ms)?;
    records_to_report(records_json, period, now, &config)
}

fn distribution_json(records_json: &str, utc_offset_minutes: i32) -> Result<String, CareError> {
    let records = parse_records(records_json, &offset_config(utc_offset_minutes)?.calendar()?)?;
    Ok(serde_json::to_string(&compute_time_distribution(&records))?)
}

fn pattern_json(
    records_json: &str,
    period: &str,
    now_ms: i64,
    utc_offset_minutes: i32,
) -> Result<String, CareError> {
    let calendar = offset_config(utc_offset_minutes)?.calendar()?;
    let period: PeriodKind = period.parse()?;
    let now = resolve_now(&calendar, now_ms)?;
    let records = parse_records(records_json, &calendar)?;
    let pattern = compute_period_pattern(&records, period, now, Locale::default());
    Ok(serde_json::to_string(&pattern)?)
}

fn delete_json(records_json: &str, id: &str, utc_offset_minutes: i32) -> Result<String, CareError> {
    let records = parse_records(records_json, &offset_config(utc_offset_minutes)?.calendar()?)?;
    Ok(serde_json::to_string(&delete_record(&records, id))?)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Build a period report from a JSON record array.
///
/// # Safety
/// - `records_json` and `period` (`"week"` or `"month"`) must be valid null-terminated C strings.
/// - `utc_offset_minutes` is the device calendar (540 for KST), within ±1080.
/// - Returns a newly allocated string that must be freed with `touchcare_free_string`.
/// - Returns NULL on error; call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_report(
    records_json: *const c_char,
    period: *const c_char,
    now_ms: i64,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(records_json, "records JSON") else {
        return ptr::null_mut();
    };
    let Some(period_str) = required_arg(period, "period") else {
        return ptr::null_mut();
    };

    finish(report_json(&json_str, &period_str, now_ms, utc_offset_minutes))
}

/// Morning / afternoon / evening distribution of a JSON record array.
///
/// # Safety
/// - `records_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `touchcare_free_string`.
/// - Returns NULL on error; call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_time_distribution(
    records_json: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(records_json, "records JSON") else {
        return ptr::null_mut();
    };

    finish(distribution_json(&json_str, utc_offset_minutes))
}

/// Chart series for the period screen as a JSON array.
///
/// # Safety
/// - `records_json` and `period` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `touchcare_free_string`.
/// - Returns NULL on error; call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_period_pattern(
    records_json: *const c_char,
    period: *const c_char,
    now_ms: i64,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(records_json, "records JSON") else {
        return ptr::null_mut();
    };
    let Some(period_str) = required_arg(period, "period") else {
        return ptr::null_mut();
    };

    finish(pattern_json(&json_str, &period_str, now_ms, utc_offset_minutes))
}

/// Classify a current count against a previous one.
///
/// # Safety
/// - Returns a newly allocated string (`"increase"`, `"stable"` or `"observe"`)
///   that must be freed with `touchcare_free_string`.
#[no_mangle]
pub unsafe extern "C" fn touchcare_trend(current: u32, previous: u32) -> *mut c_char {
    clear_last_error();
    string_to_cstr(compute_trend(current as usize, previous as usize).as_str())
}

/// Remove the record with `id` from a JSON record array.
///
/// # Safety
/// - `records_json` and `id` must be valid null-terminated C strings.
/// - Returns the remaining records as a newly allocated JSON array that must
///   be freed with `touchcare_free_string`.
/// - Returns NULL on error; call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_delete_record(
    records_json: *const c_char,
    id: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(records_json, "records JSON") else {
        return ptr::null_mut();
    };
    let Some(id_str) = required_arg(id, "id") else {
        return ptr::null_mut();
    };

    finish(delete_json(&json_str, &id_str, utc_offset_minutes))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a RecordProcessor
pub struct RecordProcessorHandle {
    processor: RecordProcessor,
}

/// Create a new RecordProcessor.
///
/// # Safety
/// - `locale` must be NULL (Korean labels) or a valid null-terminated C string.
/// - Returns a pointer to a newly allocated RecordProcessor.
/// - Must be freed with `touchcare_processor_free`.
/// - Returns NULL on error; call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_processor_new(
    utc_offset_minutes: i32,
    locale: *const c_char,
) -> *mut RecordProcessorHandle {
    clear_last_error();

    let config = match cstr_to_string(locale).map(|s| s.parse::<Locale>()) {
        None => Ok(CareConfig::default().with_utc_offset(utc_offset_minutes)),
        Some(Ok(locale)) => Ok(CareConfig::default()
            .with_utc_offset(utc_offset_minutes)
            .with_locale(locale)),
        Some(Err(e)) => Err(e),
    };

    match config.and_then(|c| RecordProcessor::with_config(&c)) {
        Ok(processor) => Box::into_raw(Box::new(RecordProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a RecordProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `touchcare_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn touchcare_processor_free(processor: *mut RecordProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Replace the processor's working set with a JSON record array.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `touchcare_processor_new`.
/// - `records_json` must be a valid null-terminated C string.
/// - Returns the number of records loaded, or -1 on error.
/// - On error, call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_processor_load(
    processor: *mut RecordProcessorHandle,
    records_json: *const c_char,
) -> i64 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(json_str) = required_arg(records_json, "records JSON") else {
        return -1;
    };

    match handle.processor.load_json(&json_str) {
        Ok(count) => count as i64,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Delete a record from the processor's working set.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `touchcare_processor_new`.
/// - `id` must be a valid null-terminated C string.
/// - Returns 1 if a record was removed, 0 if none matched, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn touchcare_processor_delete(
    processor: *mut RecordProcessorHandle,
    id: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(id_str) = required_arg(id, "id") else {
        return -1;
    };

    i32::from(handle.processor.delete(&id_str))
}

/// Build a report from the processor's working set.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `touchcare_processor_new`.
/// - `period` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `touchcare_free_string`.
/// - Returns NULL on error; call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_processor_report(
    processor: *mut RecordProcessorHandle,
    period: *const c_char,
    now_ms: i64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let Some(period_str) = required_arg(period, "period") else {
        return ptr::null_mut();
    };

    finish(period_str.parse::<PeriodKind>().and_then(|period| {
        let now = resolve_now(handle.processor.calendar(), now_ms)?;
        handle.processor.report_json(period, now)
    }))
}

/// Serialize the processor's working set.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `touchcare_processor_new`.
/// - Returns a newly allocated string that must be freed with `touchcare_free_string`.
/// - Returns NULL on error; call `touchcare_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn touchcare_processor_save(
    processor: *mut RecordProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    finish(handle.processor.save_records())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by TouchCare functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a TouchCare function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn touchcare_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next TouchCare function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn touchcare_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the TouchCare Core library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn touchcare_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    // 2026-02-20 09:30:33, 14:00:22 and 20:00:08 in KST
    fn sample_records_json() -> CString {
        CString::new(
            r#"[
                {"id": "52", "timestamp": 1771547433000},
                {"id": "54", "timestamp": 1771563622000},
                {"id": "56", "timestamp": 1771585208000}
            ]"#,
        )
        .unwrap()
    }

    // 2026-02-20 23:00:00 in KST
    const NOW_MS: i64 = 1771596000000;

    const KST: i32 = 540;

    unsafe fn take_json(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        touchcare_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_report() {
        let json = sample_records_json();
        let period = CString::new("week").unwrap();

        unsafe {
            let value = take_json(touchcare_report(json.as_ptr(), period.as_ptr(), NOW_MS, KST));
            assert_eq!(value["total_records"], 3);
            assert_eq!(value["period"], "week");
            assert_eq!(value["pattern"][6]["count"], 3);
            assert_eq!(value["pattern"][6]["label"], "금");
        }
    }

    #[test]
    fn test_ffi_distribution_and_pattern() {
        let json = sample_records_json();
        let period = CString::new("month").unwrap();

        unsafe {
            let distribution = take_json(touchcare_time_distribution(json.as_ptr(), KST));
            assert_eq!(distribution["counts"]["morning"], 1);
            assert_eq!(distribution["counts"]["afternoon"], 1);
            assert_eq!(distribution["counts"]["evening"], 1);

            let pattern = take_json(touchcare_period_pattern(json.as_ptr(), period.as_ptr(), NOW_MS, KST));
            let entries = pattern.as_array().unwrap();
            assert_eq!(entries.len(), 4);
            assert_eq!(entries[3]["label"], "02/14");
            assert_eq!(entries[3]["count"], 3);
        }
    }

    #[test]
    fn test_ffi_stateless_calls_use_given_offset() {
        let json = sample_records_json();

        unsafe {
            // 09:30, 14:00 and 20:00 KST are 00:30, 05:00 and 11:00 UTC
            let distribution = take_json(touchcare_time_distribution(json.as_ptr(), 0));
            assert_eq!(distribution["counts"]["morning"], 1);
            assert_eq!(distribution["counts"]["afternoon"], 0);
            assert_eq!(distribution["unbucketed"], 2);

            let period = CString::new("week").unwrap();
            // 2026-02-20 14:00:00 UTC
            let report = take_json(touchcare_report(json.as_ptr(), period.as_ptr(), NOW_MS, 0));
            assert_eq!(report["now"], "2026-02-20T14:00:00");

            assert!(touchcare_time_distribution(json.as_ptr(), 24 * 60).is_null());
            assert!(!touchcare_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_trend() {
        unsafe {
            let result = touchcare_trend(13, 10);
            assert_eq!(CStr::from_ptr(result).to_str().unwrap(), "increase");
            touchcare_free_string(result);

            let result = touchcare_trend(7, 10);
            assert_eq!(CStr::from_ptr(result).to_str().unwrap(), "observe");
            touchcare_free_string(result);
        }
    }

    #[test]
    fn test_ffi_delete_record() {
        let json = sample_records_json();
        let id = CString::new("54").unwrap();

        unsafe {
            let remaining = take_json(touchcare_delete_record(json.as_ptr(), id.as_ptr(), KST));
            let ids: Vec<&str> = remaining
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["id"].as_str().unwrap())
                .collect();
            assert_eq!(ids, vec!["52", "56"]);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = touchcare_processor_new(540, ptr::null());
            assert!(!processor.is_null());

            let json = sample_records_json();
            assert_eq!(touchcare_processor_load(processor, json.as_ptr()), 3);

            let id = CString::new("52").unwrap();
            assert_eq!(touchcare_processor_delete(processor, id.as_ptr()), 1);
            assert_eq!(touchcare_processor_delete(processor, id.as_ptr()), 0);

            let period = CString::new("week").unwrap();
            let report = take_json(touchcare_processor_report(processor, period.as_ptr(), NOW_MS));
            assert_eq!(report["total_records"], 2);
            assert_eq!(report["distribution"]["counts"]["morning"], 0);

            // Reload the saved set into a second processor
            let saved = touchcare_processor_save(processor);
            assert!(!saved.is_null());
            let processor2 = touchcare_processor_new(540, ptr::null());
            assert_eq!(touchcare_processor_load(processor2, saved), 2);

            touchcare_free_string(saved);
            touchcare_processor_free(processor);
            touchcare_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_processor_rejects_bad_config() {
        let locale = CString::new("fr").unwrap();

        unsafe {
            assert!(touchcare_processor_new(540, locale.as_ptr()).is_null());
            assert!(!touchcare_last_error().is_null());

            assert!(touchcare_processor_new(24 * 60, ptr::null()).is_null());
            assert!(!touchcare_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid_json = CString::new("not json").unwrap();
        let period = CString::new("week").unwrap();

        unsafe {
            let result = touchcare_report(invalid_json.as_ptr(), period.as_ptr(), NOW_MS, KST);
            assert!(result.is_null());

            let error = touchcare_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let json = sample_records_json();
            let bad_period = CString::new("year").unwrap();
            assert!(touchcare_report(json.as_ptr(), bad_period.as_ptr(), NOW_MS, KST).is_null());

            assert!(touchcare_report(ptr::null(), period.as_ptr(), NOW_MS, KST).is_null());
            assert!(touchcare_processor_report(ptr::null_mut(), period.as_ptr(), NOW_MS).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = touchcare_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
