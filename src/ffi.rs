//! C FFI: bridges [`OtosakuTts`] to iOS / Android callers.
//!
//! Functions are `#[no_mangle] extern "C"` so Swift / Kotlin can call them
//! through a thin bridging header without any Objective-C wrapper.
//!
//! ## Memory contract
//!
//! | Function                         | Caller frees with          |
//! |----------------------------------|----------------------------|
//! | [`otosaku_model_load`]           | [`otosaku_model_free`]     |
//! | [`otosaku_tokenize_json`]        | [`otosaku_free_string`]    |
//! | [`otosaku_synthesize_to_file`]   | [`otosaku_free_error`]     |

use std::ffi::{c_char, CStr, CString};
use std::path::Path;

use tracing::error;

use crate::model::OtosakuTts;

/// Opaque handle to a loaded engine.
pub struct OtosakuHandle {
    tts: OtosakuTts,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Convert a `*const c_char` to an owned `String`; `None` for null.
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Heap-allocate an owned C string.  Returns null on interior nul bytes.
fn to_c_str(s: &str) -> *const c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => std::ptr::null(),
    }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Load an engine from a model directory.
///
/// @param model_dir  UTF-8 path to the directory holding `FastPitch.onnx`,
///                   `HiFiGan.onnx`, `tokens.txt` and `cmudict.json`.
/// @return           Opaque handle, or `NULL` on failure (details are logged).
///                   Free with [`otosaku_model_free`].
#[no_mangle]
pub unsafe extern "C" fn otosaku_model_load(model_dir: *const c_char) -> *mut OtosakuHandle {
    let Some(dir) = (unsafe { cstr_to_string(model_dir) }) else {
        error!("otosaku_model_load: null argument");
        return std::ptr::null_mut();
    };

    match OtosakuTts::load(Path::new(&dir)) {
        Ok(tts) => Box::into_raw(Box::new(OtosakuHandle { tts })),
        Err(e) => {
            error!("load error: {:#}", anyhow::Error::from(e));
            std::ptr::null_mut()
        }
    }
}

/// Return the token ids for `text` as a JSON array, e.g. `[12,40,3]`.
///
/// @return  Heap-allocated UTF-8 string, or `NULL` on a null argument.
///          Free with [`otosaku_free_string`].
#[no_mangle]
pub unsafe extern "C" fn otosaku_tokenize_json(
    model: *const OtosakuHandle,
    text: *const c_char,
) -> *const c_char {
    if model.is_null() {
        return std::ptr::null();
    }
    let Some(txt) = (unsafe { cstr_to_string(text) }) else {
        return std::ptr::null();
    };
    let h = unsafe { &*model };
    let ids: Vec<String> = h.tts.encode(&txt).iter().map(u32::to_string).collect();
    to_c_str(&format!("[{}]", ids.join(",")))
}

/// Synthesise `text` and write a 16-bit PCM WAV to `output_path`.
///
/// @return  `NULL` on success; on failure a heap-allocated UTF-8 error message
///          that the caller must release with [`otosaku_free_error`].
#[no_mangle]
pub unsafe extern "C" fn otosaku_synthesize_to_file(
    model: *const OtosakuHandle,
    text: *const c_char,
    output_path: *const c_char,
) -> *const c_char {
    if model.is_null() {
        return to_c_str("null model handle");
    }
    let (Some(txt), Some(out)) = (
        unsafe { cstr_to_string(text) },
        unsafe { cstr_to_string(output_path) },
    ) else {
        return to_c_str("null argument (text or output_path)");
    };

    let h = unsafe { &*model };
    match h.tts.generate_to_file(&txt, Path::new(&out)) {
        Ok(()) => std::ptr::null(),
        Err(e) => to_c_str(&format!("{:#}", anyhow::Error::from(e))),
    }
}

/// Free a string returned by [`otosaku_tokenize_json`].
#[no_mangle]
pub unsafe extern "C" fn otosaku_free_string(s: *const c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s as *mut c_char) });
    }
}

/// Free an error string returned by [`otosaku_synthesize_to_file`].
#[no_mangle]
pub unsafe extern "C" fn otosaku_free_error(s: *const c_char) {
    unsafe { otosaku_free_string(s) };
}

/// Destroy a handle and release both models.
#[no_mangle]
pub unsafe extern "C" fn otosaku_model_free(model: *mut OtosakuHandle) {
    if !model.is_null() {
        drop(unsafe { Box::from_raw(model) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_arguments() {
        unsafe {
            assert!(otosaku_model_load(std::ptr::null()).is_null());
            assert!(otosaku_tokenize_json(std::ptr::null(), std::ptr::null()).is_null());

            let err = otosaku_synthesize_to_file(std::ptr::null(), std::ptr::null(), std::ptr::null());
            assert!(!err.is_null());
            assert_eq!(CStr::from_ptr(err).to_str().unwrap(), "null model handle");
            otosaku_free_error(err);

            otosaku_model_free(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_load_missing_dir_returns_null() {
        let dir = CString::new("/nonexistent/otosaku-models").unwrap();
        assert!(unsafe { otosaku_model_load(dir.as_ptr()) }.is_null());
    }
}
