//! QuickJS-backed syntax validation.

use std::ffi::CStr;
use std::time::Duration;

use rquickjs::{qjs, Ctx, Value};

use super::runtime::{create_context, create_runtime};
use super::{SyntaxOracle, SyntaxVerdict};
use crate::config::{MAX_JS_CHECK_TIME_MS, MAX_JS_MEMORY_LIMIT};
use crate::utils::latin1_decode;

/// File name QuickJS reports in parse errors.
const SCRIPT_FILE_NAME: &CStr = c"archived_script";
const SYNTAX_ERROR_NAME: &str = "SyntaxError";

/// Syntax oracle backed by QuickJS.
///
/// The body is parsed as a classic (non-module, sloppy) script in
/// compile-only mode: QuickJS produces bytecode and stops, so nothing in the
/// checked script runs.
#[derive(Debug, Clone)]
pub struct QuickJsValidator {
    memory_limit: usize,
    time_budget: Duration,
}

impl Default for QuickJsValidator {
    fn default() -> Self {
        Self {
            memory_limit: MAX_JS_MEMORY_LIMIT,
            time_budget: Duration::from_millis(MAX_JS_CHECK_TIME_MS),
        }
    }
}

impl QuickJsValidator {
    pub fn new(memory_limit: usize, time_budget: Duration) -> Self {
        Self {
            memory_limit,
            time_budget,
        }
    }
}

/// Scripts are usually UTF-8; anything else is read byte-per-character.
fn decode_source(body: &[u8]) -> String {
    String::from_utf8(body.to_vec()).unwrap_or_else(|_| latin1_decode(body))
}

/// Parses `source` as global script code and returns the compiled bytecode
/// without evaluating it.
fn compile_script<'js>(ctx: &Ctx<'js>, source: String) -> rquickjs::Result<Value<'js>> {
    let mut input = source.into_bytes();
    let len = input.len();
    // JS_Eval reads `len` bytes but requires a terminating NUL
    input.push(0);
    let flags = (qjs::JS_EVAL_TYPE_GLOBAL | qjs::JS_EVAL_FLAG_COMPILE_ONLY) as i32;

    // SAFETY: `input` is NUL-terminated and outlives the call. On success the
    // returned value is owned by us and handed to `Value`, which frees it on
    // drop; an exception value holds no reference.
    unsafe {
        let raw = qjs::JS_Eval(
            ctx.as_raw().as_ptr(),
            input.as_ptr().cast(),
            len as _,
            SCRIPT_FILE_NAME.as_ptr(),
            flags,
        );
        if qjs::JS_IsException(raw) {
            return Err(rquickjs::Error::Exception);
        }
        Ok(Value::from_raw(ctx.clone(), raw))
    }
}

/// Converts a pending exception into a verdict.
fn verdict_from_exception(ctx: &Ctx<'_>) -> SyntaxVerdict {
    let caught: Value = ctx.catch();
    let name = caught
        .as_object()
        .and_then(|obj| obj.get::<_, String>("name").ok())
        .unwrap_or_default();
    let message = caught
        .as_exception()
        .and_then(|ex| ex.message())
        .unwrap_or_else(|| "unknown error".to_string());

    if name == SYNTAX_ERROR_NAME {
        SyntaxVerdict::Invalid(message)
    } else {
        SyntaxVerdict::Undetermined(format!("{name}: {message}"))
    }
}

impl SyntaxOracle for QuickJsValidator {
    fn check(&self, body: &[u8]) -> SyntaxVerdict {
        let runtime = match create_runtime(self.memory_limit, self.time_budget) {
            Ok(runtime) => runtime,
            Err(e) => return SyntaxVerdict::Undetermined(e.to_string()),
        };
        let context = match create_context(&runtime) {
            Ok(context) => context,
            Err(e) => return SyntaxVerdict::Undetermined(e.to_string()),
        };
        let source = decode_source(body);

        context.with(|ctx| {
            match compile_script(&ctx, source) {
                Ok(_bytecode) => SyntaxVerdict::Valid,
                Err(rquickjs::Error::Exception) => verdict_from_exception(&ctx),
                Err(e) => SyntaxVerdict::Undetermined(e.to_string()),
            }
        })
    }
}
