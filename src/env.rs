//! Configuration read from environment variables, once, at startup.
//!
//! - `LS8_TRACE` turns on per-instruction tracing, as `--trace` does.
//! - `LS8_MINIMAL` silences status messages, as `--minimal` does.
//!
//! Either is enabled by `1` or `true`.

use std::{cell::RefCell, ffi::OsStr};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Env {
    trace: bool,
    minimal: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    set_env(Env {
        trace: flag_is_set("LS8_TRACE"),
        minimal: flag_is_set("LS8_MINIMAL"),
    });
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace)
}

pub fn is_minimal() -> bool {
    with_env(|env| env.minimal)
}

fn set_env(value: Env) {
    ENV.with_borrow_mut(|env| {
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: FnOnce(Env) -> R,
{
    let env = ENV.with_borrow(|env| *env);
    match env {
        Some(env) => callback(env),
        None => panic!("tried to access environment state before initialization"),
    }
}

fn flag_is_set(name: impl AsRef<OsStr>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
