use std::{cell::RefCell, ffi::OsStr};

/// Instructions executed by `run` before giving up, unless overridden.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

#[derive(Clone, Copy)]
struct Env {
    max_steps: u64,
    minimal: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        max_steps: var_parse("LMC_MAX_STEPS").unwrap_or(DEFAULT_MAX_STEPS),
        minimal: var_is("LMC_MINIMAL", "1"),
    };
    set_env(value);
}

/// Step budget from `LMC_MAX_STEPS`. `0` means unlimited.
pub fn max_steps() -> u64 {
    with_env(|env| env.max_steps)
}

pub fn is_minimal() -> bool {
    with_env(|env| env.minimal)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

fn var_parse(name: impl AsRef<OsStr>) -> Option<u64> {
    std::env::var(name.as_ref()).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_reads_variables() {
        // Each test runs on its own thread, so the thread-local starts empty
        std::env::set_var("LMC_MAX_STEPS", " 250 ");
        init();
        assert_eq!(max_steps(), 250);
        std::env::remove_var("LMC_MAX_STEPS");
    }

    #[test]
    #[should_panic(expected = "before initialization")]
    fn access_before_init() {
        max_steps();
    }
}
