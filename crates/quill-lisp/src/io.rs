//! Standard output/error channels of the language, with per-thread capture
//!
//! Language-level printing (`println`, `prn`, `eprintln`, ...) goes through
//! [`write_stdout`] / [`write_stderr`]. While [`capture_output`] runs on a
//! thread, those writes land in a fresh pair of in-memory sinks owned by
//! that call; other threads keep writing wherever they were writing before.
//! With no capture active, text goes to the process stdout/stderr.

use std::cell::RefCell;
use std::io::Write;

#[derive(Debug, Default)]
struct Sinks {
    out: String,
    err: String,
}

thread_local! {
    static ACTIVE: RefCell<Option<Sinks>> = const { RefCell::new(None) };
}

/// Result of running an action under [`capture_output`].
#[derive(Debug, Clone, PartialEq)]
pub struct Captured<T> {
    pub value: T,
    pub stdout: String,
    pub stderr: String,
}

/// Run `action` with this thread's channels redirected into fresh sinks.
///
/// The previous channels are restored when the call returns or unwinds.
/// Captures nest: an inner call collects only what is written inside it.
pub fn capture_output<T>(action: impl FnOnce() -> T) -> Captured<T> {
    let guard = CaptureGuard::install();
    let value = action();
    let sinks = guard.finish();
    Captured {
        value,
        stdout: sinks.out,
        stderr: sinks.err,
    }
}

/// Whether the current thread is inside [`capture_output`].
pub fn is_capturing() -> bool {
    ACTIVE.with(|slot| slot.borrow().is_some())
}

pub fn write_stdout(text: &str) {
    let captured = ACTIVE.with(|slot| match slot.borrow_mut().as_mut() {
        Some(sinks) => {
            sinks.out.push_str(text);
            true
        }
        None => false,
    });
    if !captured {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

pub fn write_stderr(text: &str) {
    let captured = ACTIVE.with(|slot| match slot.borrow_mut().as_mut() {
        Some(sinks) => {
            sinks.err.push_str(text);
            true
        }
        None => false,
    });
    if !captured {
        let _ = std::io::stderr().lock().write_all(text.as_bytes());
    }
}

/// Installs a sink pair for the current thread; restores the previous pair on drop.
struct CaptureGuard {
    previous: Option<Sinks>,
    restored: bool,
}

impl CaptureGuard {
    fn install() -> Self {
        let previous = ACTIVE.with(|slot| slot.borrow_mut().replace(Sinks::default()));
        Self {
            previous,
            restored: false,
        }
    }

    fn restore(&mut self) -> Sinks {
        self.restored = true;
        let previous = self.previous.take();
        ACTIVE
            .with(|slot| std::mem::replace(&mut *slot.borrow_mut(), previous))
            .unwrap_or_default()
    }

    fn finish(mut self) -> Sinks {
        self.restore()
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if !self.restored {
            self.restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn captures_both_channels() {
        let captured = capture_output(|| {
            write_stdout("out ");
            write_stderr("err");
            write_stdout("more");
            7
        });
        assert_eq!(captured.value, 7);
        assert_eq!(captured.stdout, "out more");
        assert_eq!(captured.stderr, "err");
        assert!(!is_capturing());
    }

    #[test]
    fn nested_capture_restores_outer_sinks() {
        let outer = capture_output(|| {
            write_stdout("a");
            let inner = capture_output(|| write_stdout("b"));
            write_stdout("c");
            inner.stdout
        });
        assert_eq!(outer.value, "b");
        assert_eq!(outer.stdout, "ac");
    }

    #[test]
    fn panic_inside_capture_restores_channels() {
        let result = std::panic::catch_unwind(|| {
            capture_output(|| {
                write_stdout("lost");
                panic!("boom");
            })
        });
        assert!(result.is_err());
        assert!(!is_capturing());
    }

    #[test]
    fn concurrent_captures_do_not_mix() {
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    capture_output(|| {
                        barrier.wait();
                        for _ in 0..100 {
                            write_stdout(&i.to_string());
                        }
                    })
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let captured = handle.join().unwrap();
            assert_eq!(captured.stdout, i.to_string().repeat(100));
            assert!(captured.stderr.is_empty());
        }
    }
}
