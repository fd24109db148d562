//! Ctrl+C handling while the master password prompt is on screen.
//!
//! The prompt blocks in a read that the standard library retries on EINTR,
//! so cancellation cannot be observed from the caller. Instead the handler
//! finishes the run itself: it puts the terminal back the way it was before
//! echo was disabled, prints the newline of the cancelled rendering and
//! exits successfully.

#[cfg(unix)]
mod imp {
    use std::fs::{File, OpenOptions};
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::OnceLock;

    use crate::output::{Status, INTERRUPTED};

    static TTY_FD: AtomicI32 = AtomicI32::new(-1);
    static SAVED_TERMIOS: OnceLock<libc::termios> = OnceLock::new();

    /// Keeps the SIGINT handler installed until dropped.
    pub struct InterruptGuard {
        previous: libc::sighandler_t,
        _tty: Option<File>,
    }

    impl InterruptGuard {
        pub fn arm() -> Self {
            let tty = OpenOptions::new()
                .read(true)
                .write(true)
                .open("/dev/tty")
                .ok();

            if let Some(tty) = &tty {
                let fd = tty.as_raw_fd();
                let mut termios = MaybeUninit::<libc::termios>::uninit();
                if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } == 0 {
                    let _ = SAVED_TERMIOS.set(unsafe { termios.assume_init() });
                    TTY_FD.store(fd, Ordering::SeqCst);
                }
            }

            let mut previous =
                unsafe { libc::signal(libc::SIGINT, on_interrupt as libc::sighandler_t) };
            if previous == libc::SIG_ERR {
                previous = libc::SIG_DFL;
            }

            Self {
                previous,
                _tty: tty,
            }
        }
    }

    impl Drop for InterruptGuard {
        fn drop(&mut self) {
            unsafe {
                libc::signal(libc::SIGINT, self.previous);
            }
            TTY_FD.store(-1, Ordering::SeqCst);
        }
    }

    extern "C" fn on_interrupt(_: libc::c_int) {
        let fd = TTY_FD.load(Ordering::SeqCst);
        if fd >= 0 {
            if let Some(termios) = SAVED_TERMIOS.get() {
                unsafe {
                    libc::tcsetattr(fd, libc::TCSANOW, termios);
                }
            }
        }
        unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                INTERRUPTED.as_ptr().cast(),
                INTERRUPTED.len(),
            );
            libc::_exit(Status::Success.code() as libc::c_int);
        }
    }
}

#[cfg(not(unix))]
mod imp {
    pub struct InterruptGuard;

    impl InterruptGuard {
        pub fn arm() -> Self {
            InterruptGuard
        }
    }
}

pub use imp::InterruptGuard;
