//! Common test utilities for integration tests.
//!
//! Provides a private network namespace runner and helper macros for
//! conditional test execution.

use std::ffi::CStr;
use std::io;
use std::process::Command;

use gwmon::util::InterfaceResolver;

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

/// Run `ip` with the given arguments in the calling thread's namespace.
pub fn ip(args: &[&str]) -> io::Result<()> {
    let status = Command::new("ip").args(args).status()?;
    if !status.success() {
        return Err(io::Error::other(format!("ip {} failed: {}", args.join(" "), status)));
    }
    Ok(())
}

/// Run `f` on a fresh thread moved into a new, empty network namespace.
///
/// Sockets and child processes created by `f` live in that namespace; it
/// disappears when the thread exits.
pub fn in_new_netns<T, F>(f: F) -> io::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    std::thread::spawn(move || {
        if unsafe { libc::unshare(libc::CLONE_NEWNET) } != 0 {
            return Err(io::Error::last_os_error());
        }
        f()
    })
    .join()
    .map_err(|_| io::Error::other("namespace thread panicked"))?
}

/// Resolver asking the kernel of the calling thread's namespace.
///
/// `/sys/class/net` shows the namespace sysfs was mounted in, not the
/// thread's, so namespaced tests resolve through `if_indextoname`.
pub struct KernelResolver;

impl InterfaceResolver for KernelResolver {
    fn index_to_name(&self, index: u32) -> Option<String> {
        let mut buf = [0 as libc::c_char; libc::IF_NAMESIZE];
        let ptr = unsafe { libc::if_indextoname(index, buf.as_mut_ptr()) };
        if ptr.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
        Some(name.to_string_lossy().into_owned())
    }
}
