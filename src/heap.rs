//! Post-call heap trim hook

/// Hook run after `encode` and `uninit`; its outcome is ignored
pub type PostCallHook = Box<dyn FnMut() + Send>;

/// Return unused heap memory to the system where the allocator supports it
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub fn trim_heap() {
    // SAFETY: malloc_trim only inspects allocator state.
    unsafe {
        libc::malloc_trim(0);
    }
}

/// Return unused heap memory to the system where the allocator supports it
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
pub fn trim_heap() {}

/// Boxed [`trim_heap`] ready to install on a session
pub fn malloc_trim_hook() -> PostCallHook {
    Box::new(trim_heap)
}
