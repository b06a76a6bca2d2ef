//! Owned native handles.
//!
//! [`Owned`] holds exactly one libserialport pointer together with the
//! backend that produced it. The pointer is `Some` until the resource is
//! released; release happens once, from either [`Owned::release`] or `Drop`.

use crate::error::{check, Result, SerialError};
use crate::ffi::{sp_event_set, sp_port, sp_port_config, NativeApi};
use std::ffi::c_int;
use std::fmt;
use std::ptr::{self, NonNull};
use tracing::trace;

/// A native structure that is freed with a dedicated call.
pub(crate) trait NativeResource {
    /// Human-readable kind, used in errors and logs.
    const KIND: &'static str;

    /// Free the structure.
    ///
    /// # Safety
    /// `ptr` must have been allocated by `native` and not yet freed.
    unsafe fn free<N: NativeApi + ?Sized>(native: &N, ptr: *mut Self);
}

impl NativeResource for sp_port {
    const KIND: &'static str = "serial port";

    unsafe fn free<N: NativeApi + ?Sized>(native: &N, ptr: *mut Self) {
        native.free_port(ptr)
    }
}

impl NativeResource for sp_port_config {
    const KIND: &'static str = "port config";

    unsafe fn free<N: NativeApi + ?Sized>(native: &N, ptr: *mut Self) {
        native.free_config(ptr)
    }
}

impl NativeResource for sp_event_set {
    const KIND: &'static str = "event set";

    unsafe fn free<N: NativeApi + ?Sized>(native: &N, ptr: *mut Self) {
        native.free_event_set(ptr)
    }
}

/// Exclusive owner of one native structure.
pub(crate) struct Owned<T: NativeResource, N: NativeApi> {
    ptr: Option<NonNull<T>>,
    native: N,
}

impl<T: NativeResource, N: NativeApi> Owned<T, N> {
    /// Run an allocating native call and take ownership of its output.
    ///
    /// The out-pointer is only trusted after the return code has been checked.
    pub(crate) fn acquire<F>(native: N, alloc: F) -> Result<Self>
    where
        F: FnOnce(&N, *mut *mut T) -> c_int,
    {
        let mut raw: *mut T = ptr::null_mut();
        let ret = alloc(&native, &mut raw);
        check(&native, ret)?;
        let ptr = NonNull::new(raw).ok_or_else(|| {
            SerialError::argument(format!("allocation of {} returned no handle", T::KIND))
        })?;
        trace!(kind = T::KIND, ptr = ?ptr, "acquired native handle");
        Ok(Self {
            ptr: Some(ptr),
            native,
        })
    }

    /// The live pointer, or `Disposed` once released.
    pub(crate) fn get(&self) -> Result<NonNull<T>> {
        self.ptr.ok_or(SerialError::Disposed(T::KIND))
    }

    pub(crate) fn native(&self) -> &N {
        &self.native
    }

    pub(crate) fn is_released(&self) -> bool {
        self.ptr.is_none()
    }

    /// Free the native structure. A no-op after the first call.
    pub(crate) fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` came from `native` and `take()` guarantees this
            // branch runs at most once per allocation.
            unsafe { T::free(&self.native, ptr.as_ptr()) };
            trace!(kind = T::KIND, ptr = ?ptr, "released native handle");
        }
    }
}

impl<T: NativeResource, N: NativeApi> Drop for Owned<T, N> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: NativeResource, N: NativeApi> fmt::Debug for Owned<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("kind", &T::KIND)
            .field("ptr", &self.ptr)
            .finish()
    }
}

// SAFETY: libserialport structures carry no thread affinity. Moving one to
// another thread is sound; sharing is not, so `Sync` stays unimplemented and
// release requires `&mut self`.
unsafe impl<T: NativeResource, N: NativeApi + Send> Send for Owned<T, N> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{Fault, MockNative, SP_ERR_MEM};

    fn new_config(native: &MockNative) -> Result<Owned<sp_port_config, MockNative>> {
        Owned::acquire(native.clone(), |n, out| unsafe { n.new_config(out) })
    }

    #[test]
    fn test_release_is_idempotent() {
        let native = MockNative::new();
        let mut owned = new_config(&native).unwrap();

        owned.release();
        owned.release();
        drop(owned);

        assert_eq!(native.call_count("sp_free_config"), 1);
        assert_eq!(native.invalid_frees(), 0);
    }

    #[test]
    fn test_drop_releases() {
        let native = MockNative::new();
        {
            let _owned = new_config(&native).unwrap();
            assert_eq!(native.live_configs(), 1);
        }
        assert_eq!(native.live_configs(), 0);
    }

    #[test]
    fn test_get_after_release_is_disposed() {
        let native = MockNative::new();
        let mut owned = new_config(&native).unwrap();
        owned.release();
        assert_eq!(owned.get(), Err(SerialError::Disposed("port config")));
        assert!(owned.is_released());
    }

    #[test]
    fn test_failed_allocation_builds_nothing() {
        let native = MockNative::new();
        native.fail_next("sp_new_config", Fault::Return(SP_ERR_MEM));

        let result = new_config(&native);
        assert!(matches!(result, Err(SerialError::ResourceExhausted)));
        assert_eq!(native.call_count("sp_free_config"), 0);
    }

    #[test]
    fn test_success_without_pointer_is_rejected() {
        let native = MockNative::new();
        let result: Result<Owned<sp_port_config, MockNative>> =
            Owned::acquire(native.clone(), |_, _| 0);
        assert!(matches!(result, Err(SerialError::Argument(_))));
    }
}
