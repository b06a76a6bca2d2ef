//! Library version queries.
//!
//! The package version follows semantic versioning; the library version is
//! the libtool `current:revision:age` triple that tracks ABI changes.

use crate::ffi::NativeApi;
use crate::port::copy_string;
use serde::Serialize;
use std::fmt;

/// Release version of the libserialport package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageVersion {
    pub major: i32,
    pub minor: i32,
    pub micro: i32,
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

/// ABI version of the shared library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LibVersion {
    pub current: i32,
    pub revision: i32,
    pub age: i32,
}

impl fmt::Display for LibVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.current, self.revision, self.age)
    }
}

pub fn package_version<N: NativeApi + ?Sized>(native: &N) -> PackageVersion {
    unsafe {
        PackageVersion {
            major: native.get_major_package_version(),
            minor: native.get_minor_package_version(),
            micro: native.get_micro_package_version(),
        }
    }
}

/// The package version as reported by the library itself.
pub fn package_version_string<N: NativeApi + ?Sized>(native: &N) -> String {
    // SAFETY: version strings are static in the library.
    unsafe { copy_string(native.get_package_version_string()) }.unwrap_or_default()
}

pub fn lib_version<N: NativeApi + ?Sized>(native: &N) -> LibVersion {
    unsafe {
        LibVersion {
            current: native.get_current_lib_version(),
            revision: native.get_revision_lib_version(),
            age: native.get_age_lib_version(),
        }
    }
}

/// The library version as reported by the library itself.
pub fn lib_version_string<N: NativeApi + ?Sized>(native: &N) -> String {
    unsafe { copy_string(native.get_lib_version_string()) }.unwrap_or_default()
}
