// SPDX-License-Identifier: CEPL-1.0
use std::fmt;

/// Coarse failure classes shared by every backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Windowing or API-instance bring-up.
    Initialization,
    /// No devices, or none eligible.
    DeviceSelection,
    /// A GPU object could not be created.
    ResourceCreation,
    /// Per-frame command recording.
    Recording,
    /// A named resource (shader bytecode) is missing.
    ResourceNotFound,
    /// Steady-state wait / acquire / submit / present.
    Frame,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Initialization => "initialization failure",
            ErrorKind::DeviceSelection => "device selection failure",
            ErrorKind::ResourceCreation => "resource creation failure",
            ErrorKind::Recording => "recording failure",
            ErrorKind::ResourceNotFound => "resource not found",
            ErrorKind::Frame => "frame failure",
        };
        f.write_str(s)
    }
}
