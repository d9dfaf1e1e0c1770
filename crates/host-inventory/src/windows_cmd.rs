//! Canonical Windows system command paths.
//!
//! Using absolute system paths avoids PATH-search hijacking when spawning
//! the interpreter from a privileged inventory service.

#[cfg(target_os = "windows")]
pub(crate) const POWERSHELL_EXE: &str =
    r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe";
#[cfg(target_os = "windows")]
pub(crate) const TASKKILL_EXE: &str = r"C:\Windows\System32\taskkill.exe";

/// PowerShell Core on non-Windows hosts, resolved through PATH.
#[cfg(not(target_os = "windows"))]
pub(crate) const POWERSHELL_EXE: &str = "pwsh";

pub(crate) const POSIX_SHELL: &str = "sh";
