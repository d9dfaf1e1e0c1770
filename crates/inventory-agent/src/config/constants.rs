#[cfg(target_os = "linux")]
pub(super) const INVENTORY_CONFIG_CANDIDATES: [&str; 3] = [
    "/etc/eguard-agent/inventory.conf",
    "./conf/inventory.conf",
    "./inventory.conf",
];

#[cfg(target_os = "windows")]
pub(super) const INVENTORY_CONFIG_CANDIDATES: [&str; 3] = [
    r"C:\ProgramData\eGuard\inventory.conf",
    r".\conf\inventory.conf",
    r".\inventory.conf",
];

#[cfg(target_os = "macos")]
pub(super) const INVENTORY_CONFIG_CANDIDATES: [&str; 3] = [
    "/Library/Application Support/eGuard/inventory.conf",
    "./conf/inventory.conf",
    "./inventory.conf",
];

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
pub(super) const INVENTORY_CONFIG_CANDIDATES: [&str; 2] =
    ["./conf/inventory.conf", "./inventory.conf"];

pub(super) const CONFIG_PATH_ENV: &str = "EGUARD_INVENTORY_CONFIG";

pub(super) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub(super) const DEFAULT_KILL_GRACE_MS: u64 = 2_000;
pub(super) const DEFAULT_WORKERS: usize = 4;
pub(super) const MAX_WORKERS: usize = 64;
pub(super) const DEFAULT_LOG_LEVEL: &str = "info";
