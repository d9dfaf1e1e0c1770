//! Security posture records.

use crate::inventory_entity;

inventory_entity! {
    /// `Get-MpComputerStatus` summary.
    pub struct DefenderStatus: "DefenderStatus" {
        "AntivirusEnabled" => antivirus_enabled: bool,
        "RealTimeProtectionEnabled" => real_time_protection_enabled: bool,
        "AntivirusSignatureVersion" => antivirus_signature_version: String,
        "QuickScanEndTime" => quick_scan_end_time: String,
    }
}

inventory_entity! {
    /// `Win32_QuickFixEngineering`.
    pub struct HotFix: "HotFix" {
        "HotFixID" => hot_fix_id: String,
        "Description" => description: String,
        "InstalledOn" => installed_on: String,
    }
}
