//! Hardware records (CIM `Win32_*` classes).

use crate::inventory_entity;

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * 1024 * 1024;

inventory_entity! {
    /// `Win32_ComputerSystem`.
    pub struct ComputerSystem: "ComputerSystem" {
        "Name" => name: String,
        "Manufacturer" => manufacturer: String,
        "Model" => model: String,
        "Domain" => domain: String,
        "PartOfDomain" => part_of_domain: bool,
        "TotalPhysicalMemory" => total_physical_memory: u64,
        "NumberOfProcessors" => number_of_processors: u32,
        "SystemType" => system_type: String,
        "UserName" => user_name: String,
    }
}

impl ComputerSystem {
    pub fn total_memory_mb(&self) -> Option<u64> {
        self.total_physical_memory.value().map(|bytes| bytes / MB)
    }
}

inventory_entity! {
    /// `Win32_OperatingSystem`. Timestamps are pre-rendered as ISO 8601 by the query.
    pub struct OperatingSystem: "OperatingSystem" {
        "Caption" => caption: String,
        "Version" => version: String,
        "BuildNumber" => build_number: String,
        "OSArchitecture" => os_architecture: String,
        "SerialNumber" => serial_number: String,
        "InstallDate" => install_date: String,
        "LastBootUpTime" => last_boot_up_time: String,
    }
}

inventory_entity! {
    /// `Win32_Processor`.
    pub struct Processor: "Processor" {
        "Name" => name: String,
        "Manufacturer" => manufacturer: String,
        "ProcessorId" => processor_id: String,
        "Architecture" => architecture: u16,
        "MaxClockSpeed" => max_clock_speed: u32,
        "NumberOfCores" => number_of_cores: u32,
        "NumberOfLogicalProcessors" => number_of_logical_processors: u32,
    }
}

inventory_entity! {
    /// `Win32_BIOS`.
    pub struct Bios: "Bios" {
        "Manufacturer" => manufacturer: String,
        "SerialNumber" => serial_number: String,
        "SMBIOSBIOSVersion" => smbios_bios_version: String,
        "ReleaseDate" => release_date: String,
    }
}

inventory_entity! {
    /// `Win32_PhysicalMemory`, one row per DIMM.
    pub struct PhysicalMemory: "PhysicalMemory" {
        "Capacity" => capacity: u64,
        "Speed" => speed: u32,
        "SMBIOSMemoryType" => smbios_memory_type: u32,
        "Manufacturer" => manufacturer: String,
        "PartNumber" => part_number: String,
        "DeviceLocator" => device_locator: String,
    }
}

impl PhysicalMemory {
    pub fn capacity_mb(&self) -> Option<u64> {
        self.capacity.value().map(|bytes| bytes / MB)
    }

    /// Memory generation name, `None` for unknown SMBIOS codes.
    pub fn memory_type_name(&self) -> Option<&'static str> {
        self.smbios_memory_type
            .value()
            .and_then(|code| smbios_memory_type(*code))
    }
}

inventory_entity! {
    /// `Win32_DiskDrive`.
    pub struct DiskDrive: "DiskDrive" {
        "Model" => model: String,
        "Size" => size: u64,
        "MediaType" => media_type: String,
        "InterfaceType" => interface_type: String,
        "SerialNumber" => serial_number: String,
    }
}

impl DiskDrive {
    pub fn size_gb(&self) -> Option<u64> {
        self.size.value().map(|bytes| bytes / GB)
    }

    pub fn disk_type(&self) -> DiskKind {
        classify_media_type(
            self.media_type.as_deref().unwrap_or(""),
            self.model.as_deref().unwrap_or(""),
        )
    }
}

inventory_entity! {
    /// `Win32_LogicalDisk`, fixed volumes only.
    pub struct LogicalDisk: "LogicalDisk" {
        "DeviceID" => device_id: String,
        "VolumeName" => volume_name: String,
        "FileSystem" => file_system: String,
        "Size" => size: u64,
        "FreeSpace" => free_space: u64,
    }
}

impl LogicalDisk {
    pub fn free_gb(&self) -> Option<u64> {
        self.free_space.value().map(|bytes| bytes / GB)
    }
}

inventory_entity! {
    /// `Win32_VideoController`.
    pub struct VideoController: "VideoController" {
        "Name" => name: String,
        "AdapterRAM" => adapter_ram: u64,
        "DriverVersion" => driver_version: String,
        "VideoProcessor" => video_processor: String,
    }
}

impl VideoController {
    pub fn vram_mb(&self) -> Option<u64> {
        self.adapter_ram
            .value()
            .filter(|bytes| **bytes > 0)
            .map(|bytes| bytes / MB)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskKind {
    NVMe,
    Ssd,
    Hdd,
    Virtual,
    Other,
}

fn smbios_memory_type(code: u32) -> Option<&'static str> {
    match code {
        20 => Some("DDR"),
        21 => Some("DDR2"),
        22 => Some("DDR2 FB-DIMM"),
        24 => Some("DDR3"),
        26 => Some("DDR4"),
        34 => Some("DDR5"),
        _ => None,
    }
}

fn classify_media_type(media: &str, model: &str) -> DiskKind {
    let media = media.to_ascii_lowercase();
    let model = model.to_ascii_lowercase();
    if model.contains("nvme") || model.contains("nvm") {
        DiskKind::NVMe
    } else if media.contains("solid state") || media.contains("ssd") {
        DiskKind::Ssd
    } else if media.contains("fixed hard disk") || media.contains("hdd") {
        DiskKind::Hdd
    } else if media.is_empty() {
        // Virtual disks usually report no MediaType.
        DiskKind::Virtual
    } else {
        DiskKind::Other
    }
}
