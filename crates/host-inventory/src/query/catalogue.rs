//! Built-in inventory queries.
//!
//! Every query prints compressed JSON. List queries wrap their pipeline in
//! `-InputObject @(...)` so a single match still serializes as an array and
//! no match serializes as `[]`. Date properties are rendered as round-trip
//! strings because Windows PowerShell 5.1 and PowerShell 7 disagree on how
//! `DateTime` values serialize.

use serde_json::Value;

use super::{EntityQuery, List, Query, Shape, Single};
use crate::entity::{
    Bios, ComputerSystem, DefenderStatus, DiskDrive, Entity, HotFix, InstalledProgram,
    LogicalDisk, NetworkAdapterConfiguration, OperatingSystem, PhysicalMemory, Processor,
    VideoController,
};
use crate::error::Result;
use crate::exec::RawResponse;
use crate::normalize::normalize;

pub static COMPUTER_SYSTEM: EntityQuery<ComputerSystem, Single> = EntityQuery::new(
    "computer_system",
    "Get-CimInstance Win32_ComputerSystem | Select-Object -First 1 Name,Manufacturer,Model,Domain,PartOfDomain,TotalPhysicalMemory,NumberOfProcessors,SystemType,UserName | ConvertTo-Json -Compress",
);

pub static OPERATING_SYSTEM: EntityQuery<OperatingSystem, Single> = EntityQuery::new(
    "operating_system",
    "Get-CimInstance Win32_OperatingSystem | Select-Object -First 1 Caption,Version,BuildNumber,OSArchitecture,SerialNumber,@{n='InstallDate';e={if($_.InstallDate){$_.InstallDate.ToString('o')}}},@{n='LastBootUpTime';e={if($_.LastBootUpTime){$_.LastBootUpTime.ToString('o')}}} | ConvertTo-Json -Compress",
);

pub static PROCESSORS: EntityQuery<Processor, List> = EntityQuery::new(
    "processors",
    "ConvertTo-Json -Compress -InputObject @(Get-CimInstance Win32_Processor | Select-Object Name,Manufacturer,ProcessorId,Architecture,MaxClockSpeed,NumberOfCores,NumberOfLogicalProcessors)",
);

pub static BIOS: EntityQuery<Bios, Single> = EntityQuery::new(
    "bios",
    "Get-CimInstance Win32_BIOS | Select-Object -First 1 Manufacturer,SerialNumber,SMBIOSBIOSVersion,@{n='ReleaseDate';e={if($_.ReleaseDate){$_.ReleaseDate.ToString('o')}}} | ConvertTo-Json -Compress",
);

pub static PHYSICAL_MEMORY: EntityQuery<PhysicalMemory, List> = EntityQuery::new(
    "physical_memory",
    "ConvertTo-Json -Compress -InputObject @(Get-CimInstance Win32_PhysicalMemory | Select-Object Capacity,Speed,SMBIOSMemoryType,Manufacturer,PartNumber,DeviceLocator)",
);

pub static DISK_DRIVES: EntityQuery<DiskDrive, List> = EntityQuery::new(
    "disk_drives",
    "ConvertTo-Json -Compress -InputObject @(Get-CimInstance Win32_DiskDrive | Select-Object Model,Size,MediaType,InterfaceType,SerialNumber)",
);

pub static LOGICAL_DISKS: EntityQuery<LogicalDisk, List> = EntityQuery::new(
    "logical_disks",
    "ConvertTo-Json -Compress -InputObject @(Get-CimInstance Win32_LogicalDisk -Filter 'DriveType=3' | Select-Object DeviceID,VolumeName,FileSystem,Size,FreeSpace)",
);

pub static VIDEO_CONTROLLERS: EntityQuery<VideoController, List> = EntityQuery::new(
    "video_controllers",
    "ConvertTo-Json -Compress -InputObject @(Get-CimInstance Win32_VideoController | Select-Object Name,AdapterRAM,DriverVersion,VideoProcessor)",
);

pub static NETWORK_ADAPTERS: EntityQuery<NetworkAdapterConfiguration, List> = EntityQuery::new(
    "network_adapters",
    "ConvertTo-Json -Compress -InputObject @(Get-CimInstance Win32_NetworkAdapterConfiguration -Filter \"IPEnabled=TRUE\" | Select-Object Description,MACAddress,@{n='IPAddress';e={@($_.IPAddress)}},@{n='IPSubnet';e={@($_.IPSubnet)}},@{n='DefaultIPGateway';e={@($_.DefaultIPGateway)}},DNSHostName,DHCPEnabled)",
);

pub static INSTALLED_PROGRAMS: EntityQuery<InstalledProgram, List> = EntityQuery::new(
    "installed_programs",
    r"ConvertTo-Json -Compress -InputObject @(Get-ItemProperty HKLM:\Software\Microsoft\Windows\CurrentVersion\Uninstall\*,HKLM:\Software\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall\* -EA SilentlyContinue | Where-Object { $_.DisplayName } | Select-Object DisplayName,DisplayVersion,Publisher,@{n='InstallDate';e={if($_.InstallDate){[string]$_.InstallDate}}})",
);

pub static DEFENDER_STATUS: EntityQuery<DefenderStatus, Single> = EntityQuery::new(
    "defender_status",
    "Get-MpComputerStatus | Select-Object -First 1 AntivirusEnabled,RealTimeProtectionEnabled,AntivirusSignatureVersion,@{n='QuickScanEndTime';e={if($_.QuickScanEndTime){$_.QuickScanEndTime.ToString('o')}}} | ConvertTo-Json -Compress",
);

pub static HOT_FIXES: EntityQuery<HotFix, List> = EntityQuery::new(
    "hot_fixes",
    "ConvertTo-Json -Compress -InputObject @(Get-HotFix | Select-Object HotFixID,Description,@{n='InstalledOn';e={if($_.InstalledOn){$_.InstalledOn.ToString('o')}}})",
);

/// Untyped view of a catalogue query: its text plus a normalizer that
/// renders the decoded records back to JSON.
#[derive(Debug, Clone, Copy)]
pub struct CatalogueEntry {
    pub query: &'static Query,
    pub entity: &'static str,
    pub normalize: fn(RawResponse) -> Result<Value>,
}

impl CatalogueEntry {
    fn of<E: Entity, S: Shape>(query: &'static EntityQuery<E, S>) -> Self {
        Self {
            query: query.query(),
            entity: E::NAME,
            normalize: normalize_to_json::<E, S>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.query.name()
    }
}

fn normalize_to_json<E: Entity, S: Shape>(raw: RawResponse) -> Result<Value> {
    let output = normalize::<E>(raw, S::KIND).map(S::extract)?;
    Ok(S::output_to_json::<E>(&output))
}

/// Every built-in query, in collection order.
pub fn all() -> Vec<CatalogueEntry> {
    vec![
        CatalogueEntry::of(&COMPUTER_SYSTEM),
        CatalogueEntry::of(&OPERATING_SYSTEM),
        CatalogueEntry::of(&PROCESSORS),
        CatalogueEntry::of(&BIOS),
        CatalogueEntry::of(&PHYSICAL_MEMORY),
        CatalogueEntry::of(&DISK_DRIVES),
        CatalogueEntry::of(&LOGICAL_DISKS),
        CatalogueEntry::of(&VIDEO_CONTROLLERS),
        CatalogueEntry::of(&NETWORK_ADAPTERS),
        CatalogueEntry::of(&INSTALLED_PROGRAMS),
        CatalogueEntry::of(&DEFENDER_STATUS),
        CatalogueEntry::of(&HOT_FIXES),
    ]
}

pub fn find(name: &str) -> Option<CatalogueEntry> {
    all().into_iter().find(|entry| entry.name() == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::query::QueryShape;

    #[test]
    fn names_are_unique() {
        let entries = all();
        let names: HashSet<_> = entries.iter().map(CatalogueEntry::name).collect();
        assert_eq!(names.len(), entries.len());
    }

    #[test]
    fn every_query_emits_compressed_json() {
        for entry in all() {
            let text = entry.query.text();
            assert!(text.contains("ConvertTo-Json -Compress"), "{}", entry.name());
            if entry.query.shape() == QueryShape::List {
                assert!(text.contains("-InputObject @("), "{}", entry.name());
            } else {
                assert!(text.contains("-First 1"), "{}", entry.name());
            }
        }
    }

    #[test]
    fn find_resolves_by_name() {
        let entry = find("bios").expect("bios entry");
        assert_eq!(entry.entity, "Bios");
        assert_eq!(entry.query.shape(), QueryShape::Single);
        assert!(find("BIOS").is_none());
    }

    #[test]
    fn entry_normalizer_renders_records_with_wire_keys() {
        let entry = find("hot_fixes").expect("hot fix entry");
        let value = (entry.normalize)(RawResponse::success(
            r#"[{"HotFixID":"KB5034441","Description":"Security Update","InstalledOn":null}]"#,
        ))
        .expect("normalize");
        assert_eq!(
            value,
            serde_json::json!([{"HotFixID":"KB5034441","Description":"Security Update","InstalledOn":null}])
        );

        let empty = (find("defender_status").expect("defender").normalize)(RawResponse::success(""))
            .expect("empty");
        assert_eq!(empty, Value::Null);
    }

    #[test]
    fn typed_query_decodes_into_entity() {
        let bios = BIOS
            .decode(RawResponse::success(
                r#"{"Manufacturer":"LENOVO","SerialNumber":"PF3ABCDE","SMBIOSBIOSVersion":"N32ET86W"}"#,
            ))
            .expect("decode bios")
            .expect("bios present");
        assert_eq!(bios.serial_number.as_deref(), Some("PF3ABCDE"));
        assert!(bios.release_date.is_absent());
    }
}
