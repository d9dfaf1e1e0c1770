use serde_json::{json, Value};

use super::*;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("test fixture is not an object: {other}"),
    }
}

#[test]
fn decodes_mapped_keys_and_ignores_unknown_ones() {
    let raw = object(json!({
        "Name": "Intel(R) Core(TM) i7-12700K",
        "NumberOfCores": 12,
        "L2CacheSize": 12288,
        "PSComputerName": "WS-01"
    }));

    let cpu = Processor::from_json_object(&raw).expect("decode processor");
    assert_eq!(cpu.name.as_deref(), Some("Intel(R) Core(TM) i7-12700K"));
    assert_eq!(cpu.number_of_cores, Property::Value(12));
    assert!(cpu.max_clock_speed.is_absent());
}

#[test]
fn key_match_is_case_sensitive() {
    let raw = object(json!({ "name": "lowercase key", "NAME": "upper" }));
    let cpu = Processor::from_json_object(&raw).expect("decode processor");
    assert!(cpu.name.is_absent());
}

#[test]
fn explicit_null_is_distinct_from_missing() {
    let raw = object(json!({ "Name": null }));
    let cpu = Processor::from_json_object(&raw).expect("decode processor");
    assert!(cpu.name.is_null());
    assert!(cpu.manufacturer.is_absent());
    assert_eq!(cpu.name.value(), None);
}

#[test]
fn wrong_value_type_names_entity_and_key() {
    let raw = object(json!({ "NumberOfCores": "twelve" }));
    let err = Processor::from_json_object(&raw).expect_err("string for integer field");
    assert_eq!(
        err,
        "Processor.NumberOfCores: expected unsigned 32-bit integer, found string"
    );
}

#[test]
fn out_of_range_integer_is_rejected() {
    let raw = object(json!({ "Architecture": 70000 }));
    assert!(Processor::from_json_object(&raw).is_err());
}

#[test]
fn array_fields_require_homogeneous_elements() {
    let ok = object(json!({ "IPAddress": ["10.0.0.5", "fe80::1"] }));
    let adapter = NetworkAdapterConfiguration::from_json_object(&ok).expect("decode adapter");
    assert_eq!(adapter.ip_address.value().map(Vec::len), Some(2));

    let mixed = object(json!({ "IPAddress": ["10.0.0.5", 7] }));
    assert!(NetworkAdapterConfiguration::from_json_object(&mixed).is_err());
}

#[test]
fn encoding_round_trip_preserves_field_presence() {
    let original = ComputerSystem {
        name: Property::Value("WS-01".to_string()),
        domain: Property::Null,
        part_of_domain: Property::Value(false),
        total_physical_memory: Property::Value(34_359_738_368),
        ..ComputerSystem::default()
    };

    let encoded = original.to_json();
    assert_eq!(
        encoded,
        json!({
            "Name": "WS-01",
            "Domain": null,
            "PartOfDomain": false,
            "TotalPhysicalMemory": 34_359_738_368u64
        })
    );

    let decoded = ComputerSystem::from_json_object(&object(encoded)).expect("decode");
    assert_eq!(decoded, original);
    assert!(decoded.domain.is_null());
    assert!(decoded.model.is_absent());
}

#[test]
fn serializes_with_wire_keys() {
    let status = DefenderStatus {
        antivirus_enabled: Property::Value(true),
        antivirus_signature_version: Property::Value("1.2.3.4".to_string()),
        ..DefenderStatus::default()
    };
    let rendered = serde_json::to_string(&status).expect("serialize");
    assert_eq!(
        rendered,
        r#"{"AntivirusEnabled":true,"AntivirusSignatureVersion":"1.2.3.4"}"#
    );
}

#[test]
fn key_tables_have_no_duplicate_keys() {
    fn assert_unique<E: Entity>() {
        let mut keys: Vec<&str> = E::FIELDS.iter().map(|f| f.key).collect();
        keys.sort_unstable();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len(), "duplicate key in {}", E::NAME);
    }

    assert_unique::<ComputerSystem>();
    assert_unique::<OperatingSystem>();
    assert_unique::<Processor>();
    assert_unique::<Bios>();
    assert_unique::<PhysicalMemory>();
    assert_unique::<DiskDrive>();
    assert_unique::<LogicalDisk>();
    assert_unique::<VideoController>();
    assert_unique::<NetworkAdapterConfiguration>();
    assert_unique::<InstalledProgram>();
    assert_unique::<HotFix>();
    assert_unique::<DefenderStatus>();
}
