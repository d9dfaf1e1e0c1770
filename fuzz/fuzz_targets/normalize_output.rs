#![no_main]

use host_inventory::entity::{
    DiskDrive, HotFix, NetworkAdapterConfiguration, OperatingSystem, Processor,
};
use host_inventory::normalize::{normalize_list, normalize_single};
use host_inventory::{Entity, RawResponse};
use libfuzzer_sys::fuzz_target;

fn exercise<E: Entity>(text: &str) {
    if let Ok(items) = normalize_list::<E>(RawResponse::success(text)) {
        for item in &items {
            let _ = item.to_json();
        }
    }
    if let Ok(Some(item)) = normalize_single::<E>(RawResponse::success(text)) {
        // Whatever decodes must re-decode from its own encoding.
        let encoded = item.to_json().to_string();
        let again = normalize_single::<E>(RawResponse::success(encoded));
        assert!(matches!(again, Ok(Some(_))));
    }
}

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    exercise::<Processor>(&text);
    exercise::<OperatingSystem>(&text);
    exercise::<DiskDrive>(&text);
    exercise::<NetworkAdapterConfiguration>(&text);
    exercise::<HotFix>(&text);
});
