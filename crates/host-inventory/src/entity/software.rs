//! Installed software from the registry uninstall keys.

use crate::inventory_entity;

inventory_entity! {
    /// One `Uninstall\*` registry entry with a display name.
    pub struct InstalledProgram: "InstalledProgram" {
        "DisplayName" => display_name: String,
        "DisplayVersion" => display_version: String,
        "Publisher" => publisher: String,
        "InstallDate" => install_date: String,
    }
}

impl InstalledProgram {
    /// Install date as `dd/mm/yyyy`, from the registry's `yyyyMMdd` form.
    pub fn install_date_dmy(&self) -> Option<String> {
        let raw = self.install_date.as_deref()?.trim();
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(format!("{}/{}/{}", &raw[6..8], &raw[4..6], &raw[0..4]))
    }
}
