//! Inventory record model.
//!
//! Every entity is a plain attribute bag whose fields are bound to wire keys
//! through a statically declared table. Decoding walks that table, never the
//! JSON object, so unknown keys are ignored and missing keys stay absent.

pub mod hardware;
pub mod network;
pub mod security;
pub mod software;

pub use hardware::{
    Bios, ComputerSystem, DiskDrive, LogicalDisk, OperatingSystem, PhysicalMemory, Processor,
    VideoController,
};
pub use network::NetworkAdapterConfiguration;
pub use security::{DefenderStatus, HotFix};
pub use software::InstalledProgram;

use serde_json::{Map, Value};

/// A single attribute as reported by the interpreter.
///
/// `Absent` and `Null` are kept apart so that re-encoding a decoded record
/// reproduces the original key set, explicit nulls included.
#[derive(Debug, Clone, PartialEq)]
pub enum Property<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Property<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Property<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.value().map(String::as_str)
    }
}

impl<T> From<T> for Property<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: PropertyValue> Property<T> {
    /// Decode one wire value. `null` is accepted for every field type.
    pub fn decode(value: &Value) -> Result<Self, String> {
        if value.is_null() {
            return Ok(Self::Null);
        }
        T::from_json(value).map(Self::Value).ok_or_else(|| {
            format!(
                "expected {}, found {}",
                T::TYPE_NAME,
                json_type_name(value)
            )
        })
    }

    /// Encode for the wire; `None` means the key is omitted.
    pub fn encode(&self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Null => Some(Value::Null),
            Self::Value(v) => Some(v.to_json()),
        }
    }
}

/// Strict conversion between a JSON value and a field type.
pub trait PropertyValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_json(value: &Value) -> Option<Self>;
    fn to_json(&self) -> Value;
}

impl PropertyValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(ToString::to_string)
    }

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl PropertyValue for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl PropertyValue for u16 {
    const TYPE_NAME: &'static str = "unsigned 16-bit integer";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_u64().and_then(|v| u16::try_from(v).ok())
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl PropertyValue for u32 {
    const TYPE_NAME: &'static str = "unsigned 32-bit integer";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl PropertyValue for u64 {
    const TYPE_NAME: &'static str = "unsigned 64-bit integer";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_u64()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl PropertyValue for i64 {
    const TYPE_NAME: &'static str = "signed 64-bit integer";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_i64()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl PropertyValue for f64 {
    const TYPE_NAME: &'static str = "number";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl<T: PropertyValue> PropertyValue for Vec<T> {
    const TYPE_NAME: &'static str = "array";

    fn from_json(value: &Value) -> Option<Self> {
        value
            .as_array()?
            .iter()
            .map(T::from_json)
            .collect::<Option<Vec<_>>>()
    }

    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(PropertyValue::to_json).collect())
    }
}

/// One row of an entity's key table.
pub struct FieldBinding<E> {
    pub key: &'static str,
    pub decode: fn(&mut E, &Value) -> Result<(), String>,
    pub encode: fn(&E) -> Option<Value>,
}

/// A record decodable from one JSON object of interpreter output.
pub trait Entity: Default + Sized + 'static {
    /// Entity name used in logs and error messages.
    const NAME: &'static str;

    /// Wire key to field table. Keys match case-sensitively.
    const FIELDS: &'static [FieldBinding<Self>];

    fn from_json_object(object: &Map<String, Value>) -> Result<Self, String> {
        let mut entity = Self::default();
        for binding in Self::FIELDS {
            if let Some(value) = object.get(binding.key) {
                (binding.decode)(&mut entity, value)
                    .map_err(|reason| format!("{}.{}: {reason}", Self::NAME, binding.key))?;
            }
        }
        Ok(entity)
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();
        for binding in Self::FIELDS {
            if let Some(value) = (binding.encode)(self) {
                object.insert(binding.key.to_string(), value);
            }
        }
        Value::Object(object)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declare an entity struct together with its wire key table.
///
/// ```
/// host_inventory::inventory_entity! {
///     /// A disk volume.
///     pub struct Volume: "Volume" {
///         "DeviceID" => device_id: String,
///         "FreeSpace" => free_space: u64,
///     }
/// }
///
/// use host_inventory::entity::Entity;
/// assert_eq!(Volume::FIELDS.len(), 2);
/// ```
#[macro_export]
macro_rules! inventory_entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $entity_name:literal {
            $( $key:literal => $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( pub $field: $crate::entity::Property<$ty>, )*
        }

        impl $crate::entity::Entity for $name {
            const NAME: &'static str = $entity_name;
            const FIELDS: &'static [$crate::entity::FieldBinding<Self>] = &[
                $(
                    $crate::entity::FieldBinding {
                        key: $key,
                        decode: |entity: &mut $name,
                                 value: &$crate::__private::serde_json::Value|
                         -> ::std::result::Result<(), ::std::string::String> {
                            entity.$field = $crate::entity::Property::<$ty>::decode(value)?;
                            Ok(())
                        },
                        encode: |entity: &$name| entity.$field.encode(),
                    },
                )*
            ];
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                $crate::__private::serde::Serialize::serialize(
                    &$crate::entity::Entity::to_json(self),
                    serializer,
                )
            }
        }
    };
}

#[cfg(test)]
mod tests;
