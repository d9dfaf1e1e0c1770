mod constants;
mod defaults;
mod env;
mod file;
mod load;
mod paths;
mod types;
mod util;

pub use types::{InterpreterKind, InventoryConfig, Strategy};
pub(crate) use util::{parse_interpreter, parse_strategy};

#[cfg(test)]
mod tests;
