pub mod catalog;
pub mod modifiers;

pub use catalog::{AbilityCatalog, LoaderError, DEFAULT_ITEMS_PATH, DEFAULT_SPELLS_PATH};
pub use modifiers::{ModifierTable, DEFAULT_MODIFIERS_PATH};
