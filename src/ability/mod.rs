pub mod attack;
pub mod derived;
pub mod property;
pub mod record;
pub mod value;

pub use attack::{AttackBranch, AttackLevels, AttackSubeffects};
pub use derived::{Area, DerivedProperties, DurationType, LimitAffectedType, TargetsType};
pub use property::{PropertyDefaults, PropertyName, PRIMARY_PROPERTIES, REQUIRED_PROPERTIES};
pub use record::{AbilityRecord, Properties, Teleport, Trigger, SUBABILITY_SUFFIX};
