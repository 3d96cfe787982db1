//! Privacy and quantum score engines.

pub mod permissions;
pub mod privacy;
pub mod quantum;

pub use permissions::{
    collect_permissions, PermissionName, PermissionProbe, PermissionSnapshot, PermissionState,
};
pub use privacy::{
    calculate_uniqueness, djb2, PrivacyFactor, PrivacyInputs, PrivacyScore, PrivacyScoreEngine,
};
pub use quantum::{quantum_label, QuantumScore, QuantumScoreEngine, Tunneling};
