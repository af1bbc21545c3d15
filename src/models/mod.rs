pub mod analysis;
pub mod clinic;
pub mod enums;
pub mod patient;
pub mod practitioner;
pub mod symptom;

pub use analysis::*;
pub use clinic::*;
pub use patient::*;
pub use practitioner::*;
pub use symptom::*;
