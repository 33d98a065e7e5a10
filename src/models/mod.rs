//! Domain model module declarations.

pub mod checkpoint;
pub mod contact;
pub mod outcome;

pub use checkpoint::Checkpoint;
pub use contact::Contact;
pub use outcome::DispatchOutcome;
