pub mod ids;
pub mod pii;

pub use pii::Masked;
