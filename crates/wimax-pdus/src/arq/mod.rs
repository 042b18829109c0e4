pub mod discard;
pub mod feedback;
pub mod frag_subheader;

pub use discard::ArqDiscard;
pub use feedback::{ArqAckType, ArqFeedback};
pub use frag_subheader::{FragControl, FragSubheader};
