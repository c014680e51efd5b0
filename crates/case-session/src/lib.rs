pub mod entries;
pub mod session;
pub mod types;
pub mod view;

pub use session::CaseSession;
pub use types::*;
pub use view::{InstrumentView, SessionView, SupportView};
