//! Session management module.
//!
//! The local view of a narrative session: its identifier, its current
//! state label, and the store that holds the single live snapshot.

mod id;
mod state;
mod store;

pub use id::SessionId;
pub use state::StateName;
pub use store::{chapter_label, Character, Session, SessionStore, UiData};
