pub mod profile_store;
pub mod session;
pub mod store;

pub use profile_store::{FileProfileStore, InMemoryProfileStore, ProfileStore};
pub use session::{ConversationSession, SessionPhase};
pub use store::{ContextStore, FileContextStore, InMemoryContextStore};
