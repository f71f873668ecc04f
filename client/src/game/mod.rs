pub mod bot;
pub mod collab;
pub mod session;
pub mod sync;

pub use collab::{HitTester, MessageSink, PoseSource, Scene};
pub use session::ClientSession;
pub use sync::LocalSyncAgent;
