//! Client side of the relay protocol.
//!
//! [`net`] turns relay events into a cache of remote players and owns the
//! WebSocket transport. [`game`] holds the per-frame glue: the sync agent that
//! reports the local pose and shots, the collaborator traits the renderer,
//! physics and input layers implement, and a headless bot.

pub mod game;
pub mod net;
