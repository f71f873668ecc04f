//! Types shared between the relay and its clients.
//!
//! The wire protocol lives in [`protocol`]; everything in it is also exported
//! as TypeScript for the browser client. `cargo test -p shooter-shared` writes
//! the bindings to `shared/bindings/` (override with `TS_RS_EXPORT_DIR`); the
//! browser bundle imports them from there and is served from `public/`.

pub mod config;
pub mod pose;
pub mod protocol;
pub mod vec3;

pub use pose::Pose;
pub use protocol::{ClientMsg, DecodeError, PlayerId, PlayerWire, ServerMsg};
pub use vec3::Vec3;
