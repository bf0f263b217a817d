//! Client side of the push-event gateway: one connection per authenticated
//! session, `broadcast`-based fan-out to whichever views are mounted, and
//! join/leave commands for thread-scoped rooms.

pub mod channel;

pub use channel::{ChannelConfig, ChannelState, RealtimeChannel, RoomGuard};
