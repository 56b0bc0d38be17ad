//! WebSocket gateway: wire protocol, message dispatch and socket tasks

pub mod dispatch;
pub mod handler;
pub mod protocol;
