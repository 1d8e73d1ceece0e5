//! Talking to the chat server.  Everything here runs outside the rendering core: the transport
//! reads on a listener thread and hands complete lines to the main loop, which decodes them with
//! `wire` and publishes the result.

pub mod tcp;
pub mod wire;
