#![deny(unused_must_use)]

pub mod color;
pub mod config;
pub mod controller;
pub mod demo;
pub mod error;
pub mod events;
pub mod logging;
pub mod meta;
pub mod net;
pub mod router;
pub mod ui;
pub mod utils;
