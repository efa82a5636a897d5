//! Clyde core library: Discord gateway session, event routing, and reply
//! formatting, shared by the interactive and one-shot front-ends.

pub mod clipboard;
pub mod config;
pub mod event;
pub mod format;
pub mod gateway;
pub mod markdown;
pub mod mode;
pub mod oneshot;
pub mod routing;
pub mod session;
pub mod theme;
