//! One attached page target, driven through the shared client socket.

mod core;
mod js;
mod navigation;

pub use self::core::PageSession;
