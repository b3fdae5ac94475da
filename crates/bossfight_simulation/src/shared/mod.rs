//! Shared domain: cross-cutting building blocks
//!
//! - Observers: явные списки подписчиков (subscribe/unsubscribe/emit)
//! - Pose: позиция + facing атакующего тела

pub mod observers;
pub mod pose;

pub use observers::*;
pub use pose::*;
