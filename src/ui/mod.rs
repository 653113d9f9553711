//! Terminal UI for the interactive chat screen.
//!
//! - [`chat_loop`] runs the event loop: it reads terminal input, feeds
//!   actions to [`crate::core::app`] and executes the commands they yield.
//! - [`renderer`] draws one frame from the current [`crate::core::app::App`].
//! - [`markdown`] turns transcript entries into styled lines.
//! - [`theme`] holds the styles shared by the above.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod theme;
