//! Browser automation for the chat web client.
//!
//! - [`browser::driver::ChatDriver`]: WebDriver session wrapper
//! - [`browser::session::ChatSession`]: login wait and group navigation
//! - [`browser::view::ChatView`]: the open conversation as a [`rollcall_core::ViewDriver`]
//! - [`browser::options`]: Chrome arguments and capabilities
pub mod browser;

pub use browser::driver::ChatDriver;
pub use browser::options::BrowserOptions;
pub use browser::session::ChatSession;
pub use browser::view::ChatView;
