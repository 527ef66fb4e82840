pub mod session;

pub use session::SessionLog;
