pub mod context;
pub mod logging;

pub use context::{build_context, AuthContext, CurrentUser};
pub use logging::procedure_log;
