pub mod executor;
pub mod script;

pub use executor::CommandExecutor;
pub use script::{ScriptRunner, ShellRunner};
