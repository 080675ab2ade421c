pub mod capabilities;
pub mod headless;
pub mod output;

// Re-export commonly used items
pub use capabilities::{
    GpgUi, IdentifyUi, LogLevel, LogUi, LoginUi, ProveUi, SecretUi, UiMode, UiProvider,
};
pub use headless::{HeadlessUi, StaticSecretUi, TracingLogUi};
pub use output::OutputProbe;
