pub mod config;
pub mod convert;
pub mod enumerate;
pub mod error;
pub mod format;
pub mod invoker;
pub mod scheduler;

pub use config::UsdConfig;
pub use convert::{convert_one, convert_to_dir, launch_viewer};
pub use enumerate::enumerate;
pub use error::{Result, UsdError};
pub use format::UsdFormat;
pub use invoker::{Converter, Invoker, ScriptedConverter};
pub use scheduler::{
    run_batch, BatchResult, CancelToken, ConversionOutcome, ConversionTask, ProgressEvent,
    ProgressSink,
};
