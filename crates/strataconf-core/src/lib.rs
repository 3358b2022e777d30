//! strataconf-core: Layered configuration with locked shape
//!
//! An application declares every setting in a defaults document. Override
//! files are merged on top, but may only change keys the defaults declare;
//! the result is locked against further change. Lookups take dotted keys and
//! honour environment variables (`db.host` is shadowed by `DB__HOST`).
//!
//! # Example
//!
//! ```rust
//! use strataconf_core::Config;
//!
//! let yaml = r#"
//! database:
//!   host: localhost
//!   port: 5432
//! "#;
//!
//! let config = Config::from_yaml(yaml).unwrap();
//! assert_eq!(config.get_raw("database.host").unwrap().as_str(), Some("localhost"));
//! assert!(config.get_raw("database.user").is_err());
//! ```
//!
//! Loading from files goes through a [`Loader`]:
//!
//! ```no_run
//! use strataconf_core::{Config, ConfigOptions};
//!
//! let config = Config::load(
//!     "myapp",
//!     ConfigOptions::new().with_app_path("/opt/myapp"),
//! )?;
//! let port = config.get_i64("server.port")?;
//! # Ok::<(), strataconf_core::Error>(())
//! ```

pub mod env;
pub mod error;
pub mod lock;
pub mod merge;
pub mod source;
pub mod value;

mod config;
mod loader;

pub use config::Config;
pub use env::{Environment, MapEnv, ProcessEnv};
pub use error::{Error, ErrorKind, Result};
pub use loader::{conventional_paths, ConfigOptions, LoadSpec, Loader, CONFIG_FLAG, DEFAULTS_FILE};
pub use lock::SequencePolicy;
pub use source::{FileSource, FileSpec, LocalFiles, PathSpec};
pub use value::{Table, Value};
