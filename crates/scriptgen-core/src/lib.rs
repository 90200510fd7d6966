//! # scriptgen-core
//!
//! Builds `imapsync` invocations for bulk mailbox migrations.
//!
//! There are two ways in:
//!
//! - **Safe path**: [`generate`] takes a secret-free [`ImapSyncSpec`] plus a
//!   [`Secrets`] map and returns an [`ImapSyncCommand`] carrying both the
//!   full argument vector and a redacted twin. No I/O, nothing retained.
//! - **Unsafe path**: [`UnsafeScriptGenerator`] reads `user pass [user2 pass2]`
//!   lines, feeds them through [`generate`] and writes numbered `.sh` files
//!   that contain plaintext passwords.
//!
//! ## Example
//!
//! ```
//! use scriptgen_core::{ImapSyncSpec, Secrets, generate};
//!
//! let spec = ImapSyncSpec {
//!     host1: "imap.old.example".into(),
//!     user1: "alice@old.example".into(),
//!     pass1_ref: "src".into(),
//!     host2: "imap.new.example".into(),
//!     user2: "alice@new.example".into(),
//!     pass2_ref: "dst".into(),
//!     logfile: "alice.log".into(),
//!     extra_args: None,
//!     logdir: "/var/log/pymap".into(),
//! };
//! let secrets: Secrets = [("src", "hunter2"), ("dst", "correct-horse")].into_iter().collect();
//!
//! let command = generate(&spec, &secrets)?;
//! assert!(!command.to_string().contains("hunter2"));
//! # Ok::<(), scriptgen_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod adapter;
pub mod batch;
pub mod config;
pub mod domain;
mod error;
pub mod generator;
pub mod hosts;
pub mod model;
pub mod parser;

pub use adapter::{PASS1_REF, PASS2_REF, RunSummary, UnsafeScriptGenerator};
pub use batch::{Batches, batch_lines};
pub use config::{ConfigFile, DEFAULT_DESTINATION, DEFAULT_SPLIT, GeneratorConfig};
pub use domain::{extract_domains_from_credentials, match_domain, unique_domains};
pub use error::{Error, ParseError, Result};
pub use generator::{MASK, PROGRAM, generate, redact, split_extra_args};
pub use hosts::{KnownHost, verify_host};
pub use model::{CommandMetadata, DEFAULT_LOGDIR, ImapSyncCommand, ImapSyncSpec, Secrets};
pub use parser::{Credentials, parse_credentials};
