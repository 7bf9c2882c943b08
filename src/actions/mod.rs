//! File actions module.
//!
//! This module provides the optional copy side-channel: while a file is
//! hashed, each chunk can be written to a mirror of the source tree, and
//! the copy gets the source's timestamps once it is complete.
//!
//! ```no_run
//! use hashkeeper::actions::MirrorCopier;
//! use hashkeeper::scanner::Hasher;
//! use std::path::Path;
//!
//! let mut copier = MirrorCopier::new(Path::new("/data"), Path::new("/backup/data")).unwrap();
//! let hashed = Hasher::new()
//!     .hash_file(Path::new("/data/a.txt"), Some(&mut copier))
//!     .unwrap();
//! println!("{}", hashed.hex());
//! ```

pub mod mirror;

pub use mirror::{CopyHandle, CopySink, MirrorCopier, MirrorError};
