// SPDX-License-Identifier: CEPL-1.0
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::ErrorKind;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader `{name}` not found")]
    FileNotFound { name: String },
    #[error("failed to read shader `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl ShaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShaderError::FileNotFound { .. } => ErrorKind::ResourceNotFound,
            ShaderError::Io { .. } => ErrorKind::Initialization,
        }
    }
}

/// Storage for precompiled shader bytecode. The bytes are passed through untouched.
pub trait ShaderSource {
    fn load_bytes(&self, name: &str) -> Result<Vec<u8>, ShaderError>;
}

/// Loads `<root>/<name>` from disk.
#[derive(Clone, Debug)]
pub struct DirShaderSource {
    root: PathBuf,
}

impl DirShaderSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ShaderSource for DirShaderSource {
    fn load_bytes(&self, name: &str) -> Result<Vec<u8>, ShaderError> {
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!("loaded shader {} ({} bytes)", path.display(), bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ShaderError::FileNotFound {
                name: name.to_owned(),
            }),
            Err(source) => Err(ShaderError::Io {
                name: name.to_owned(),
                source,
            }),
        }
    }
}
