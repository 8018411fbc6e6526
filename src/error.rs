/// Crate-level error types for schemalink diagnostics.
use std::path::PathBuf;

/// All errors in schemalink carry enough context to diagnose a failed run
/// without a debugger. Each variant names the offending path and, where one
/// exists, the underlying cause. Every error is terminal: nothing is retried,
/// and no output file is written once a run has failed.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reference resolution re-entered a file that is still being resolved.
    #[error("reference cycle detected: {}", chain.iter().map(|p| return p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    CyclicReference {
        /// Ordered chain of document paths forming the cycle. The last
        /// element repeats the in-flight path that was re-entered.
        chain: Vec<PathBuf>,
    },

    /// The input document cannot be read.
    #[error("file is not readable: {}", path.display())]
    FileNotReadable {
        /// Path that failed the readability check.
        path: PathBuf,
    },

    /// The configured definitions pointer is not a valid JSON Pointer.
    #[error("invalid JSON pointer: `{pointer}`")]
    InvalidPointer {
        /// The malformed pointer string.
        pointer: String,
    },

    /// A marker value could not be turned into a target file path.
    #[error("reference path is invalid: `{reference}` in {}", document.display())]
    InvalidReferencePath {
        /// The marker value as written in the document.
        reference: String,
        /// Document containing the malformed reference.
        document: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// The output path exists but cannot be written.
    #[error("file is not writable: {}", path.display())]
    OutputNotWritable {
        /// Path that failed the writability check.
        path: PathBuf,
    },

    /// A document failed to decode.
    #[error("parse failed: {}: {reason}", path.display())]
    Parse {
        /// Document that failed to decode.
        path: PathBuf,
        /// Description of the decode failure.
        reason: String,
    },

    /// A marker points at a file that cannot be read.
    #[error("reference target is not readable: {} (referenced from {})", path.display(), referenced_from.display())]
    ReferenceTargetUnreadable {
        /// The unreadable target path.
        path: PathBuf,
        /// Document containing the reference.
        referenced_from: PathBuf,
    },

    /// The resolved document failed to encode.
    #[error("serialization failed: {}: {reason}", path.display())]
    Serialize {
        /// Output path the document was being encoded for.
        path: PathBuf,
        /// Description of the encode failure.
        reason: String,
    },

    /// Config file deserialization failed.
    #[error("config deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// Neither a JSON nor a YAML file extension.
    #[error("unsupported file format: {}", path.display())]
    UnsupportedFormat {
        /// Path whose extension is not recognized.
        path: PathBuf,
    },
}
