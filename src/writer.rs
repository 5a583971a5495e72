//! Classification and persistence of extracted scripts.
//!
//! Every reserved script body ends up in exactly one of three places:
//!
//! - `<prefix>/<path>` when it parses as JavaScript,
//! - `<prefix>/.bad/<path>` when it does not parse and does not look like markup,
//! - nowhere, when it does not parse and sniffs as HTML/XML (a mis-captured
//!   error page or fragment). Its fingerprint stays consumed.
//!
//! Files are written through a temporary file in the target directory and
//! renamed into place, so a reader never sees a partial script.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::config::QUARANTINE_DIR;
use crate::javascript::{QuickJsValidator, SyntaxOracle, SyntaxVerdict};
use crate::mime::{is_markup_mime, MarkupSniffer, MimeOracle};

/// What [`ScriptWriter::classify_and_write`] did with a body.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Written to its normal location.
    Written(PathBuf),
    /// Failed the syntax check and was written under the quarantine tree.
    Quarantined(PathBuf),
    /// Failed the syntax check and sniffed as markup; nothing was written.
    DiscardedMarkup,
    /// The file could not be written.
    Failed(std::io::Error),
}

/// Builds the provenance line that precedes every script body.
pub fn provenance_header(date: Option<&str>, source_url: &str) -> String {
    match date {
        Some(date) => format!("// Retrieved {date}, from {source_url}\n"),
        None => format!("// Retrieved from {source_url}\n"),
    }
}

/// Writes classified scripts under an output prefix.
pub struct ScriptWriter {
    prefix: PathBuf,
    syntax: Box<dyn SyntaxOracle>,
    mime: Box<dyn MimeOracle>,
}

impl ScriptWriter {
    /// Writer with the QuickJS syntax check and the markup sniffer.
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self::with_oracles(
            prefix,
            Box::new(QuickJsValidator::default()),
            Box::new(MarkupSniffer),
        )
    }

    pub fn with_oracles(
        prefix: impl Into<PathBuf>,
        syntax: Box<dyn SyntaxOracle>,
        mime: Box<dyn MimeOracle>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            syntax,
            mime,
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Classifies `body` and writes it with its provenance header.
    ///
    /// Never fails: write errors are reported as [`WriteOutcome::Failed`] and
    /// logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Derived relative path (see [`crate::path_scheme::derive_path`])
    /// * `date` - Retrieval date for the header, if known
    /// * `source_url` - URL the script was retrieved from (or embedded in)
    /// * `body` - Raw script bytes
    pub fn classify_and_write(
        &self,
        path: &str,
        date: Option<&str>,
        source_url: &str,
        body: &[u8],
    ) -> WriteOutcome {
        let (target, quarantined) = match self.syntax.check(body) {
            SyntaxVerdict::Valid => (self.prefix.join(path), false),
            SyntaxVerdict::Undetermined(reason) => {
                debug!("Syntax check of {path} undetermined ({reason}), keeping it");
                (self.prefix.join(path), false)
            }
            SyntaxVerdict::Invalid(reason) => {
                if is_markup_mime(&self.mime.sniff(body)) {
                    return WriteOutcome::DiscardedMarkup;
                }
                warn!("Cannot parse {path}: {reason}");
                (self.prefix.join(QUARANTINE_DIR).join(path), true)
            }
        };

        let header = provenance_header(date, source_url);
        match write_atomically(&target, header.as_bytes(), body) {
            Ok(()) if quarantined => WriteOutcome::Quarantined(target),
            Ok(()) => WriteOutcome::Written(target),
            Err(e) => {
                warn!("Cannot write {}: {e}", target.display());
                WriteOutcome::Failed(e)
            }
        }
    }
}

/// Writes `header` then `body` to `target`, creating parent directories.
fn write_atomically(target: &Path, header: &[u8], body: &[u8]) -> std::io::Result<()> {
    let parent = target.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no parent directory")
    })?;
    std::fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(header)?;
    file.write_all(body)?;
    file.flush()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}
