//! Fingerprint report assembly
//!
//! ```json
//! {
//!   "tenant": "acme", "domain": "prod", "hostname": "web-01", "flg_publish": 1,
//!   "fingers": [ { "dbid": 1, "name": "/usr/sbin/sshd", "finger": "9f86…" } ],
//!   "graphs":  [ { "exe": 1, "dlls": [3, 4], "unresolved": 0 } ]
//! }
//! ```

use serde::Serialize;
use std::io::Write;

use crate::domain::{EntryId, ReportError};
use crate::graph::{CatalogEntry, GraphSession};

/// Report header fields taken from the manifest
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub tenant: String,
    pub domain: String,
    pub hostname: String,
    pub publish: bool,
}

/// One fingerprinted file
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Finger {
    pub dbid: u32,
    pub name: String,
    pub finger: String,
}

/// Libraries one executable links against
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphRecord {
    pub exe: u32,
    pub dlls: Vec<u32>,
    /// Declared dependencies that matched no known library
    pub unresolved: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub tenant: String,
    pub domain: String,
    pub hostname: String,
    pub flg_publish: u8,
    pub fingers: Vec<Finger>,
    pub graphs: Vec<GraphRecord>,
}

impl Report {
    /// Serialize a numbered session.
    ///
    /// Every process is listed, with an empty finger if hashing failed;
    /// libraries are listed only once they have a digest, which means some
    /// process linked against them.
    ///
    /// # Errors
    /// Returns [`ReportError::Unnumbered`] if numbering has not run.
    pub fn build(meta: ReportMetadata, session: &GraphSession) -> Result<Self, ReportError> {
        let mut fingers = Vec::with_capacity(session.processes().len());
        for process in session.processes() {
            fingers.push(Finger {
                dbid: id_of(process)?.0,
                name: process.path.clone(),
                finger: process.digest.value().unwrap_or_default().to_string(),
            });
        }
        for library in session.libraries() {
            if let Some(digest) = library.digest.value() {
                fingers.push(Finger {
                    dbid: id_of(library)?.0,
                    name: library.path.clone(),
                    finger: digest.to_string(),
                });
            }
        }

        let libraries = session.libraries();
        let graphs = session
            .processes()
            .iter()
            .map(|process| -> Result<GraphRecord, ReportError> {
                let dlls = process
                    .deps
                    .iter()
                    .map(|&index| id_of(&libraries[index]).map(|id| id.0))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(GraphRecord { exe: id_of(process)?.0, dlls, unresolved: process.unresolved })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tenant: meta.tenant,
            domain: meta.domain,
            hostname: meta.hostname,
            flg_publish: u8::from(meta.publish),
            fingers,
            graphs,
        })
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

fn id_of(entry: &CatalogEntry) -> Result<EntryId, ReportError> {
    entry.id.ok_or_else(|| ReportError::Unnumbered(entry.path.clone()))
}
