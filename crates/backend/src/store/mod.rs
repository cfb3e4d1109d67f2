//! On-disk JSON document store.
//!
//! Layout under the root:
//!
//! ```text
//! stream_index.json
//! <stream_id>-<stream>/<hash><topic>.json
//! ```
//!
//! Every document is written whole: serialized to a temp file next to the
//! target, then persisted over it.

mod index;
pub mod sanitize;
mod topic;

use std::{
  fs::{self, File},
  io::{BufReader, BufWriter, ErrorKind, Write},
  path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use tracing::trace;

pub use index::{StreamEntry, StreamIndex, TIME_FORMAT, TopicSummary};
pub use topic::{MergeOutcome, TopicStore, merge_messages};

use crate::{
  domain::message::StreamDescriptor,
  error::{ArchiveError, Result},
};
use sanitize::{sanitize_stream, sanitize_topic};

pub const INDEX_FILE: &str = "stream_index.json";

/// Handle on a storage root. Cheap to clone; holds no open files.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
  root: PathBuf,
}

impl ArchiveStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn index_path(&self) -> PathBuf {
    self.root.join(INDEX_FILE)
  }

  pub fn stream_dir(&self, stream: &StreamDescriptor) -> PathBuf {
    self.root.join(sanitize_stream(&stream.name, stream.stream_id))
  }

  pub fn topic_path(&self, stream: &StreamDescriptor, topic: &str) -> PathBuf {
    self
      .stream_dir(stream)
      .join(format!("{}.json", sanitize_topic(topic)))
  }

  /// The Topic Store for one (stream, topic) pair.
  pub fn topic(&self, stream: &StreamDescriptor, topic: &str) -> TopicStore {
    TopicStore::new(self.topic_path(stream, topic))
  }
}

/// Read a JSON document, or `None` if the file does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
  let file = match File::open(path) {
    Ok(file) => file,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(ArchiveError::io(path, e)),
  };
  let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| ArchiveError::json(path, e))?;
  Ok(Some(value))
}

/// Replace `path` with the JSON encoding of `value`, creating the parent directory if needed.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
  let dir = path.parent().unwrap_or_else(|| Path::new("."));
  fs::create_dir_all(dir).map_err(|e| ArchiveError::io(dir, e))?;

  let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ArchiveError::io(dir, e))?;
  {
    let mut writer = BufWriter::new(tmp.as_file_mut());
    serde_json::to_writer(&mut writer, value).map_err(|e| ArchiveError::json(path, e))?;
    writer.flush().map_err(|e| ArchiveError::io(path, e))?;
  }
  tmp.as_file().sync_all().map_err(|e| ArchiveError::io(path, e))?;
  tmp.persist(path).map_err(|e| ArchiveError::io(path, e.error))?;

  trace!(path = %path.display(), "Wrote document");
  Ok(())
}
