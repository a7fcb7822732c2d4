use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::pipeline::DataSource;

/// Line-oriented JSON source: each non-blank line is one reading record,
/// decoded independently. A line that fails to decode is logged and
/// skipped; it never terminates the stream. At most one raw line is held
/// in memory at a time, so the source is suitable for very large files.
pub struct FileDataSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl FileDataSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(FileDataSource {
            lines: BufReader::new(file).lines(),
            path,
        })
    }
}

impl DataSource for FileDataSource {
    fn next_record(&mut self) -> Option<serde_json::Value> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(error) => {
                    warn!(path = %self.path.display(), %error, "read failed, stopping source");
                    return None;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => return Some(record),
                Err(error) => {
                    warn!(%error, line, "skipping undecodable line");
                }
            }
        }
    }
}
