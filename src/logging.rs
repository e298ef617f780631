use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use crate::platform::{NativePlatform, Platform};

/// Writes every formatted line to stdout and, when set, to a log file.
#[derive(Clone)]
pub(crate) struct TeeMakeWriter {
    pub file: Option<Arc<Mutex<File>>>,
}

impl<'a> MakeWriter<'a> for TeeMakeWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            file: self.file.clone(),
        }
    }
}

pub(crate) struct TeeWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            // File errors are dropped; stdout still gets the line.
            let _ = f.write_all(buf);
        }
        std::io::stdout().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.flush();
        }
        std::io::stdout().flush()
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    NativePlatform::restrict_file_permissions(path);
    Ok(file)
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub(crate) fn init(level: tracing::Level, log_file: Option<&Path>) -> Result<()> {
    let file = match log_file {
        Some(path) => Some(Arc::new(Mutex::new(open_log_file(path)?))),
        None => None,
    };
    let make_writer = TeeMakeWriter { file };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(make_writer)
        .with_ansi(log_file.is_none())
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_writes_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run").join("hub.log");
        let writer = TeeMakeWriter {
            file: Some(Arc::new(Mutex::new(open_log_file(&path).unwrap()))),
        };

        let mut w = writer.make_writer();
        w.write_all(b"first line\n").unwrap();
        w.flush().unwrap();
        let mut w = writer.make_writer();
        w.write_all(b"second line\n").unwrap();
        w.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first line\nsecond line\n");
    }

    #[cfg(unix)]
    #[test]
    fn log_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run").join("hub.log");
        open_log_file(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
