use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use super::{MetricsSink, Scalar};
use crate::Result;

/// The name of the scalars file inside the log directory.
pub const SCALARS_FILE: &str = "scalars.jsonl";

/// Writes every scalar as a JSON object on its own line of `<log_dir>/scalars.jsonl`.
///
/// The file belongs to a single run: creating the sink truncates what a previous run left.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Creates a new `JsonlSink`, creating `log_dir` if it doesn't exist.
    ///
    /// # Arguments
    /// * `log_dir` - The directory to write the scalars file in.
    ///
    /// # Returns
    /// A new `JsonlSink` or an io error if the directory or file couldn't be opened.
    pub fn create<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        fs::create_dir_all(&log_dir)?;
        let path = log_dir.as_ref().join(SCALARS_FILE);
        let file = File::create(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for JsonlSink {
    fn add_scalar(&mut self, series: &str, value: f32, step: usize) -> Result<()> {
        let scalar = Scalar {
            series: series.to_string(),
            step,
            value,
        };

        serde_json::to_writer(&mut self.writer, &scalar)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let mut sink = JsonlSink::create(&log_dir).unwrap();
        sink.add_scalar("loss/train", 0.5, 0).unwrap();
        sink.add_scalar("acc/dev", 0.75, 100).unwrap();
        sink.flush().unwrap();

        let content = fs::read_to_string(log_dir.join(SCALARS_FILE)).unwrap();
        let scalars: Vec<Scalar> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(scalars.len(), 2);
        assert_eq!(scalars[1].series, "acc/dev");
        assert_eq!(scalars[1].step, 100);
        assert_eq!(scalars[1].value, 0.75);
    }

    #[test]
    fn a_new_run_replaces_the_previous_scalars() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = JsonlSink::create(dir.path()).unwrap();
        first.add_scalar("loss/dev", 0.9, 0).unwrap();
        first.add_scalar("loss/dev", 0.8, 100).unwrap();
        first.flush().unwrap();

        let mut second = JsonlSink::create(dir.path()).unwrap();
        second.add_scalar("loss/dev", 0.7, 0).unwrap();
        second.flush().unwrap();

        let content = fs::read_to_string(second.path()).unwrap();
        let scalars: Vec<Scalar> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(scalars.len(), 1);
        assert_eq!(scalars[0].value, 0.7);
    }
}
