use std::{
    fmt,
    io::{Read, Seek, SeekFrom, Stdout},
};

use pbr::ProgressBar;

const UPDATE_INTERVAL: u64 = 1024 * 1024 * 10;

/// Reader that mirrors its stream position into a progress bar.
///
/// Seeks are forwarded, so container readers that jump to the point
/// records still report the byte offset they have reached.
pub struct ProgressReader<R: Read + Seek> {
    inner: R,
    pb: Option<ProgressBar<Stdout>>,
    position: u64,
    reported: u64,
}

impl<R: Read + Seek> ProgressReader<R> {
    pub fn new(inner: R, total_bytes: u64, message: &str) -> Self {
        let mut pb = ProgressBar::new(total_bytes);
        pb.set_units(pbr::Units::Bytes);
        pb.message(message);
        Self {
            inner,
            pb: Some(pb),
            position: 0,
            reported: 0,
        }
    }

    /// Passes reads through without drawing anything.
    pub fn silent(inner: R) -> Self {
        Self {
            inner,
            pb: None,
            position: 0,
            reported: 0,
        }
    }

    fn report(&mut self) {
        if let Some(pb) = &mut self.pb {
            if self.position.abs_diff(self.reported) >= UPDATE_INTERVAL {
                pb.set(self.position);
                self.reported = self.position;
            }
        }
    }
}

impl<R: Read + Seek> Drop for ProgressReader<R> {
    fn drop(&mut self) {
        if let Some(pb) = &mut self.pb {
            pb.set(self.position);
            pb.finish_println("done!\n");
        }
    }
}

impl<R: Read + Seek> fmt::Debug for ProgressReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReader")
            .field("position", &self.position)
            .field("visible", &self.pb.is_some())
            .finish()
    }
}

impl<R: Read + Seek> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        self.report();
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for ProgressReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.position = self.inner.seek(pos)?;
        self.report();
        Ok(self.position)
    }
}
