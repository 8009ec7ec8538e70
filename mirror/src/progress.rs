//! Progress collaborator contract
//!
//! The engine reports each successfully copied file to an explicit progress
//! value passed into the run; callers own any accumulation or display state.

/// Receives one callback per copied file, synchronously, before the engine
/// moves on to the next file. An upload is a copy whose source is local; a
/// download is a copy whose source is a WebDAV share.
pub trait Progress {
    fn on_uploaded(&mut self, filename: &str);
    fn on_downloaded(&mut self, filename: &str);
}

/// Progress sink that discards all events
#[derive(Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn on_uploaded(&mut self, _filename: &str) {}
    fn on_downloaded(&mut self, _filename: &str) {}
}

/// Counts uploads and downloads across one or more runs
#[derive(Debug, Default)]
pub struct CountingProgress {
    pub uploaded: usize,
    pub downloaded: usize,
}

impl Progress for CountingProgress {
    fn on_uploaded(&mut self, _filename: &str) {
        self.uploaded += 1;
    }

    fn on_downloaded(&mut self, _filename: &str) {
        self.downloaded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_progress() {
        let mut progress = CountingProgress::default();
        progress.on_uploaded("a.txt");
        progress.on_uploaded("b.txt");
        progress.on_downloaded("c.txt");
        assert_eq!(progress.uploaded, 2);
        assert_eq!(progress.downloaded, 1);
    }
}
