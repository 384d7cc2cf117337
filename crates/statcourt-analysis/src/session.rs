use std::path::{Path, PathBuf};

/// Output locations for one analysis run.
///
/// Every report and plot of a run lives under a single results directory, so
/// concurrent runs stay isolated as long as they use distinct directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    results_dir: PathBuf,
}

impl Session {
    pub const REPORT_FILE_NAME: &str = "report.html";
    pub const PLOT_DIR_NAME: &str = "plots";

    pub fn new<P>(results_dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            results_dir: results_dir.into(),
        }
    }

    #[must_use]
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.results_dir.join(Self::REPORT_FILE_NAME)
    }

    #[must_use]
    pub fn plot_dir(&self) -> PathBuf {
        self.results_dir.join(Self::PLOT_DIR_NAME)
    }

    #[must_use]
    pub fn plot_path(&self, file_name: &str) -> PathBuf {
        self.plot_dir().join(file_name)
    }
}
