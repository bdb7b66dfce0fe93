//! CPU profiling.
//!
//! Sampling is process-wide: only one capture (file-backed or on-demand via
//! the profiling endpoint) can run at a time. Reports are rendered as
//! flamegraph SVGs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pprof::ProfilerGuard;

use crate::observability::diagnostics::DiagnosticsError;

/// Sampling frequency in Hz.
pub const CPU_PROFILE_FREQUENCY: i32 = 100;

/// A running CPU capture that is flushed to its file by [`CpuProfile::finish`].
pub struct CpuProfile {
    path: PathBuf,
    file: File,
    guard: ProfilerGuard<'static>,
}

impl CpuProfile {
    /// Create `path` and start sampling.
    pub fn start(path: &Path) -> Result<Self, DiagnosticsError> {
        let file = File::create(path).map_err(|source| DiagnosticsError::CreateProfile {
            path: path.to_path_buf(),
            source,
        })?;
        let guard = ProfilerGuard::new(CPU_PROFILE_FREQUENCY).map_err(DiagnosticsError::StartProfile)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop sampling and write the report.
    pub fn finish(self) -> Result<(), DiagnosticsError> {
        let mut writer = BufWriter::new(self.file);
        write_flamegraph(&self.guard, &mut writer)?;
        writer.flush().map_err(|source| DiagnosticsError::WriteProfile {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

/// Render what `guard` has sampled so far.
pub fn write_flamegraph<W: Write>(guard: &ProfilerGuard<'_>, writer: W) -> Result<(), DiagnosticsError> {
    let report = guard.report().build().map_err(DiagnosticsError::Report)?;
    report.flamegraph(writer).map_err(DiagnosticsError::Report)
}
