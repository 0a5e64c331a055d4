//! RAII working-directory guard (spec.md §5 shared-resource policy): saved
//! on entry to each TaskList, restored on any exit path including a panic
//! unwind, mirroring [`crate::timer::TaskTimer`]'s `Drop`-based guarantee.

use std::path::PathBuf;

pub struct CwdGuard {
    original: PathBuf,
}

impl CwdGuard {
    pub fn enter() -> std::io::Result<Self> {
        Ok(CwdGuard {
            original: std::env::current_dir()?,
        })
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Err(err) = std::env::set_current_dir(&self.original) {
            tracing::error!(error = %err, path = %self.original.display(), "failed to restore working directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_cwd_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let original = std::env::current_dir().unwrap();
        {
            let _guard = CwdGuard::enter().unwrap();
            std::env::set_current_dir(tmp.path()).unwrap();
            assert_eq!(std::env::current_dir().unwrap(), tmp.path().canonicalize().unwrap());
        }
        assert_eq!(std::env::current_dir().unwrap(), original);
    }
}
