//! Install stage: copy the release artifact to the deployment target.

use crate::pipeline::error::StageError;
use crate::pipeline::stage::{Deployed, Stage, StageContext, StageData, StageKind};
use crate::util::fs::{atomic_copy, follow_symlinks};
use crate::util::hash::sha256_file;
use crate::util::shell::Status;

/// Copies the artifact over the deployment target.
///
/// The target is replaced by rename, so a failed install leaves whatever
/// was deployed before in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstallStage;

impl Stage for InstallStage {
    fn kind(&self) -> StageKind {
        StageKind::Install
    }

    fn describe(&self, cx: &StageContext<'_>) -> String {
        format!(
            "install {} {}",
            cx.config.conventional_artifact().display(),
            cx.config.target.display()
        )
    }

    fn run(&self, cx: &StageContext<'_>, data: &mut StageData) -> Result<(), StageError> {
        let artifact = data.artifact()?;
        let target = &cx.config.target;

        cx.shell.trace(format!(
            "install {} {}",
            artifact.path.display(),
            target.display()
        ));
        cx.shell.status(Status::Installing, target.display());

        // A symlinked target keeps its link; the file behind it is replaced.
        let installed = follow_symlinks(target)?;
        if installed != *target {
            tracing::debug!("{} links to {}", target.display(), installed.display());
        }

        let source_sha = sha256_file(&artifact.path)?;
        let size = atomic_copy(&artifact.path, &installed)?;

        let installed_sha = sha256_file(&installed)?;
        if installed_sha != source_sha {
            return Err(StageError::ChecksumMismatch { path: installed });
        }

        tracing::debug!("installed {} ({} bytes, sha256 {})", installed.display(), size, installed_sha);

        data.deployed = Some(Deployed {
            path: installed,
            size,
            sha256: installed_sha,
            stripped_size: None,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::Artifact;
    use crate::pipeline::PipelineConfig;
    use crate::test_support::quiet_shell;
    use std::fs;
    use tempfile::TempDir;

    fn data_with_artifact(path: std::path::PathBuf) -> StageData {
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        StageData {
            artifact: Some(Artifact { path, size }),
            deployed: None,
        }
    }

    #[test]
    fn test_install_overwrites_target() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("synctool");
        let target = tmp.path().join("home/.local/bin/synctool");
        fs::write(&artifact, "new build").unwrap();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "previous deploy").unwrap();

        let config = PipelineConfig::new(tmp.path(), &target);
        let shell = quiet_shell();
        let cx = StageContext::new(&config, &shell);
        let mut data = data_with_artifact(artifact.clone());

        InstallStage.run(&cx, &mut data).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new build");
        let deployed = data.deployed.unwrap();
        assert_eq!(deployed.path, target);
        assert_eq!(deployed.size, 9);
        assert_eq!(deployed.sha256, sha256_file(&artifact).unwrap());
        assert!(deployed.stripped_size.is_none());
        // The artifact stays where the build put it.
        assert!(artifact.exists());
    }

    #[test]
    fn test_install_missing_artifact_leaves_target() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("synctool");
        fs::write(&target, "previous deploy").unwrap();

        let config = PipelineConfig::new(tmp.path(), &target);
        let shell = quiet_shell();
        let cx = StageContext::new(&config, &shell);
        let mut data = data_with_artifact(tmp.path().join("target/release/synctool"));

        let err = InstallStage.run(&cx, &mut data).unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(fs::read(&target).unwrap(), b"previous deploy");
        assert!(data.deployed.is_none());
    }

    #[test]
    fn test_install_without_build_output() {
        let tmp = TempDir::new().unwrap();
        let config = PipelineConfig::new(tmp.path(), tmp.path().join("synctool"));
        let shell = quiet_shell();
        let cx = StageContext::new(&config, &shell);

        let err = InstallStage.run(&cx, &mut StageData::default()).unwrap_err();
        assert!(matches!(err, StageError::MissingInput { .. }));
    }

    #[test]
    fn test_install_target_is_directory() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("artifact");
        fs::write(&artifact, "bin").unwrap();
        let target = tmp.path().join("occupied");
        fs::create_dir_all(target.join("child")).unwrap();

        let config = PipelineConfig::new(tmp.path(), &target);
        let shell = quiet_shell();
        let cx = StageContext::new(&config, &shell);

        let err = InstallStage
            .run(&cx, &mut data_with_artifact(artifact))
            .unwrap_err();
        assert!(err.to_string().contains("failed to replace"));
        assert!(target.join("child").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_install_through_symlinked_target() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("artifact");
        let real = tmp.path().join("opt/synctool");
        let target = tmp.path().join("bin/synctool");
        fs::write(&artifact, "new build").unwrap();
        fs::create_dir_all(real.parent().unwrap()).unwrap();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&real, "previous deploy").unwrap();
        symlink(&real, &target).unwrap();

        let config = PipelineConfig::new(tmp.path(), &target);
        let shell = quiet_shell();
        let cx = StageContext::new(&config, &shell);
        let mut data = data_with_artifact(artifact);

        InstallStage.run(&cx, &mut data).unwrap();

        assert!(fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&real).unwrap(), b"new build");
        assert_eq!(data.deployed.unwrap().path, real);
    }
}
