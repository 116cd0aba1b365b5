//! Configuration file support.
//!
//! Every setting has a built-in default that reproduces the plain
//! build-install-strip behavior, so no file is required. Files are layered:
//! - Global: `<config dir>/synctool-deploy/config.toml` - user-wide defaults
//! - Project: `deploy.toml` in the project root
//! - Explicit: the file passed with `--config`
//!
//! Later layers take precedence over earlier ones.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineConfig;
use crate::util::context::GlobalContext;

/// Default toolchain driver.
pub const DEFAULT_TOOLCHAIN: &str = "cargo";

/// Default binary target to build and deploy.
pub const DEFAULT_BIN: &str = "synctool";

/// Default symbol-stripping utility.
pub const DEFAULT_STRIP: &str = "strip";

/// Default install directory, relative to the home directory.
pub const DEFAULT_INSTALL_DIR: &str = ".local/bin";

/// Deployment configuration as read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Working context settings
    pub context: ContextConfig,

    /// Build stage settings
    pub build: BuildConfig,

    /// Install stage settings
    pub install: InstallConfig,

    /// Strip stage settings
    pub strip: StripConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Project directory; defaults to the nearest ancestor with a Cargo.toml
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Toolchain driver (e.g. /usr/bin/cargo)
    pub program: Option<PathBuf>,

    /// Binary target name
    pub bin: Option<String>,

    /// Extra arguments appended to the build command
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Deployment target; `~` expands to the home directory
    pub target: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StripConfig {
    /// Symbol-stripping utility (e.g. /usr/bin/llvm-strip)
    pub program: Option<PathBuf>,

    /// Extra arguments placed before the file path
    pub args: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration if the file exists, defaults otherwise.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.is_file() {
            tracing::debug!("loading config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.context.dir.is_some() {
            self.context.dir = other.context.dir;
        }
        if other.build.program.is_some() {
            self.build.program = other.build.program;
        }
        if other.build.bin.is_some() {
            self.build.bin = other.build.bin;
        }
        if !other.build.args.is_empty() {
            self.build.args = other.build.args;
        }
        if other.install.target.is_some() {
            self.install.target = other.install.target;
        }
        if other.strip.program.is_some() {
            self.strip.program = other.strip.program;
        }
        if !other.strip.args.is_empty() {
            self.strip.args = other.strip.args;
        }
    }

    /// Turn the layered file settings into concrete pipeline settings.
    ///
    /// `work_dir` is the resolved working context. Program paths that
    /// contain a separator are anchored there; bare names are looked up in
    /// PATH when the stage runs.
    pub fn resolve(&self, ctx: &GlobalContext, work_dir: &Path) -> Result<PipelineConfig> {
        let bin = self.build.bin.as_deref().unwrap_or(DEFAULT_BIN);
        if bin.is_empty() {
            bail!("`build.bin` must not be empty");
        }

        let toolchain = resolve_program(ctx, work_dir, self.build.program.as_deref(), DEFAULT_TOOLCHAIN)?;
        let strip = resolve_program(ctx, work_dir, self.strip.program.as_deref(), DEFAULT_STRIP)?;

        let target = match &self.install.target {
            Some(target) => ctx.resolve_path(work_dir, target)?,
            None => ctx.home()?.join(DEFAULT_INSTALL_DIR).join(bin),
        };

        Ok(PipelineConfig::new(work_dir, target)
            .with_toolchain(toolchain)
            .with_bin(bin)
            .with_build_args(self.build.args.clone())
            .with_strip_program(strip)
            .with_strip_args(self.strip.args.clone()))
    }
}

fn resolve_program(
    ctx: &GlobalContext,
    work_dir: &Path,
    configured: Option<&Path>,
    default: &str,
) -> Result<PathBuf> {
    let Some(program) = configured else {
        return Ok(PathBuf::from(default));
    };

    if program.as_os_str().is_empty() {
        bail!("program for `{}` must not be empty", default);
    }

    if program.components().count() > 1 {
        Ok(ctx.resolve_path(work_dir, program)?)
    } else {
        Ok(program.to_path_buf())
    }
}

/// Load merged configuration.
///
/// The global and explicit layers are read first because they may move the
/// project directory; the project layer is read from wherever that ends up.
/// Returns the merged config and the resolved working directory.
pub fn load_config(ctx: &GlobalContext, explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    let global = match ctx.global_config_path() {
        Some(path) => Config::load_if_exists(&path)?,
        None => Config::default(),
    };

    let explicit = match explicit {
        Some(path) => Some(Config::load(path)?),
        None => None,
    };

    let mut outer = global.clone();
    if let Some(explicit) = explicit.clone() {
        outer.merge(explicit);
    }

    let work_dir = match &outer.context.dir {
        Some(dir) => ctx.resolve_path(ctx.cwd(), dir)?,
        None => ctx.find_project_root()?,
    };
    if !work_dir.is_dir() {
        bail!("project directory does not exist: {}", work_dir.display());
    }

    let project = Config::load_if_exists(&work_dir.join(crate::util::context::PROJECT_CONFIG))?;

    let mut config = global;
    config.merge(project);
    if let Some(explicit) = explicit {
        config.merge(explicit);
    }

    Ok((config, work_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx_at(cwd: &Path, home: &Path) -> GlobalContext {
        GlobalContext::with_paths(
            cwd.to_path_buf(),
            Some(home.to_path_buf()),
            Some(home.join(".config")),
        )
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            [build]
            program = "/opt/rust/bin/cargo"
            bin = "synctool"
            args = ["--locked"]

            [install]
            target = "~/bin/synctool"

            [strip]
            program = "llvm-strip"
            args = ["--strip-debug"]
            "#,
        )
        .unwrap();

        assert_eq!(config.build.program, Some(PathBuf::from("/opt/rust/bin/cargo")));
        assert_eq!(config.build.args, vec!["--locked"]);
        assert_eq!(config.install.target, Some(PathBuf::from("~/bin/synctool")));
        assert_eq!(config.strip.args, vec!["--strip-debug"]);
        assert!(config.context.dir.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<Config, _> = toml::from_str("[build]\nrelease = false\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_precedence() {
        let mut base = Config::default();
        base.build.bin = Some("a".into());
        base.strip.program = Some("strip".into());

        let mut over = Config::default();
        over.build.bin = Some("b".into());

        base.merge(over);
        assert_eq!(base.build.bin.as_deref(), Some("b"));
        assert_eq!(base.strip.program, Some(PathBuf::from("strip")));
    }

    #[test]
    fn test_resolve_defaults() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        let ctx = ctx_at(tmp.path(), &home);

        let resolved = Config::default().resolve(&ctx, tmp.path()).unwrap();

        assert_eq!(resolved.work_dir, tmp.path());
        assert_eq!(resolved.toolchain, PathBuf::from("cargo"));
        assert_eq!(resolved.bin, "synctool");
        assert_eq!(resolved.strip_program, PathBuf::from("strip"));
        assert_eq!(resolved.target, home.join(".local/bin/synctool"));
        assert!(resolved.build_args.is_empty());
    }

    #[test]
    fn test_resolve_relative_programs() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx_at(tmp.path(), tmp.path());

        let mut config = Config::default();
        config.build.program = Some("tools/cargo".into());
        config.strip.program = Some("llvm-strip".into());
        config.install.target = Some("out/synctool".into());

        let resolved = config.resolve(&ctx, Path::new("/project")).unwrap();
        assert_eq!(resolved.toolchain, PathBuf::from("/project/tools/cargo"));
        assert_eq!(resolved.strip_program, PathBuf::from("llvm-strip"));
        assert_eq!(resolved.target, PathBuf::from("/project/out/synctool"));
    }

    #[test]
    fn test_resolve_rejects_empty_bin() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx_at(tmp.path(), tmp.path());

        let mut config = Config::default();
        config.build.bin = Some(String::new());
        assert!(config.resolve(&ctx, tmp.path()).is_err());
    }

    #[test]
    fn test_load_config_layers() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        let project = tmp.path().join("project");
        std::fs::create_dir_all(home.join(".config/synctool-deploy")).unwrap();
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("Cargo.toml"), "[package]\n").unwrap();

        std::fs::write(
            home.join(".config/synctool-deploy/config.toml"),
            "[strip]\nprogram = \"llvm-strip\"\n[build]\nbin = \"global\"\n",
        )
        .unwrap();
        std::fs::write(project.join("deploy.toml"), "[build]\nbin = \"project\"\n").unwrap();

        let ctx = ctx_at(&project, &home);
        let (config, work_dir) = load_config(&ctx, None).unwrap();

        assert_eq!(work_dir, project);
        assert_eq!(config.build.bin.as_deref(), Some("project"));
        assert_eq!(config.strip.program, Some(PathBuf::from("llvm-strip")));

        let explicit = tmp.path().join("explicit.toml");
        std::fs::write(&explicit, "[build]\nbin = \"explicit\"\n").unwrap();
        let (config, _) = load_config(&ctx, Some(&explicit)).unwrap();
        assert_eq!(config.build.bin.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_load_config_context_dir_override() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("elsewhere");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("deploy.toml"), "[build]\nbin = \"moved\"\n").unwrap();

        let explicit = tmp.path().join("deploy.toml");
        std::fs::write(&explicit, "[context]\ndir = \"elsewhere\"\n").unwrap();

        let ctx = ctx_at(tmp.path(), tmp.path());
        let (config, work_dir) = load_config(&ctx, Some(&explicit)).unwrap();

        assert_eq!(work_dir, project);
        assert_eq!(config.build.bin.as_deref(), Some("moved"));
    }

    #[test]
    fn test_load_config_malformed_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Cargo.toml"), "[package]\n").unwrap();
        std::fs::write(tmp.path().join("deploy.toml"), "[build\n").unwrap();

        let ctx = ctx_at(tmp.path(), tmp.path());
        let err = load_config(&ctx, None).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse config"));
    }

    #[test]
    fn test_load_config_missing_explicit_is_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx_at(tmp.path(), tmp.path());
        assert!(load_config(&ctx, Some(&tmp.path().join("missing.toml"))).is_err());
    }
}
