//! Test fixtures: quiet shells and fake toolchains.
//!
//! The fake `cargo` writes a "binary" carrying [`DEBUG_PADDING`] and reports
//! it on stdout the way cargo's JSON message format does. The fake `strip`
//! rewrites its last argument without the padding.

use std::fs;
use std::path::{Path, PathBuf};

use crate::util::shell::{ColorChoice, Shell, Verbosity};

/// Stand-in for a debug section in fake binaries.
pub const DEBUG_PADDING: &str = "DEBUG-INFO-SECTION-0123456789abcdef0123456789abcdef";

/// A shell that prints nothing but errors and command traces.
pub fn quiet_shell() -> Shell {
    Shell::new(Verbosity::Quiet, ColorChoice::Never)
}

/// Write an executable `sh` script named `name` into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}

/// A fake cargo that builds `bin` under `project/target/release`.
pub fn fake_cargo(project: &Path, bin: &str) -> PathBuf {
    let out_dir = project.join("target").join("release");
    let artifact = out_dir.join(bin);
    let body = format!(
        r#"set -e
mkdir -p '{out_dir}'
printf 'synctool-binary\n{padding}\n' > '{artifact}'
chmod 755 '{artifact}'
echo '{{"reason":"compiler-artifact","target":{{"name":"{bin}","kind":["bin"]}},"executable":"{artifact}"}}'
echo '{{"reason":"build-finished","success":true}}'
"#,
        out_dir = out_dir.display(),
        artifact = artifact.display(),
        padding = DEBUG_PADDING,
        bin = bin,
    );
    write_script(project, "fake-cargo", &body)
}

/// A fake cargo that prints a diagnostic and exits with `code`.
pub fn fake_cargo_failing(dir: &Path, code: i32) -> PathBuf {
    write_script(
        dir,
        "broken-cargo",
        &format!("echo 'error[E0425]: cannot find value' >&2\nexit {}\n", code),
    )
}

/// A fake strip that drops the debug padding from its last argument.
pub fn fake_strip(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-strip",
        "for f; do :; done\nprintf 'synctool-binary\\n' > \"$f\"\n",
    )
}

/// A fake strip that rejects its input and exits with `code`.
pub fn fake_strip_failing(dir: &Path, code: i32) -> PathBuf {
    write_script(
        dir,
        "broken-strip",
        &format!("echo \"strip: $1: file format not recognized\" >&2\nexit {}\n", code),
    )
}
