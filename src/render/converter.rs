//! PDF conversion through an external office suite
//!
//! Runs `<binary> --headless --convert-to pdf --outdir <dir> <file.docx>`,
//! bounded by a timeout. Never fails the render: the outcome is a status.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::{PdfStatus, RenderError};

#[derive(Debug, Clone)]
pub struct ConverterSettings {
    /// Name looked up on PATH, or a path to the executable
    pub binary: String,
    pub timeout: Duration,
    pub enabled: bool,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            binary: "soffice".to_string(),
            timeout: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Resolve the converter executable
pub fn locate_converter(binary: &str) -> Result<PathBuf, RenderError> {
    which::which(binary).map_err(|_| {
        RenderError::MissingDependency(format!("'{}' not found on PATH", binary))
    })
}

/// Delete `path`, treating an already-missing file as success
pub(crate) fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

pub async fn convert_to_pdf(settings: &ConverterSettings, docx: &Path, out_dir: &Path) -> PdfStatus {
    if !settings.enabled {
        return PdfStatus::Disabled;
    }

    let program = match locate_converter(&settings.binary) {
        Ok(path) => path,
        Err(err) => return PdfStatus::Skipped(err),
    };

    let expected = match docx.file_stem() {
        Some(stem) => out_dir.join(stem).with_extension("pdf"),
        None => return PdfStatus::Failed(format!("{} has no file name", docx.display())),
    };

    // A converter can exit 0 without writing; an older PDF must not pass for this run's
    if let Err(e) = remove_if_exists(&expected) {
        return PdfStatus::Failed(format!("could not clear {}: {}", expected.display(), e));
    }

    debug!("Converting {} with {}", docx.display(), program.display());
    let child = Command::new(&program)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(out_dir)
        .arg(docx)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(settings.timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return PdfStatus::Failed(format!("could not run {}: {}", program.display(), e)),
        Err(_) => {
            return PdfStatus::Failed(format!(
                "converter timed out after {}s",
                settings.timeout.as_secs()
            ))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return PdfStatus::Failed(format!(
            "converter exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    if !expected.exists() {
        return PdfStatus::Failed(format!(
            "converter reported success but {} is missing",
            expected.display()
        ));
    }

    info!("Wrote {}", expected.display());
    PdfStatus::Written
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_locate_missing_binary() {
        let result = locate_converter("definitely-not-an-office-suite-4821");
        assert!(matches!(result, Err(RenderError::MissingDependency(_))));
    }

    #[tokio::test]
    async fn test_disabled_converter() {
        let dir = tempdir().unwrap();
        let settings = ConverterSettings {
            enabled: false,
            ..Default::default()
        };
        let status = convert_to_pdf(&settings, &dir.path().join("r.docx"), dir.path()).await;
        assert!(matches!(status, PdfStatus::Disabled));
    }

    #[tokio::test]
    async fn test_missing_converter_is_skipped() {
        let dir = tempdir().unwrap();
        let settings = ConverterSettings {
            binary: "definitely-not-an-office-suite-4821".into(),
            ..Default::default()
        };
        let status = convert_to_pdf(&settings, &dir.path().join("r.docx"), dir.path()).await;
        assert!(matches!(status, PdfStatus::Skipped(RenderError::MissingDependency(_))));
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.pdf");
        remove_if_exists(&path).unwrap();
        std::fs::write(&path, b"x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_fake_converter_writes_pdf() {
            let dir = tempdir().unwrap();
            let bin = script(
                dir.path(),
                "fake-soffice",
                r#"out=""; src=""
while [ $# -gt 0 ]; do
  case "$1" in
    --outdir) out="$2"; shift 2 ;;
    --*|pdf) shift ;;
    *) src="$1"; shift ;;
  esac
done
name=$(basename "$src" .docx)
printf '%%PDF-1.4\n' > "$out/$name.pdf""#,
            );
            let docx = dir.path().join("report_x.docx");
            std::fs::write(&docx, b"PK").unwrap();

            let settings = ConverterSettings {
                binary: bin.to_string_lossy().into_owned(),
                timeout: Duration::from_secs(10),
                enabled: true,
            };
            let status = convert_to_pdf(&settings, &docx, dir.path()).await;
            assert!(matches!(status, PdfStatus::Written));
            assert!(dir.path().join("report_x.pdf").exists());
        }

        #[tokio::test]
        async fn test_silent_converter_does_not_reuse_old_pdf() {
            let dir = tempdir().unwrap();
            let bin = script(dir.path(), "silent-soffice", "exit 0");
            let docx = dir.path().join("report_x.docx");
            std::fs::write(&docx, b"PK").unwrap();
            std::fs::write(dir.path().join("report_x.pdf"), b"%PDF-old").unwrap();

            let settings = ConverterSettings {
                binary: bin.to_string_lossy().into_owned(),
                timeout: Duration::from_secs(10),
                enabled: true,
            };
            let status = convert_to_pdf(&settings, &docx, dir.path()).await;
            match status {
                PdfStatus::Failed(reason) => assert!(reason.contains("missing")),
                other => panic!("expected failure, got {:?}", other),
            }
            assert!(!dir.path().join("report_x.pdf").exists());
        }

        #[tokio::test]
        async fn test_failing_converter() {
            let dir = tempdir().unwrap();
            let bin = script(dir.path(), "broken-soffice", "echo boom >&2; exit 3");
            let settings = ConverterSettings {
                binary: bin.to_string_lossy().into_owned(),
                timeout: Duration::from_secs(10),
                enabled: true,
            };
            let status = convert_to_pdf(&settings, &dir.path().join("r.docx"), dir.path()).await;
            match status {
                PdfStatus::Failed(reason) => assert!(reason.contains("boom")),
                other => panic!("expected failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_converter_timeout() {
            let dir = tempdir().unwrap();
            let bin = script(dir.path(), "slow-soffice", "sleep 5");
            let settings = ConverterSettings {
                binary: bin.to_string_lossy().into_owned(),
                timeout: Duration::from_millis(200),
                enabled: true,
            };
            let status = convert_to_pdf(&settings, &dir.path().join("r.docx"), dir.path()).await;
            match status {
                PdfStatus::Failed(reason) => assert!(reason.contains("timed out")),
                other => panic!("expected timeout, got {:?}", other),
            }
        }
    }
}
