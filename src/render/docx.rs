//! `.docx` writer
//!
//! Lays the document model out with `docx-rs` and packs it into a temp
//! file next to the target, then renames it into place.

use docx_rs::{Docx, Paragraph, Run};
use std::path::Path;

use super::document::{Block, DocumentModel};
use super::RenderError;

// Half-points
const TITLE_SIZE: usize = 32;
const HEADING_SIZE: usize = 24;
const BODY_SIZE: usize = 20;
const FOOTER_SIZE: usize = 16;

pub fn write_docx(model: &DocumentModel, path: &Path) -> Result<(), RenderError> {
    let dir = path
        .parent()
        .ok_or_else(|| RenderError::Document(format!("{} has no parent directory", path.display())))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".report_")
        .suffix(".docx.tmp")
        .tempfile_in(dir)?;

    build_docx(model)
        .build()
        .pack(tmp.as_file_mut())
        .map_err(|e| RenderError::Document(e.to_string()))?;

    tmp.persist(path).map_err(|e| RenderError::Io(e.error))?;
    Ok(())
}

fn build_docx(model: &DocumentModel) -> Docx {
    model
        .blocks
        .iter()
        .fold(Docx::new(), |docx, block| docx.add_paragraph(paragraph(block)))
}

fn paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Title(text) => Paragraph::new().add_run(Run::new().add_text(text).bold().size(TITLE_SIZE)),
        Block::Heading(text) => {
            Paragraph::new().add_run(Run::new().add_text(text).bold().size(HEADING_SIZE))
        }
        Block::Field { label, value } => Paragraph::new()
            .add_run(Run::new().add_text(format!("{}: ", label)).bold().size(BODY_SIZE))
            .add_run(Run::new().add_text(value).size(BODY_SIZE)),
        Block::Bullet(text) => {
            Paragraph::new().add_run(Run::new().add_text(format!("\u{2022} {}", text)).size(BODY_SIZE))
        }
        Block::Paragraph(text) => Paragraph::new().add_run(Run::new().add_text(text).size(BODY_SIZE)),
        Block::Footer(text) => {
            Paragraph::new().add_run(Run::new().add_text(text).italic().size(FOOTER_SIZE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn sample() -> DocumentModel {
        DocumentModel {
            blocks: vec![
                Block::Title("Report".into()),
                Block::Heading("1. Summary".into()),
                Block::Field {
                    label: "Identifier".into(),
                    value: "0xabc".into(),
                },
                Block::Bullet("one".into()),
                Block::Footer("Generated 2024-01-01 00:00:00 UTC".into()),
            ],
        }
    }

    #[test]
    fn test_write_docx_creates_zip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report_0xabc.docx");
        write_docx(&sample(), &path).unwrap();

        let mut magic = [0u8; 2];
        std::fs::File::open(&path).unwrap().read_exact(&mut magic).unwrap();
        assert_eq!(&magic, b"PK");
    }

    #[test]
    fn test_write_docx_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report_x.docx");
        write_docx(&sample(), &path).unwrap();
        write_docx(&sample(), &path).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["report_x.docx".to_string()]);
    }

    #[test]
    fn test_write_docx_missing_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("report.docx");
        assert!(matches!(write_docx(&sample(), &path), Err(RenderError::Io(_))));
    }
}
