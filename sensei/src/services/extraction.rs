use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// File formats the generation steps can read. Everything else is accepted
/// into storage but excluded from extraction.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "txt", "md"];

pub fn is_supported(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Extract plain text from an uploaded source file, dispatching strictly by
/// the file name suffix. Deterministic and not retried; the caller decides
/// whether to re-run the whole upload+extract cycle.
pub fn extract(file_name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match extension(file_name).as_deref() {
        Some("pdf") => pdf_extract::extract_text_from_mem(bytes)?,
        Some("docx") => extract_docx(bytes)?,
        Some("txt" | "md") => String::from_utf8(bytes.to_vec())?,
        _ => return Err(ExtractError::UnsupportedFormat(file_name.into())),
    };
    match text.trim().is_empty() {
        true => Err(ExtractError::Empty),
        false => Ok(text),
    }
}

/// A docx file is a zip archive; the document text lives in
/// `word/document.xml`. Collect the text nodes and close paragraphs with
/// newlines.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut document = String::new();
    archive
        .by_name("word/document.xml")?
        .read_to_string(&mut document)?;

    let mut reader = Reader::from_str(&document);
    let mut out = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(text) => out.push_str(&text.unescape()?),
            Event::End(end) if end.name().as_ref() == b"w:p" => out.push('\n'),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("no text could be extracted")]
    Empty,
    #[error("could not parse pdf: {0}")]
    Pdf(#[from] pdf_extract::OutputError),
    #[error("could not unpack docx: {0}")]
    DocxArchive(#[from] zip::result::ZipError),
    #[error("could not parse docx: {0}")]
    DocxXml(#[from] quick_xml::Error),
    #[error("file is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn docx_fixture(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_supported_extensions() {
        for name in ["a.pdf", "a.docx", "a.txt", "a.md", "a.TXT", "b.c.Md"] {
            assert!(is_supported(name), "{name} should be supported");
        }
        for name in ["a.png", "a.doc", "archive.zip", "noext", "txt"] {
            assert!(!is_supported(name), "{name} should not be supported");
        }
    }

    #[test]
    fn test_plain_text_decode() {
        assert_eq!(extract("notes.txt", b"hello world").unwrap(), "hello world");
        assert_eq!(extract("notes.md", "# Nadpis\n".as_bytes()).unwrap(), "# Nadpis\n");
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            extract("image.png", b"\x89PNG"),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_empty_extraction() {
        assert!(matches!(extract("empty.txt", b""), Err(ExtractError::Empty)));
        assert!(matches!(
            extract("blank.txt", b"  \n\t "),
            Err(ExtractError::Empty)
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            extract("notes.txt", &[0xff, 0xfe, 0x00]),
            Err(ExtractError::Utf8(_))
        ));
    }

    #[test]
    fn test_docx_extraction() {
        let bytes = docx_fixture(
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>\
             <w:p><w:r><w:t>Fotosynt&#233;za</w:t></w:r></w:p>\
             <w:p><w:r><w:t>druh&#253; odstavec</w:t></w:r></w:p>\
             </w:body></w:document>",
        );
        let text = extract("lecture.docx", &bytes).unwrap();
        assert_eq!(text, "Fotosyntéza\ndruhý odstavec\n");
    }

    #[test]
    fn test_docx_without_document_xml() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("unrelated.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"nope").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(matches!(
            extract("lecture.docx", &bytes),
            Err(ExtractError::DocxArchive(_))
        ));
    }

    #[test]
    fn test_garbage_pdf_fails() {
        assert!(matches!(
            extract("slides.pdf", b"not a pdf"),
            Err(ExtractError::Pdf(_))
        ));
    }
}
