//! PDF metadata extraction.
//!
//! Only page count and byte size are needed. Unreadable input is not an
//! error: it yields zeroed metadata so an upload can still proceed.

use std::io::{Read, Seek, SeekFrom};

use lopdf::Document;

/// Metadata extracted from an uploaded PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub page_count: u32,
    /// Size in bytes.
    pub file_size: u64,
}

/// Extract page count and size from a seekable stream.
///
/// The stream may be positioned anywhere; it is read from the start and left
/// rewound. `declared_len` is used as the size when the stream length cannot
/// be determined.
pub fn extract<R: Read + Seek>(reader: &mut R, declared_len: Option<u64>) -> PdfInfo {
    let info = match read_info(reader, declared_len) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("Could not read PDF metadata: {}", e);
            PdfInfo::default()
        }
    };

    if let Err(e) = reader.seek(SeekFrom::Start(0)) {
        tracing::debug!("Could not rewind PDF stream: {}", e);
    }
    info
}

/// Extract metadata from an in-memory upload.
pub fn extract_bytes(data: &[u8]) -> PdfInfo {
    extract(&mut std::io::Cursor::new(data), Some(data.len() as u64))
}

fn read_info<R: Read + Seek>(
    reader: &mut R,
    declared_len: Option<u64>,
) -> Result<PdfInfo, Box<dyn std::error::Error>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let doc = Document::load_mem(&data)?;
    let page_count = u32::try_from(doc.get_pages().len()).unwrap_or(u32::MAX);

    let file_size = match reader.seek(SeekFrom::End(0)) {
        Ok(len) => len,
        Err(_) => declared_len.unwrap_or(data.len() as u64),
    };

    Ok(PdfInfo {
        page_count,
        file_size,
    })
}

#[cfg(test)]
pub(crate) mod test_pdf {
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a minimal valid PDF with `pages` blank pages.
    pub fn build(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(pages);
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save pdf");
        out
    }
}
