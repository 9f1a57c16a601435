//! ZIP container plumbing: opening parts for the streaming parsers and
//! emitting parts on the write side. Exactly one entry is open at a time;
//! the borrow on the archive enforces it.

use std::io::{BufReader, Read, Seek, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::xml::{DriveStatus, XmlDriver, XmlHandler};
use crate::{Result, XlsxError};

/// Parts are streamed through the XML driver in chunks of this size.
const PART_BUFFER_SIZE: usize = 8 * 1024;

/// Read side of an XLSX package.
#[derive(Debug)]
pub struct XlsxPackage<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> XlsxPackage<R> {
    pub fn open(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|entry| entry == name)
    }

    /// Open `name` and run `handler` over it to completion.
    pub fn drive_part<H: XmlHandler>(&mut self, name: &str, handler: &mut H) -> Result<DriveStatus> {
        let mut stream = self.open_part(name)?;
        stream.drive_to_end(handler)
    }

    /// Open `name` for a suspendable scan. The stream holds the entry open
    /// until dropped.
    pub fn open_part(&mut self, name: &str) -> Result<PartStream<'_>> {
        let file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(XlsxError::binder(format!("no {name} found in xlsx file")));
            }
            Err(err) => return Err(err.into()),
        };
        let entry_len = file.size();
        let consumed = Arc::new(AtomicU64::new(0));
        let counting = CountingReader {
            inner: Box::new(file) as Box<dyn Read + '_>,
            consumed: Arc::clone(&consumed),
        };
        Ok(PartStream {
            driver: XmlDriver::new(BufReader::with_capacity(PART_BUFFER_SIZE, counting)),
            entry_len,
            consumed,
        })
    }
}

struct CountingReader<R> {
    inner: R,
    consumed: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// One open ZIP entry wired into an [`XmlDriver`].
pub struct PartStream<'a> {
    driver: XmlDriver<BufReader<CountingReader<Box<dyn Read + 'a>>>>,
    entry_len: u64,
    consumed: Arc<AtomicU64>,
}

impl PartStream<'_> {
    pub fn drive<H: XmlHandler>(&mut self, handler: &mut H) -> Result<DriveStatus> {
        self.driver.drive(handler)
    }

    pub fn drive_to_end<H: XmlHandler>(&mut self, handler: &mut H) -> Result<DriveStatus> {
        self.driver.drive_to_end(handler)
    }

    /// Uncompressed size of the open entry.
    pub fn entry_len(&self) -> u64 {
        self.entry_len
    }

    /// Shared counter of bytes consumed from the entry so far. Written by
    /// the scanning thread, readable from an observer thread.
    pub fn consumed_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.consumed)
    }
}

/// Write side: sequential part emission into a fresh ZIP archive.
pub struct PartWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> PartWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            zip: ZipWriter::new(sink),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        self.zip.add_directory(name, self.options)?;
        Ok(())
    }

    pub fn begin_file(&mut self, name: &str) -> Result<()> {
        self.zip.start_file(name, self.options)?;
        Ok(())
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.zip.write_all(bytes)?;
        Ok(())
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.write(text.as_bytes())
    }

    /// Close the archive and hand the sink back.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use quick_xml::events::attributes::Attributes;

    use crate::xml::XmlControl;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = PartWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            writer.begin_file(name).unwrap();
            writer.write(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[derive(Default)]
    struct TagCounter {
        tags: usize,
    }

    impl XmlHandler for TagCounter {
        fn on_start(
            &mut self,
            _ctl: &mut XmlControl,
            _name: &[u8],
            _attrs: Attributes<'_>,
        ) -> Result<()> {
            self.tags += 1;
            Ok(())
        }

        fn on_end(&mut self, _ctl: &mut XmlControl, _name: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn drive_part_runs_handler_over_entry() {
        let bytes = build_zip(&[("part.xml", b"<a><b/><b/></a>")]);
        let mut package = XlsxPackage::open(Cursor::new(bytes)).unwrap();
        assert!(package.has_part("part.xml"));
        assert!(!package.has_part("missing.xml"));

        let mut counter = TagCounter::default();
        let status = package.drive_part("part.xml", &mut counter).unwrap();
        assert_eq!(status, DriveStatus::Finished);
        assert_eq!(counter.tags, 3);
    }

    #[test]
    fn missing_part_is_a_binder_error() {
        let bytes = build_zip(&[("part.xml", b"<a/>")]);
        let mut package = XlsxPackage::open(Cursor::new(bytes)).unwrap();
        let mut counter = TagCounter::default();
        let err = package.drive_part("other.xml", &mut counter).unwrap_err();
        assert!(matches!(err, XlsxError::Binder(_)), "got {err:?}");
    }

    #[test]
    fn part_stream_reports_consumed_bytes() {
        let payload = b"<a><b/><b/><b/></a>";
        let bytes = build_zip(&[("part.xml", payload)]);
        let mut package = XlsxPackage::open(Cursor::new(bytes)).unwrap();

        let mut stream = package.open_part("part.xml").unwrap();
        assert_eq!(stream.entry_len(), payload.len() as u64);
        let consumed = stream.consumed_handle();

        let mut counter = TagCounter::default();
        stream.drive_to_end(&mut counter).unwrap();
        assert_eq!(consumed.load(Ordering::Relaxed), payload.len() as u64);
    }
}
