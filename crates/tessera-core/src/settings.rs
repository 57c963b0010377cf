// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Named, skippable sections of a settings stream.
//!
//! A settings stream is a flat sequence of sections laid out as
//! `[name][endOffset: i64][payload]`, where `endOffset` is the absolute offset of the
//! first byte after the payload. A reader that does not recognise a section name
//! jumps straight to `endOffset`; a consumer that reads past it has corrupted the
//! stream and raises [`StructuralError::SectionOverrun`].

use crate::error::{StreamError, StructuralError};
use crate::stream::{ByteReader, ByteWriter};

/// What a section visitor did with the section it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    /// The visitor recognised and consumed the section.
    Consumed,
    /// The visitor does not know this section; it is skipped.
    Unknown,
}

/// Appends one section to `out`, letting `body` write the payload.
///
/// The end offset is written as a placeholder and back-patched once `body` returns.
pub fn write_section<F>(out: &mut ByteWriter, name: &str, body: F) -> Result<(), StructuralError>
where
    F: FnOnce(&mut ByteWriter) -> Result<(), StructuralError>,
{
    out.write_str(name);
    let placeholder = out.position();
    out.write_i64(0);
    body(out)?;
    let end = out.position() as i64;
    out.patch_i64(placeholder, end);
    Ok(())
}

/// Walks every section of `data`, handing each payload to `visit`.
///
/// The visitor receives a reader fenced to the section's payload. Sections reported
/// as [`SectionStatus::Unknown`] are skipped; bytes a consumer leaves unread are
/// skipped as well.
pub fn read_sections<F>(data: &[u8], mut visit: F) -> Result<(), StructuralError>
where
    F: FnMut(&str, &mut ByteReader<'_>) -> Result<SectionStatus, StructuralError>,
{
    let mut reader = ByteReader::new(data);
    while !reader.is_empty() {
        let name = reader.read_str()?;
        let end_offset = reader.read_i64()?;
        let start = reader.position();
        if end_offset < start as i64 || end_offset > data.len() as i64 {
            return Err(StructuralError::CorruptSection {
                section: name,
                end_offset,
            });
        }

        let mut payload = reader.limited(end_offset as usize - start)?;
        match visit(&name, &mut payload) {
            Ok(SectionStatus::Consumed) => {
                if !payload.is_empty() {
                    log::debug!(
                        "Settings section '{name}' left {} bytes unread",
                        payload.remaining()
                    );
                }
            }
            Ok(SectionStatus::Unknown) => {
                log::debug!("Skipping unknown settings section '{name}'");
            }
            Err(StructuralError::Stream(StreamError::UnexpectedEof { .. })) => {
                return Err(StructuralError::SectionOverrun { section: name });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sections_are_skipped() {
        let mut out = ByteWriter::new();
        write_section(&mut out, "mystery", |w| {
            w.write_u64(99);
            w.write_str("ignored");
            Ok(())
        })
        .unwrap();
        write_section(&mut out, "known", |w| {
            w.write_u32(5);
            Ok(())
        })
        .unwrap();

        let mut seen = Vec::new();
        read_sections(out.as_slice(), |name, input| {
            if name == "known" {
                seen.push(input.read_u32()?);
                Ok(SectionStatus::Consumed)
            } else {
                Ok(SectionStatus::Unknown)
            }
        })
        .unwrap();

        assert_eq!(seen, vec![5]);
    }

    #[test]
    fn test_consumer_reading_past_section_end_is_fatal() {
        let mut out = ByteWriter::new();
        write_section(&mut out, "short", |w| {
            w.write_u32(1);
            Ok(())
        })
        .unwrap();
        write_section(&mut out, "next", |_| Ok(())).unwrap();

        let result = read_sections(out.as_slice(), |_, input| {
            input.read_u64()?;
            Ok(SectionStatus::Consumed)
        });

        assert_eq!(
            result,
            Err(StructuralError::SectionOverrun {
                section: "short".to_string()
            })
        );
    }

    #[test]
    fn test_end_offset_beyond_stream_is_corrupt() {
        let mut out = ByteWriter::new();
        out.write_str("broken");
        out.write_i64(10_000);

        let result = read_sections(out.as_slice(), |_, _| Ok(SectionStatus::Consumed));
        assert!(matches!(
            result,
            Err(StructuralError::CorruptSection { .. })
        ));
    }
}
