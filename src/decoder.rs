//! Record decoding.
//!
//! A settings file is a sequence of fixed-size records, one per module. Each record
//! is sliced into fields following an [`AddressMap`]; every field is a run of
//! little-endian 32-bit words.

use crate::error::{DecodeError, DecodeResult};
use crate::layout::AddressMap;
use bytes::Buf;
use serde::Serialize;
use std::io::{ErrorKind, Read};

/// Value of one decoded field.
///
/// Fields declared one word long are unwrapped to a scalar; all other lengths,
/// including zero, keep the word sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(u32),
    Words(Vec<u32>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<u32> {
        match self {
            FieldValue::Scalar(value) => Some(*value),
            FieldValue::Words(_) => None,
        }
    }

    pub fn as_words(&self) -> Option<&[u32]> {
        match self {
            FieldValue::Scalar(_) => None,
            FieldValue::Words(words) => Some(words),
        }
    }
}

/// Fields of one record in layout order, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    fields: Vec<(String, FieldValue)>,
}

impl FlatRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for FlatRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Decodes one complete record.
///
/// `record` is the zero-based record index, used for error reporting.
pub fn decode_chunk(map: &AddressMap, chunk: &[u8], record: usize) -> DecodeResult<FlatRecord> {
    let expected = map.record_bytes();
    if chunk.len() < expected {
        return Err(DecodeError::Truncated {
            record,
            expected,
            actual: chunk.len(),
        });
    }

    let mut buf = &chunk[..expected];
    let mut fields = Vec::with_capacity(map.len());
    for (name, length) in map.iter() {
        let value = if length == 1 {
            FieldValue::Scalar(buf.get_u32_le())
        } else {
            FieldValue::Words((0..length).map(|_| buf.get_u32_le()).collect())
        };
        fields.push((name.to_string(), value));
    }
    debug_assert!(!buf.has_remaining());

    Ok(FlatRecord { fields })
}

/// Streams flat records out of a settings file.
///
/// Iteration ends cleanly when the reader is exhausted on a record boundary. A
/// partial trailing record yields [`DecodeError::Truncated`] and ends iteration.
pub struct RecordDecoder<'a, R> {
    reader: R,
    map: &'a AddressMap,
    chunk: Vec<u8>,
    record: usize,
    finished: bool,
}

impl<'a, R: Read> RecordDecoder<'a, R> {
    pub fn new(reader: R, map: &'a AddressMap) -> Self {
        Self {
            reader,
            map,
            chunk: vec![0; map.record_bytes()],
            record: 0,
            finished: false,
        }
    }

    /// Number of records decoded so far.
    pub fn records_read(&self) -> usize {
        self.record
    }

    /// Fills the chunk buffer, returning the number of bytes read. Stops early
    /// only at end of stream.
    fn fill_chunk(&mut self) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < self.chunk.len() {
            match self.reader.read(&mut self.chunk[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for RecordDecoder<'_, R> {
    type Item = DecodeResult<FlatRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let filled = match self.fill_chunk() {
            Ok(filled) => filled,
            Err(e) => {
                self.finished = true;
                return Some(Err(e.into()));
            }
        };

        if filled == 0 {
            self.finished = true;
            return None;
        }

        let result = decode_chunk(self.map, &self.chunk[..filled], self.record);
        match &result {
            Ok(_) => {
                tracing::trace!(record = self.record, bytes = filled, "Decoded record");
                self.record += 1;
            }
            Err(_) => self.finished = true,
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutEntry, LayoutResolver};
    use std::io::Cursor;

    fn encode(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn scenario_map() -> AddressMap {
        LayoutResolver::new(10, 4)
            .resolve_str("0  ChanCSRa\n4  GainDAC\n8  ModNum\n")
            .unwrap()
    }

    #[test]
    fn decodes_scalars_and_sequences() {
        let map = scenario_map();
        let chunk = encode(&[5, 9, 1, 1, 1, 1, 1, 1, 1, 1]);
        let record = decode_chunk(&map, &chunk, 0).unwrap();

        assert_eq!(record.get("ChanCSRa"), Some(&FieldValue::Scalar(5)));
        assert_eq!(record.get("GainDAC"), Some(&FieldValue::Scalar(9)));
        assert_eq!(
            record.get("ModNum"),
            Some(&FieldValue::Words(vec![1; 8]))
        );
        let order: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["ChanCSRa", "GainDAC", "ModNum"]);
    }

    #[test]
    fn words_are_little_endian() {
        let map = AddressMap::new(vec![LayoutEntry::new("Word", 1)], 1).unwrap();
        let record = decode_chunk(&map, &[0x78, 0x56, 0x34, 0x12], 0).unwrap();
        assert_eq!(record.get("Word"), Some(&FieldValue::Scalar(0x1234_5678)));
    }

    #[test]
    fn zero_length_field_is_an_empty_sequence() {
        let map = AddressMap::new(
            vec![LayoutEntry::new("Data", 2), LayoutEntry::new("Tail", 0)],
            2,
        )
        .unwrap();
        let record = decode_chunk(&map, &encode(&[3, 4]), 0).unwrap();
        assert_eq!(record.get("Tail"), Some(&FieldValue::Words(vec![])));
        assert_eq!(record.get("Data").and_then(FieldValue::as_words), Some(&[3, 4][..]));
    }

    #[test]
    fn short_chunk_is_truncated() {
        let map = scenario_map();
        let err = decode_chunk(&map, &encode(&[1, 2, 3]), 4).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                record: 4,
                expected: 40,
                actual: 12
            }
        ));
    }

    #[test]
    fn streams_records_until_exhausted() {
        let map = scenario_map();
        let mut data = encode(&[1, 2, 0, 0, 0, 0, 0, 0, 0, 0]);
        data.extend(encode(&[3, 4, 9, 9, 9, 9, 9, 9, 9, 9]));

        let mut decoder = RecordDecoder::new(Cursor::new(data), &map);
        let records: Vec<_> = decoder.by_ref().collect::<DecodeResult<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(decoder.records_read(), 2);
        assert_eq!(records[1].get("GainDAC").and_then(FieldValue::as_scalar), Some(4));
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let map = scenario_map();
        let mut decoder = RecordDecoder::new(Cursor::new(Vec::new()), &map);
        assert!(decoder.next().is_none());
    }

    #[test]
    fn partial_trailing_record_stops_iteration() {
        let map = scenario_map();
        let mut data = encode(&[0; 10]);
        data.extend([1, 2, 3]);

        let mut decoder = RecordDecoder::new(Cursor::new(data), &map);
        assert!(decoder.next().unwrap().is_ok());
        match decoder.next() {
            Some(Err(DecodeError::Truncated {
                record, actual, ..
            })) => {
                assert_eq!(record, 1);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected item: {:?}", other),
        }
        assert!(decoder.next().is_none());
    }

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(out.len()).min(self.data.len() - self.pos);
            out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn short_reads_are_accumulated() {
        let map = scenario_map();
        let reader = Trickle {
            data: encode(&[7, 8, 1, 2, 3, 4, 5, 6, 7, 8]),
            pos: 0,
            step: 3,
        };
        let records: Vec<_> = RecordDecoder::new(reader, &map)
            .collect::<DecodeResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("ChanCSRa"), Some(&FieldValue::Scalar(7)));
    }

    #[test]
    fn field_value_serializes_untagged() {
        assert_eq!(serde_json::to_string(&FieldValue::Scalar(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&FieldValue::Words(vec![1, 2])).unwrap(),
            "[1,2]"
        );
    }
}
