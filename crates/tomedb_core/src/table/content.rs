//! Value encodings of the index tables.
//!
//! ```text
//! termlist  key: docid (BE)        value: doclen | nterms | (len u8, term, wdf)*
//! postlist  key: ""                value: last_docid | total_doclen
//!           key: 0x00 docid (BE)   value: doclen
//!           key: 0x01 term         value: count | (docid, wdf)*
//! position  key: docid (BE) term   value: count | position*
//! ```

use super::{read_u32, read_u64};
use crate::error::{CoreError, CoreResult};
use crate::types::DocId;

/// Prefix of postlist keys holding a document length.
pub const DOCLEN_PREFIX: u8 = 0x00;

/// Prefix of postlist keys holding the postings of a term.
pub const POSTINGS_PREFIX: u8 = 0x01;

/// Decoded termlist value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TermlistValue {
    /// Document length: total wdf over all terms.
    pub doclen: u32,
    /// Terms with their within-document frequency, ascending.
    pub terms: Vec<(Vec<u8>, u32)>,
}

impl TermlistValue {
    /// Encodes the value.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.doclen.to_le_bytes());
        buf.extend_from_slice(&(self.terms.len() as u32).to_le_bytes());
        for (term, wdf) in &self.terms {
            let len = u8::try_from(term.len())
                .map_err(|_| CoreError::invalid_operation("term longer than 255 bytes"))?;
            buf.push(len);
            buf.extend_from_slice(term);
            buf.extend_from_slice(&wdf.to_le_bytes());
        }
        Ok(buf)
    }

    /// Decodes a value, rejecting truncated or trailing data.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        let mut cursor = Cursor::new(data, "termlist entry");
        let doclen = cursor.u32()?;
        let count = cursor.u32()?;
        let mut terms = Vec::new();
        for _ in 0..count {
            let len = usize::from(cursor.u8()?);
            let term = cursor.bytes(len)?.to_vec();
            let wdf = cursor.u32()?;
            terms.push((term, wdf));
        }
        cursor.finish()?;
        Ok(Self { doclen, terms })
    }

    /// Sum of the wdf of every term.
    #[must_use]
    pub fn wdf_sum(&self) -> u64 {
        self.terms.iter().map(|(_, wdf)| u64::from(*wdf)).sum()
    }
}

/// Classified postlist key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostlistKey<'a> {
    /// The metainfo entry.
    Meta,
    /// A document length entry.
    DocLen(DocId),
    /// Postings of a term.
    Postings(&'a [u8]),
}

impl<'a> PostlistKey<'a> {
    /// Classifies a raw key; `None` for keys of no known shape.
    #[must_use]
    pub fn parse(key: &'a [u8]) -> Option<Self> {
        match key.split_first() {
            None => Some(Self::Meta),
            Some((&DOCLEN_PREFIX, rest)) if rest.len() == 4 => DocId::from_key(rest).map(Self::DocLen),
            Some((&POSTINGS_PREFIX, term)) if !term.is_empty() => Some(Self::Postings(term)),
            _ => None,
        }
    }
}

/// Builds the postlist key of a document length.
#[must_use]
pub fn doclen_key(did: DocId) -> Vec<u8> {
    let mut key = vec![DOCLEN_PREFIX];
    key.extend_from_slice(&did.to_key());
    key
}

/// Builds the postlist key of a term's postings.
#[must_use]
pub fn postings_key(term: &[u8]) -> Vec<u8> {
    let mut key = vec![POSTINGS_PREFIX];
    key.extend_from_slice(term);
    key
}

/// Builds the position table key of a term within a document.
#[must_use]
pub fn position_key(did: DocId, term: &[u8]) -> Vec<u8> {
    let mut key = did.to_key().to_vec();
    key.extend_from_slice(term);
    key
}

/// Database-wide statistics kept in the postlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostlistMeta {
    /// Highest docid ever assigned.
    pub last_docid: DocId,
    /// Sum of all document lengths.
    pub total_doclen: u64,
}

impl PostlistMeta {
    /// Encodes the metainfo.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12);
        buf.extend_from_slice(&self.last_docid.as_u32().to_le_bytes());
        buf.extend_from_slice(&self.total_doclen.to_le_bytes());
        buf
    }

    /// Decodes the metainfo.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() != 12 {
            return Err(CoreError::database_corrupt(format!(
                "postlist metainfo has {} bytes, expected 12",
                data.len()
            )));
        }
        Ok(Self {
            last_docid: DocId::new(read_u32(&data[0..4])),
            total_doclen: read_u64(&data[4..12]),
        })
    }
}

/// Encodes a document length.
#[must_use]
pub fn encode_doclen(doclen: u32) -> Vec<u8> {
    doclen.to_le_bytes().to_vec()
}

/// Decodes a document length.
pub fn decode_doclen(data: &[u8]) -> CoreResult<u32> {
    if data.len() != 4 {
        return Err(CoreError::database_corrupt(format!(
            "doclen entry has {} bytes, expected 4",
            data.len()
        )));
    }
    Ok(read_u32(data))
}

/// Encodes a postings list.
#[must_use]
pub fn encode_postings(postings: &[(DocId, u32)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + postings.len() * 8);
    buf.extend_from_slice(&(postings.len() as u32).to_le_bytes());
    for (did, wdf) in postings {
        buf.extend_from_slice(&did.as_u32().to_le_bytes());
        buf.extend_from_slice(&wdf.to_le_bytes());
    }
    buf
}

/// Decodes a postings list.
pub fn decode_postings(data: &[u8]) -> CoreResult<Vec<(DocId, u32)>> {
    let mut cursor = Cursor::new(data, "postings");
    let count = cursor.u32()?;
    let mut postings = Vec::new();
    for _ in 0..count {
        let did = DocId::new(cursor.u32()?);
        let wdf = cursor.u32()?;
        postings.push((did, wdf));
    }
    cursor.finish()?;
    Ok(postings)
}

/// Encodes a position list.
#[must_use]
pub fn encode_positions(positions: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + positions.len() * 4);
    buf.extend_from_slice(&(positions.len() as u32).to_le_bytes());
    for pos in positions {
        buf.extend_from_slice(&pos.to_le_bytes());
    }
    buf
}

/// Decodes a position list.
pub fn decode_positions(data: &[u8]) -> CoreResult<Vec<u32>> {
    let mut cursor = Cursor::new(data, "position list");
    let count = cursor.u32()?;
    let mut positions = Vec::new();
    for _ in 0..count {
        positions.push(cursor.u32()?);
    }
    cursor.finish()?;
    Ok(positions)
}

/// Bounds-checked reader over a value.
///
/// Counts come from disk, so nothing is preallocated from them.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], what: &'static str) -> Self {
        Self { data, pos: 0, what }
    }

    fn bytes(&mut self, len: usize) -> CoreResult<&'a [u8]> {
        if self.data.len() - self.pos < len {
            return Err(CoreError::database_corrupt(format!(
                "{} truncated at byte {}",
                self.what, self.pos
            )));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn u8(&mut self) -> CoreResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u32(&mut self) -> CoreResult<u32> {
        Ok(read_u32(self.bytes(4)?))
    }

    fn finish(self) -> CoreResult<()> {
        if self.pos != self.data.len() {
            return Err(CoreError::database_corrupt(format!(
                "{} has {} trailing bytes",
                self.what,
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}
