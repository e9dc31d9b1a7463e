use std::fmt::Display;
use std::io::Cursor;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{instrument, warn};

use super::Networkable;
use crate::DnsError;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// Upper bound on pointers followed while decoding a single name.
pub const MAX_POINTER_HOPS: usize = 128;

const POINTER_MASK: u8 = 0b1100_0000;

/// A domain name as an ordered list of labels, most specific first.
///
/// The root name has no labels.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq)]
pub struct Name {
    pub labels: Vec<Bytes>,
}

impl Name {
    /// Parses a name in presentation form, e.g. `www.example.com`.
    ///
    /// A single trailing dot is accepted; `""` and `"."` are the root.
    pub fn new(name: &str) -> Result<Self, DnsError> {
        let trimmed = name.strip_suffix('.').unwrap_or(name);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        Self::from_labels(trimmed.split('.').map(str::as_bytes))
    }

    pub fn from_labels<I, L>(labels: I) -> Result<Self, DnsError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let labels: Vec<Bytes> = labels
            .into_iter()
            .map(|l| Bytes::copy_from_slice(l.as_ref()))
            .collect();

        let name = Self { labels };
        name.validate()?;

        Ok(name)
    }

    pub fn root() -> Self {
        Self { labels: Vec::new() }
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Length of the uncompressed wire form, terminator included.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    fn validate(&self) -> Result<(), DnsError> {
        for label in &self.labels {
            if label.is_empty() {
                return Err(DnsError::InvalidLabel("empty label".to_owned()));
            }
            if label.contains(&0) {
                return Err(DnsError::InvalidLabel("embedded NUL".to_owned()));
            }
        }

        if let Some(label) = self.labels.iter().find(|l| l.len() > MAX_LABEL_LEN) {
            return Err(DnsError::LabelTooLong(label.len()));
        }

        let len = self.wire_len();
        if len > MAX_NAME_LEN {
            return Err(DnsError::NameTooLong(len));
        }

        Ok(())
    }

    /// Decodes the name starting at `offset` within the full message `buf`.
    ///
    /// Returns the name and the number of bytes it occupies at `offset`. A
    /// compression pointer counts as 2 bytes; the bytes it points to are not
    /// charged to this name.
    ///
    /// Every pointer must target an offset below both its own position and
    /// the previous pointer's target, so the walk strictly moves backwards
    /// through the buffer and always terminates.
    #[instrument(level = "trace", skip(buf))]
    pub fn decode_at(buf: &[u8], offset: usize) -> Result<(Self, usize), DnsError> {
        let mut labels = Vec::new();
        let mut wire_len = 1;
        let mut pos = offset;
        // Set once the first pointer is followed
        let mut consumed = None;
        let mut limit = usize::MAX;
        let mut hops = 0;

        loop {
            let control = *buf.get(pos).ok_or(DnsError::TruncatedMessage)?;

            match control & POINTER_MASK {
                0b0000_0000 if control == 0 => {
                    pos += 1;
                    break;
                }
                0b0000_0000 => {
                    let len = control as usize;
                    let label = buf
                        .get(pos + 1..pos + 1 + len)
                        .ok_or(DnsError::TruncatedMessage)?;

                    wire_len += len + 1;
                    if wire_len > MAX_NAME_LEN {
                        return Err(DnsError::NameTooLong(wire_len));
                    }
                    if label.contains(&0) {
                        return Err(DnsError::InvalidLabel("embedded NUL".to_owned()));
                    }

                    labels.push(Bytes::copy_from_slice(label));
                    pos += len + 1;
                }
                POINTER_MASK => {
                    let low = *buf.get(pos + 1).ok_or(DnsError::TruncatedMessage)?;
                    let target = (((control & !POINTER_MASK) as usize) << 8) | low as usize;

                    if target >= buf.len() {
                        return Err(DnsError::TruncatedMessage);
                    }

                    hops += 1;
                    if target >= pos.min(limit) || hops > MAX_POINTER_HOPS {
                        warn!(pointer = pos, target, hops, "rejecting compression pointer");
                        return Err(DnsError::CompressionLoop);
                    }

                    if consumed.is_none() {
                        consumed = Some(pos + 2 - offset);
                    }
                    limit = target;
                    pos = target;
                }
                _ => return Err(DnsError::InvalidLabelEncoding(control)),
            }
        }

        let consumed = consumed.unwrap_or_else(|| pos - offset);

        Ok((Self { labels }, consumed))
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }

        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&String::from_utf8_lossy(label))?;
        }

        Ok(())
    }
}

impl Networkable for Name {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        self.validate()?;

        let mut ret = BytesMut::with_capacity(self.wire_len());

        for label in &self.labels {
            ret.put_u8(label.len() as u8);
            ret.extend_from_slice(label);
        }

        ret.put_u8(0);

        Ok(ret.freeze())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let start = bytes.position() as usize;
        let (name, consumed) = Self::decode_at(bytes.get_ref(), start)?;
        bytes.set_position((start + consumed) as u64);

        Ok(name)
    }
}
