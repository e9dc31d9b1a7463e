use std::fmt::Display;
use std::str::FromStr;

use crate::DnsError;

pub const TYPE_A: u16 = 1;
pub const CLASS_IN: u16 = 1;

/// A resource record type. Unknown values are carried through untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RecordType(pub u16);

impl RecordType {
    pub const A: Self = Self(TYPE_A);
    pub const NS: Self = Self(2);
    pub const CNAME: Self = Self(5);
    pub const SOA: Self = Self(6);
    pub const PTR: Self = Self(12);
    pub const MX: Self = Self(15);
    pub const TXT: Self = Self(16);
    pub const AAAA: Self = Self(28);

    const MNEMONICS: [(Self, &'static str); 8] = [
        (Self::A, "A"),
        (Self::NS, "NS"),
        (Self::CNAME, "CNAME"),
        (Self::SOA, "SOA"),
        (Self::PTR, "PTR"),
        (Self::MX, "MX"),
        (Self::TXT, "TXT"),
        (Self::AAAA, "AAAA"),
    ];

    fn mnemonic(&self) -> Option<&'static str> {
        Self::MNEMONICS
            .iter()
            .find(|(t, _)| t == self)
            .map(|(_, m)| *m)
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        value.0
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mnemonic() {
            Some(m) => f.write_str(m),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

impl FromStr for RecordType {
    type Err = DnsError;

    /// Accepts a known mnemonic (case-insensitive) or the generic `TYPE<n>` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();

        if let Some((t, _)) = Self::MNEMONICS.iter().find(|(_, m)| *m == upper) {
            return Ok(*t);
        }

        upper
            .strip_prefix("TYPE")
            .and_then(|n| n.parse::<u16>().ok())
            .map(Self)
            .ok_or_else(|| DnsError::UnknownRecordType(s.to_owned()))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Class(pub u16);

impl Class {
    pub const IN: Self = Self(CLASS_IN);
}

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Class> for u16 {
    fn from(value: Class) -> Self {
        value.0
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::IN => f.write_str("IN"),
            Self(n) => write!(f, "CLASS{n}"),
        }
    }
}
