use std::fmt;
use std::str::FromStr;

use crate::error::ZoneCraftError;

/// Resource record types understood by the zone engine.
///
/// MD and MF are obsolete (RFC 973) and carried only so the registry can
/// report them as deprecated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    #[default]
    A,
    NS,
    MD,
    MF,
    CNAME,
    SOA,
    PTR,
    HINFO,
    MX,
    TXT,
    RP,
    AAAA,
    SRV,
    DNAME,
    NSEC,
    SPF,
    CAA,
    AXFR,
}

impl RecordType {
    pub fn to_u16(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::MD => 3,
            RecordType::MF => 4,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::HINFO => 13,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::RP => 17,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::DNAME => 39,
            RecordType::NSEC => 47,
            RecordType::SPF => 99,
            RecordType::CAA => 257,
            RecordType::AXFR => 252,
        }
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(RecordType::A),
            2 => Some(RecordType::NS),
            3 => Some(RecordType::MD),
            4 => Some(RecordType::MF),
            5 => Some(RecordType::CNAME),
            6 => Some(RecordType::SOA),
            12 => Some(RecordType::PTR),
            13 => Some(RecordType::HINFO),
            15 => Some(RecordType::MX),
            16 => Some(RecordType::TXT),
            17 => Some(RecordType::RP),
            28 => Some(RecordType::AAAA),
            33 => Some(RecordType::SRV),
            39 => Some(RecordType::DNAME),
            47 => Some(RecordType::NSEC),
            99 => Some(RecordType::SPF),
            252 => Some(RecordType::AXFR),
            257 => Some(RecordType::CAA),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::NS => "NS",
            RecordType::MD => "MD",
            RecordType::MF => "MF",
            RecordType::CNAME => "CNAME",
            RecordType::SOA => "SOA",
            RecordType::PTR => "PTR",
            RecordType::HINFO => "HINFO",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::RP => "RP",
            RecordType::AAAA => "AAAA",
            RecordType::SRV => "SRV",
            RecordType::DNAME => "DNAME",
            RecordType::NSEC => "NSEC",
            RecordType::SPF => "SPF",
            RecordType::CAA => "CAA",
            RecordType::AXFR => "AXFR",
        }
    }
}

impl FromStr for RecordType {
    type Err = ZoneCraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "NS" => Ok(RecordType::NS),
            "MD" => Ok(RecordType::MD),
            "MF" => Ok(RecordType::MF),
            "CNAME" => Ok(RecordType::CNAME),
            "SOA" => Ok(RecordType::SOA),
            "PTR" => Ok(RecordType::PTR),
            "HINFO" => Ok(RecordType::HINFO),
            "MX" => Ok(RecordType::MX),
            "TXT" => Ok(RecordType::TXT),
            "RP" => Ok(RecordType::RP),
            "AAAA" => Ok(RecordType::AAAA),
            "SRV" => Ok(RecordType::SRV),
            "DNAME" => Ok(RecordType::DNAME),
            "NSEC" => Ok(RecordType::NSEC),
            "SPF" => Ok(RecordType::SPF),
            "CAA" => Ok(RecordType::CAA),
            "AXFR" => Ok(RecordType::AXFR),
            _ => Err(ZoneCraftError::InvalidRRType(s.to_string())),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource record classes (IN is the only class the engine mutates)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RecordClass {
    #[default]
    IN,
    CS,
    CH,
    HS,
}

impl RecordClass {
    pub fn to_u16(self) -> u16 {
        match self {
            RecordClass::IN => 1,
            RecordClass::CS => 2,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
        }
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(RecordClass::IN),
            2 => Some(RecordClass::CS),
            3 => Some(RecordClass::CH),
            4 => Some(RecordClass::HS),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordClass::IN => "IN",
            RecordClass::CS => "CS",
            RecordClass::CH => "CH",
            RecordClass::HS => "HS",
        }
    }
}

impl FromStr for RecordClass {
    type Err = ZoneCraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IN" => Ok(RecordClass::IN),
            "CS" => Ok(RecordClass::CS),
            "CH" => Ok(RecordClass::CH),
            "HS" => Ok(RecordClass::HS),
            _ => Err(ZoneCraftError::BadRequest(format!("unknown class: {s}"))),
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_round_trip() {
        for rtype in [
            RecordType::A,
            RecordType::SOA,
            RecordType::MX,
            RecordType::CAA,
            RecordType::AXFR,
        ] {
            assert_eq!(RecordType::from_u16(rtype.to_u16()), Some(rtype));
            assert_eq!(rtype.as_str().parse::<RecordType>().unwrap(), rtype);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!("BOGUS".parse::<RecordType>().is_err());
        assert_eq!(RecordType::from_u16(65280), None);
    }
}
