//! JVM access flags (JVMS 4.1, 4.5, 4.6).
//!
//! Index files may spell flags either as the raw bit set or as a list of
//! modifier keywords; both deserialize to the same `u16`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ENUM: u16 = 0x4000;

/// Maps a source-level modifier keyword to its access flag.
pub fn flag_for_keyword(keyword: &str) -> Option<u16> {
    let flag = match keyword {
        "public" => ACC_PUBLIC,
        "private" => ACC_PRIVATE,
        "protected" => ACC_PROTECTED,
        "static" => ACC_STATIC,
        "final" => ACC_FINAL,
        "interface" => ACC_INTERFACE,
        "abstract" => ACC_ABSTRACT,
        "synthetic" => ACC_SYNTHETIC,
        "enum" => ACC_ENUM,
        _ => return None,
    };
    Some(flag)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlags {
    Bits(u16),
    Keywords(Vec<String>),
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match RawFlags::deserialize(deserializer)? {
        RawFlags::Bits(bits) => Ok(bits),
        RawFlags::Keywords(keywords) => keywords.iter().try_fold(0u16, |acc, keyword| {
            flag_for_keyword(keyword)
                .map(|flag| acc | flag)
                .ok_or_else(|| D::Error::custom(format!("unknown access modifier `{keyword}`")))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize")]
        flags: u16,
    }

    #[test]
    fn keywords_and_bits_agree() {
        let from_bits: Holder = serde_json::from_str(r#"{"flags": 9}"#).unwrap();
        let from_words: Holder =
            serde_json::from_str(r#"{"flags": ["public", "static"]}"#).unwrap();
        assert_eq!(from_bits.flags, ACC_PUBLIC | ACC_STATIC);
        assert_eq!(from_words.flags, from_bits.flags);
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let err = serde_json::from_str::<Holder>(r#"{"flags": ["volatile-ish"]}"#)
            .err()
            .expect("expected error");
        assert!(err.to_string().contains("volatile-ish"), "{err}");
    }
}
