/// Payload text encodings the service understands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Charset {
    Utf8,
    Iso8859_1,
}

impl Charset {
    pub fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("UTF-8") {
            Some(Charset::Utf8)
        } else if text.eq_ignore_ascii_case("ISO-8859-1") {
            Some(Charset::Iso8859_1)
        } else {
            None
        }
    }
}

/// Result of a charset conversion. `degraded` marks the best-effort
/// fallback where the original bytes were kept because the payload does
/// not fit the target encoding.
#[derive(Debug)]
pub struct Converted {
    pub bytes: Vec<u8>,
    pub degraded: bool,
}

/// Reinterprets `text` from `source` to `target` encoding, yielding the
/// byte payload handed to the QR encoder.
///
/// This never fails: a payload that cannot be represented in the target
/// encoding comes back unchanged with the `degraded` marker set.
pub fn convert(text: &str, source: Charset, target: Charset) -> Converted {
    match (source, target) {
        (Charset::Utf8, Charset::Utf8) | (Charset::Iso8859_1, Charset::Iso8859_1) => Converted {
            bytes: text.as_bytes().to_vec(),
            degraded: false,
        },
        (Charset::Utf8, Charset::Iso8859_1) => {
            let mut out = Vec::with_capacity(text.len());
            for ch in text.chars() {
                let cp = ch as u32;
                if cp > 0xFF {
                    return Converted {
                        bytes: text.as_bytes().to_vec(),
                        degraded: true,
                    };
                }
                out.push(cp as u8);
            }
            Converted {
                bytes: out,
                degraded: false,
            }
        }
        (Charset::Iso8859_1, Charset::Utf8) => {
            let widened: String = text.bytes().map(char::from).collect();
            Converted {
                bytes: widened.into_bytes(),
                degraded: false,
            }
        }
    }
}
