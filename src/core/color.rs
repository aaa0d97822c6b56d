/// RGB color of one QR module or fill area.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

/// Parses a color parameter value.
///
/// Three grammars are accepted, matched exactly:
/// - 3 hex digits, each digit doubled (`f00` -> `ff0000`)
/// - 6 hex digits (`ff0000`)
/// - decimal triple `r-g-b`, each component 0-255
///
/// Anything else returns `None`. Out-of-range decimal components are
/// rejected, never clamped.
pub fn parse(text: &str) -> Option<Rgb> {
    parse_hex(text).or_else(|| parse_decimal(text))
}

fn parse_hex(text: &str) -> Option<Rgb> {
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match text.len() {
        3 => {
            let mut it = text.chars().map(|c| {
                let d = c.to_digit(16).unwrap_or(0) as u8;
                d << 4 | d
            });
            Some(Rgb {
                r: it.next()?,
                g: it.next()?,
                b: it.next()?,
            })
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&text[i..i + 2], 16).ok();
            Some(Rgb {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
            })
        }
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Rgb> {
    let mut parts = text.split('-');
    let r = decimal_channel(parts.next()?)?;
    let g = decimal_channel(parts.next()?)?;
    let b = decimal_channel(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb { r, g, b })
}

fn decimal_channel(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u16 = part.parse().ok()?;
    u8::try_from(value).ok()
}
