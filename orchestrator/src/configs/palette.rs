/// A plain 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("invalid colour: {s}"));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("invalid colour: {s}"))
        };

        Ok(Self(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Colours assigned to peers by position, wrapping around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Creates a palette, falling back to the default one when `colors` is empty.
    pub fn new(colors: Vec<Rgb>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors }
    }

    pub fn color(&self, idx: usize) -> Rgb {
        self.colors[idx % self.colors.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                Rgb(0xf9, 0x73, 0x16),
                Rgb(0x06, 0xb6, 0xd4),
                Rgb(0x8b, 0x5c, 0xf6),
                Rgb(0x10, 0xb9, 0x81),
                Rgb(0xf5, 0x9e, 0x0b),
                Rgb(0xec, 0x48, 0x99),
            ],
        }
    }
}
