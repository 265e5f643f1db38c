//! A1-style cell reference helpers. Rows and columns are 1-based here, the
//! same way the sheet XML counts them.

/// `1 -> "A"`, `27 -> "AA"`.
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row)
}

/// Parse `"B12"` (or `"$B$12"`) into `(row, col)`.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }

    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row, col))
}

/// An inclusive block of cells such as `"E5"` or `"E5:F6"`, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first: (u32, u32),
    pub last: (u32, u32),
}

impl CellRange {
    pub fn parse(range: &str) -> Option<Self> {
        let mut parts = range.split(':');
        let start = parts.next().and_then(parse_cell_ref)?;
        let end = match parts.next() {
            Some(end) => parse_cell_ref(end)?,
            None => start,
        };

        Some(Self {
            first: (start.0.min(end.0), start.1.min(end.1)),
            last: (start.0.max(end.0), start.1.max(end.1)),
        })
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first.0..=self.last.0).contains(&row) && (self.first.1..=self.last.1).contains(&col)
    }
}
