/// Column letters for a 1-based column: 1 → A, 26 → Z, 27 → AA.
pub fn column_letters(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

pub fn cell_range(title: &str, row: u32, col: u32) -> String {
    format!("{}!{}{}", quote_title(title), column_letters(col), row)
}
