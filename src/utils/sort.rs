//! Natural ("alphanumeric") filename ordering.
//!
//! Comic archives commonly number pages without zero padding (`page2.jpg`,
//! `page10.jpg`); plain lexicographic order would interleave them. Sorting
//! compares runs of digits numerically and everything else case-insensitively.

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Number(u128),
    Text(String),
}

fn sort_key(name: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();
    for c in name.chars() {
        if c.is_ascii_digit() {
            if !text.is_empty() {
                chunks.push(Chunk::Text(std::mem::take(&mut text)));
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                chunks.push(number_chunk(std::mem::take(&mut digits)));
            }
            text.extend(c.to_lowercase());
        }
    }
    if !text.is_empty() {
        chunks.push(Chunk::Text(text));
    }
    if !digits.is_empty() {
        chunks.push(number_chunk(digits));
    }
    chunks
}

/// Digit runs too long for a u128 are compared as text.
fn number_chunk(digits: String) -> Chunk {
    match digits.parse() {
        Ok(n) => Chunk::Number(n),
        Err(_) => Chunk::Text(digits),
    }
}

/// Sorts `names` in place in natural reading order.
pub fn alphanumeric_sort(names: &mut [String]) {
    names.sort_by_key(|n| sort_key(n));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_runs_sort_numerically() {
        let mut names: Vec<String> = ["page10.jpg", "page2.jpg", "page1.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        alphanumeric_sort(&mut names);
        assert_eq!(names, ["page1.jpg", "page2.jpg", "page10.jpg"]);
    }

    #[test]
    fn test_case_insensitive() {
        let mut names: Vec<String> = ["B.png", "a.png"].iter().map(|s| s.to_string()).collect();
        alphanumeric_sort(&mut names);
        assert_eq!(names, ["a.png", "B.png"]);
    }

    #[test]
    fn test_mixed_prefixes() {
        let mut names: Vec<String> = ["ch2-05.png", "ch10-01.png", "ch2-04.png", "cover.png"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        alphanumeric_sort(&mut names);
        assert_eq!(names, ["ch2-04.png", "ch2-05.png", "ch10-01.png", "cover.png"]);
    }
}
