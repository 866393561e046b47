//! String similarity for place-name matching.
//!
//! Scores are on a 0-100 scale and follow the classic "ratio" definition,
//! `200 * lcs / (len_a + len_b)`, rounded half to even.

/// Lowercase, turn every non-alphanumeric character into a space and collapse
/// runs of whitespace.
pub fn normalize_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length of the longest common subsequence of two char slices
fn lcs_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Single rolling row over the shorter string
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];

    for &lc in long {
        let mut diagonal = 0;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[short.len()]
}

/// Similarity ratio in 0..=100. Either side empty scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();

    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let score = 200.0 * lcs_length(&a, &b) as f64 / total as f64;
    score.round_ties_even() as u8
}

/// Best candidate by `ratio`. Ties keep the earliest candidate.
pub fn best_match<'a, I>(query: &str, candidates: I) -> Option<(usize, u8)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, u8)> = None;

    for (index, candidate) in candidates.into_iter().enumerate() {
        let score = ratio(query, candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }

    best
}
