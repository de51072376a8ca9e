//! Indel-based string similarity on a 0–100 scale.

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Normalized indel similarity: `100 * 2 * LCS / (len(a) + len(b))`
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best `ratio` of the shorter string against every alignment with the
/// longer one, including windows hanging off either end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let best = best_window(&a, &b);
    if a.len() == b.len() {
        best.max(best_window(&b, &a))
    } else {
        best
    }
}

fn best_window(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let m = short.len();
    let n = long.len();
    let mut best = 0.0f64;

    for end in 1..m {
        best = best.max(ratio_chars(short, &long[..end]));
    }
    for start in 0..=(n - m) {
        best = best.max(ratio_chars(short, &long[start..start + m]));
        if best >= 100.0 {
            return 100.0;
        }
    }
    for start in (n - m + 1)..n {
        best = best.max(ratio_chars(short, &long[start..]));
    }
    best
}
