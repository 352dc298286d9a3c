//! Longest common subsequence over two slices with a custom equality.

/// Index pairs `(i, j)` of one longest common subsequence of `a` and `b`.
///
/// Ties are resolved towards the earliest elements of `a`, so the result is
/// deterministic for a given input.
pub fn lcs<A, B>(a: &[A], b: &[B], mut eq: impl FnMut(&A, &B) -> bool) -> Vec<(usize, usize)> {
    let (m, n) = (a.len(), b.len());
    if m == 0 || n == 0 {
        return Vec::new();
    }

    // table[i][j] = LCS length of a[i..] and b[j..]
    let mut table = vec![vec![0u32; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            table[i][j] = if eq(&a[i], &b[j]) {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0][0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < m && j < n {
        if eq(&a[i], &b[j]) {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcs_of_strings() {
        let a: Vec<char> = "ABCBDAB".chars().collect();
        let b: Vec<char> = "BDCABA".chars().collect();
        let pairs = lcs(&a, &b, |x, y| x == y);
        assert_eq!(pairs.len(), 4);
        for window in pairs.windows(2) {
            assert!(window[0].0 < window[1].0 && window[0].1 < window[1].1);
        }
        for &(i, j) in &pairs {
            assert_eq!(a[i], b[j]);
        }
    }

    #[test]
    fn test_lcs_empty_inputs() {
        let empty: [u8; 0] = [];
        assert!(lcs(&empty, &[1u8, 2], |x, y| x == y).is_empty());
        assert!(lcs(&[1u8], &empty, |x, y| x == y).is_empty());
    }
}
