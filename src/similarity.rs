//! src/similarity.rs
//! Ocena podobieństwa dwóch treści (Sørensen–Dice na bigramach znaków).
//!
//! Białe znaki są wycinane, wielkość liter ma znaczenie. Bez normalizacji
//! Unicode – to świadomie prosta miara do wykrywania powtórek.

use std::collections::HashMap;

/// Próg, powyżej którego dwie wiadomości uznajemy za „te same”.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Wynik w zakresie [0, 1]. Symetryczny, `score(x, x) == 1.0`.
pub fn score(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::with_capacity(a.len());
    for w in a.windows(2) {
        *bigrams.entry((w[0], w[1])).or_insert(0) += 1;
    }

    // przecięcie multizbiorów: każdy bigram z `a` można „zużyć” tylko raz
    let mut shared = 0usize;
    for w in b.windows(2) {
        if let Some(n) = bigrams.get_mut(&(w[0], w[1])) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }

    (2.0 * shared as f64) / ((a.len() - 1) + (b.len() - 1)) as f64
}

#[inline]
pub fn is_similar(a: &str, b: &str) -> bool {
    score(a, b) > SIMILARITY_THRESHOLD
}
