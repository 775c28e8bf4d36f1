//! Arabic Normalization
//!
//! Pure string transforms used before any comparison between a noisy query
//! span and canonical verse or hadith text. None of these functions keep
//! state; all of them accept arbitrary (including non-Arabic) input.

use unicode_normalization::UnicodeNormalization;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Arabic tatweel (kashida) used for elongation
pub const TATWEEL: char = '\u{0640}';

/// Lam followed by a bare alef, the expansion of every lam-alef ligature
pub const LAM_ALEF: &str = "\u{0644}\u{0627}";

// ============================================================================
// CHARACTER CLASSES
// ============================================================================

/// Harakat, shadda, sukun, superscript alef and Quranic annotation marks
#[inline]
fn is_tashkeel(c: char) -> bool {
    matches!(
        c,
        '\u{064B}'..='\u{0652}'
            | '\u{0670}'
            | '\u{0610}'..='\u{061A}'
            | '\u{06D6}'..='\u{06DC}'
            | '\u{06DF}'..='\u{06E8}'
            | '\u{06EA}'..='\u{06ED}'
    )
}

/// Presentation-form lam-alef ligatures (isolated and final forms)
#[inline]
fn is_lam_alef_ligature(c: char) -> bool {
    matches!(c, '\u{FEF5}'..='\u{FEFC}')
}

// ============================================================================
// PRIMITIVE TRANSFORMS
// ============================================================================

/// Remove tashkeel (vowel marks and Quranic annotation signs)
pub fn strip_tashkeel(text: &str) -> String {
    text.chars().filter(|c| !is_tashkeel(*c)).collect()
}

/// Remove tatweel characters
pub fn strip_tatweel(text: &str) -> String {
    text.chars().filter(|c| *c != TATWEEL).collect()
}

/// Expand lam-alef ligatures into lam + bare alef
pub fn normalize_lamalef(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if is_lam_alef_ligature(c) {
            out.push_str(LAM_ALEF);
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// COMPOSITE NORMALIZERS
// ============================================================================

/// Normalize Arabic text for lenient matching.
///
/// Ligatures are expanded first (so hamza-carrying ligatures collapse to a
/// bare alef), then NFKC folds any remaining presentation forms, then
/// tashkeel and tatweel are removed and the result is trimmed.
///
/// ```
/// use sanad_core::text::normalize_arabic;
///
/// assert_eq!(normalize_arabic("يَسَّرْنَا"), "يسرنا");
/// assert_eq!(normalize_arabic("  بـسـم  "), "بسم");
/// ```
pub fn normalize_arabic(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let folded: String = normalize_lamalef(text).nfkc().collect();
    let stripped: String = folded
        .chars()
        .filter(|c| !is_tashkeel(*c) && *c != TATWEEL)
        .collect();

    stripped.trim().to_string()
}

/// Normalize text for character n-gram indexing.
///
/// On top of [`normalize_arabic`]: every whitespace character becomes a
/// space, control characters and curly braces are dropped, the text is
/// lowercased and whitespace runs collapse to a single space.
pub fn normalize_for_index(text: &str) -> String {
    let normalized = normalize_arabic(text);

    let cleaned: String = normalized
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() || c == '{' || c == '}' {
                None
            } else {
                Some(c)
            }
        })
        .collect::<String>()
        .to_lowercase();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text into words
pub fn tokenize(text: &str) -> Vec<String> {
    normalize_arabic(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Verifier-side cleaning: strip tashkeel only when enabled
pub fn clean_text(text: &str, remove_diacritics: bool) -> String {
    if text.is_empty() {
        return String::new();
    }
    if remove_diacritics {
        strip_tashkeel(text)
    } else {
        text.to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
