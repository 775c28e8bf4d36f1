//! Text Module
//!
//! Arabic text normalization shared by every matching path:
//! - Tashkeel (harakat and Quranic annotation marks) stripping
//! - Tatweel removal
//! - Lam-alef ligature expansion
//! - Index-time cleaning and word tokenization

mod arabic;

pub use arabic::{
    clean_text, normalize_arabic, normalize_for_index, normalize_lamalef, strip_tashkeel,
    strip_tatweel, tokenize, LAM_ALEF, TATWEEL,
};
