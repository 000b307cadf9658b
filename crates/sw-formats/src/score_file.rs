//! Score files in RON.

use std::fs;
use std::path::Path;

use ron::extensions::Extensions;
use ron::ser::PrettyConfig;
use sw_ir::Score;

use crate::FormatError;

/// RON reader that accepts `tempo: 60` for optional fields.
fn reader() -> ron::Options {
    ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME)
}

/// Parse a score from RON text.
pub fn parse_score(text: &str) -> Result<Score, FormatError> {
    Ok(reader().from_str(text)?)
}

/// Load a score from a RON file.
pub fn load_score(path: &Path) -> Result<Score, FormatError> {
    let text = fs::read_to_string(path)?;
    parse_score(&text)
}

/// Serialize a score to pretty RON.
pub fn score_to_ron(score: &Score) -> Result<String, FormatError> {
    Ok(ron::ser::to_string_pretty(score, PrettyConfig::default())?)
}

pub fn save_score(score: &Score, path: &Path) -> Result<(), FormatError> {
    fs::write(path, score_to_ron(score)?)?;
    Ok(())
}
