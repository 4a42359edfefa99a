use serde::{Deserialize, Serialize};

/// Normalized classifier verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignLabel {
    Yes,
    No,
    Uncertain,
}

impl SignLabel {
    pub fn is_decisive(&self) -> bool {
        matches!(self, Self::Yes | Self::No)
    }

    /// Display text shown to the user ("You signed: YES").
    pub fn display(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
            Self::Uncertain => "UNCERTAIN",
        }
    }
}

impl std::fmt::Display for SignLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display())
    }
}

/// Map a raw `result` value onto a [`SignLabel`].
///
/// Total over its input: a missing label and any text other than "yes" or
/// "no" (compared case-insensitively, without trimming) is `Uncertain`.
pub fn normalize_label(raw: Option<&str>) -> SignLabel {
    match raw.map(str::to_uppercase).as_deref() {
        Some("YES") => SignLabel::Yes,
        Some("NO") => SignLabel::No,
        _ => SignLabel::Uncertain,
    }
}
