// API request/response types module

use serde::{Deserialize, Serialize};

/// Code status returned by `GET /api/code`
#[derive(Debug, Serialize)]
pub struct CodeStatus {
    /// Whether a master code is set
    pub set: bool,
    /// Digit count of the stored code (0 when unset)
    pub len: usize,
}

/// Change request body for `POST /api/code`
///
/// Missing fields deserialize to empty strings; the keypad UI omits
/// `current` during first-time setup.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeCodeRequest {
    /// Currently stored code (ignored while no code is set)
    #[serde(default)]
    pub current: String,
    /// Replacement code
    #[serde(default, rename = "new")]
    pub new_code: String,
    /// Must repeat `new` exactly
    #[serde(default)]
    pub confirm: String,
}

/// Check the master code format: 4 to 8 ASCII decimal digits
pub fn is_valid_code(code: &str) -> bool {
    (4..=8).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}
