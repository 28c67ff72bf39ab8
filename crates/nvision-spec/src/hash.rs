//! Canonical request hashing.
//!
//! A request key is `hex(BLAKE3(json(frame) || json(params)))`. Struct
//! serialization order is fixed, so identical inputs always hash the same.

use crate::frame::ScanFrame;
use crate::params::DetectionParameters;

/// Computes the content key for a detection request.
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
pub fn request_key(
    frame: &ScanFrame,
    params: &DetectionParameters,
) -> Result<String, serde_json::Error> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(frame)?);
    hasher.update(&serde_json::to_vec(params)?);
    Ok(hasher.finalize().to_hex().to_string())
}
