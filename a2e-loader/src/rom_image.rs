// Design: trimmed from the teacher's `zinc64-loader/src/bin.rs` (`BinLoader`
// reading a raw image off a `Reader`) down to the one job this boundary
// still has: read a file fully into memory and check it against the
// byte-exact size a ROM region requires. The core never ships vendor ROMs;
// callers supply their own dumps and this validates length before they reach
// `a2e_system::MachineConfig`.

use std::fs;
use std::path::Path;

use thiserror::Error;

use a2e_core::ConfigurationError;

/// Size of a slot's own ROM window at `$Cs00-$CsFF`.
pub const SLOT_ROM_SIZE: usize = 256;
/// Size of a card's expansion ROM, latched in at `$C800-$CFFF`.
pub const EXPANSION_ROM_SIZE: usize = 2048;
/// Size of the character-generator ROM consulted at scanline fetch time.
pub const CHARACTER_ROM_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("failed to read ROM image: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SizeMismatch(#[from] ConfigurationError),
}

/// Reads `path` in full and checks it is exactly `expected_size` bytes.
/// `name` identifies the ROM region in a `ConfigurationError` (e.g. the
/// slot number or "character generator").
pub fn load_rom_image(path: &Path, name: &str, expected_size: usize) -> Result<Vec<u8>, RomLoadError> {
    let data = fs::read(path)?;
    if data.len() != expected_size {
        return Err(ConfigurationError::RomSizeMismatch {
            name: name.to_string(),
            expected: expected_size,
            actual: data.len(),
        }
        .into());
    }
    log::info!(target: "loader", "loaded ROM image '{}' ({} bytes) from {}", name, data.len(), path.display());
    Ok(data)
}
