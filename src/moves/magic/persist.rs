//! Loading and saving magic tables.
//!
//! Regenerating from the default seed takes well under a second, so the
//! on-disk path is an optional shortcut behind the `load_magic` feature
//! rather than a requirement.

use super::build::{DEFAULT_MAGIC_SEED, MagicSeed, generate_magic_tables};
use super::MagicTables;
use std::io;
use std::path::Path;

/// Default file name for persisted tables.
pub const MAGIC_TABLES_FILE: &str = "magic_tables.bin";

/// Obtain magic tables for engine construction.
///
/// With the `load_magic` feature, a `magic_tables.bin` next to the working
/// directory is used when present and readable; anything else falls back
/// to deterministic regeneration.
pub fn load_magic_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    {
        match read_magic_tables(MAGIC_TABLES_FILE) {
            Ok(tables) => return tables,
            Err(err) => {
                tracing::warn!("could not load {MAGIC_TABLES_FILE}: {err}, regenerating");
            }
        }
    }

    generate_magic_tables(MagicSeed::Fixed(DEFAULT_MAGIC_SEED))
        .expect("magic generation with the default seed always terminates")
}

#[cfg(feature = "load_magic")]
fn read_magic_tables<P: AsRef<Path>>(path: P) -> Result<MagicTables, String> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| e.to_string())?;
    let reader = io::BufReader::new(file);
    bincode::deserialize_from(reader).map_err(|e| e.to_string())
}

/// Persist tables for later `load_magic` startups.
pub fn save_magic_tables<P: AsRef<Path>>(tables: &MagicTables, path: P) -> io::Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    let writer = io::BufWriter::new(file);
    bincode::serialize_into(writer, tables)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
