//! Magic number search and attack-table construction.
//!
//! For every square we enumerate all subsets of the relevant-blocker mask
//! (carry-rippler), ray-cast the true attack set for each, then hunt for a
//! sparse multiplier that hashes every subset to a distinct slot — or to a
//! shared slot that happens to hold the same attack set, which is just as
//! good. The shift is `64 - popcount(mask)`, so the table is exactly
//! `2^popcount(mask)` entries and an in-range index is guaranteed.

use super::{MagicEntry, MagicTables, SliderTable};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use tracing::debug;

/// Seed used when no explicit seed is requested; keeps startup
/// deterministic across runs and platforms.
pub const DEFAULT_MAGIC_SEED: u64 = 0xD1CE_0F_C0A7_5EED;

#[derive(Debug, Clone, Copy)]
pub enum MagicSeed {
    Fixed(u64),
    Random,
}

const MAX_CANDIDATES: u32 = 1_000_000;

/// Every subset of `mask`, the empty set included, in carry-rippler order.
fn blocker_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

/// Sparse random candidate: AND of three draws keeps few bits set, which
/// is where usable magics live.
#[inline]
fn sparse_candidate(rng: &mut StdRng) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// Try to place every (blockers, attacks) pair under `magic`. Constructive
/// collisions (same slot, same attack set) are allowed.
fn try_fill(
    blockers: &[u64],
    attacks: &[u64],
    magic: u64,
    shift: u32,
    table: &mut [u64],
    used: &mut [bool],
) -> bool {
    table.fill(0);
    used.fill(false);
    for (&blocker, &attack) in blockers.iter().zip(attacks) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        if used[index] {
            if table[index] != attack {
                return false;
            }
        } else {
            used[index] = true;
            table[index] = attack;
        }
    }
    true
}

fn find_magic(
    square: usize,
    mask: u64,
    blockers: &[u64],
    attacks: &[u64],
    rng: &mut StdRng,
) -> Result<MagicEntry, String> {
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let size = 1usize << bits;
    let mut table = vec![0u64; size];
    let mut used = vec![false; size];

    for _ in 0..MAX_CANDIDATES {
        let magic = sparse_candidate(rng);
        if try_fill(blockers, attacks, magic, shift, &mut table, &mut used) {
            return Ok(MagicEntry {
                magic,
                shift,
                mask,
                table: table.into_boxed_slice(),
            });
        }
    }

    Err(format!(
        "no magic found for square {square} after {MAX_CANDIDATES} candidates"
    ))
}

fn build_slider(
    rng: &mut StdRng,
    mask_for: fn(usize) -> u64,
    rays_for: fn(usize, u64) -> u64,
) -> Result<SliderTable, String> {
    let mut entries = Vec::with_capacity(64);
    for square in 0..64 {
        let mask = mask_for(square);
        let blockers = blocker_subsets(mask);
        let attacks: Vec<u64> = blockers.iter().map(|&b| rays_for(square, b)).collect();
        entries.push(find_magic(square, mask, &blockers, &attacks, rng)?);
    }
    Ok(SliderTable::new(entries))
}

/// Build both slider tables from scratch.
pub fn generate_magic_tables(seed: MagicSeed) -> Result<MagicTables, String> {
    use crate::moves::tables::{bishop_mask, bishop_rays, rook_mask, rook_rays};

    let mut rng = match seed {
        MagicSeed::Fixed(seed) => StdRng::seed_from_u64(seed),
        MagicSeed::Random => {
            let mut seed = [0u8; 32];
            rand::rng().fill_bytes(&mut seed);
            StdRng::from_seed(seed)
        }
    };

    let rook = build_slider(&mut rng, rook_mask, rook_rays)?;
    let bishop = build_slider(&mut rng, bishop_mask, bishop_rays)?;
    debug!("magic tables generated");
    Ok(MagicTables { rook, bishop })
}
