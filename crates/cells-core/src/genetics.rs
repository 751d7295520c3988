//! Genome inheritance with rare point mutations.

use crate::gene::Gene;
use crate::rng::RandomSource;

/// Genes evaluated by every agent each tick.
pub const GENES_PER_CELL: usize = 4;

/// Fixed-size genome owned by a single agent.
pub type Genome = [Gene; GENES_PER_CELL];

/// 16-bit roll that mutates the child.
const CHILD_MUTATION_ROLL: u16 = 0xabcd;
/// 16-bit roll that mutates the parent.
const PARENT_MUTATION_ROLL: u16 = 0xef00;
/// 48-bit pattern that adds a second mutation to the other party.
const DOUBLE_MUTATION_PATTERN: u64 = 0x6361_6d62_6961;
const DOUBLE_MUTATION_MASK: u64 = 0xffff_ffff_ffff;

/// Fill a genome with uniformly random bits.
pub fn random_genome(rng: &mut dyn RandomSource) -> Genome {
    let mut bytes = [0u8; GENES_PER_CELL * 4];
    rng.fill(&mut bytes);
    let mut genome = [Gene::default(); GENES_PER_CELL];
    for (gene, chunk) in genome.iter_mut().zip(bytes.chunks_exact(4)) {
        *gene = Gene::from_raw(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    genome
}

/// Flip one random bit of one random gene.
fn point_mutation(genome: &mut Genome, rng: &mut dyn RandomSource) {
    let slot = usize::from(rng.next_u8()) % GENES_PER_CELL;
    let bit = u32::from(rng.next_u8()) % u32::BITS;
    genome[slot] = genome[slot].flip_bit(bit);
}

fn rolls_double_mutation(rng: &mut dyn RandomSource) -> bool {
    rng.next_u64() & DOUBLE_MUTATION_MASK == DOUBLE_MUTATION_PATTERN
}

/// Copy `parent` into a new child genome.
///
/// One in 65536 copies mutates the child and another disjoint one in 65536
/// mutates the parent in place. Either branch then has a one in 2^48 chance
/// of also mutating the other party.
pub fn inherit(parent: &mut Genome, rng: &mut dyn RandomSource) -> Genome {
    let roll = rng.next_u16();
    let mut child = *parent;

    match roll {
        CHILD_MUTATION_ROLL => {
            point_mutation(&mut child, rng);
            if rolls_double_mutation(rng) {
                point_mutation(parent, rng);
            }
        }
        PARENT_MUTATION_ROLL => {
            point_mutation(parent, rng);
            if rolls_double_mutation(rng) {
                point_mutation(&mut child, rng);
            }
        }
        _ => {}
    }

    child
}
