//! Packed gene layout and the sensor/effector selectors it encodes.
//!
//! A gene is a 32-bit value split into three fields:
//!
//! | bits    | field            |
//! |---------|------------------|
//! | 24..=31 | input selector   |
//! | 8..=23  | strength (16 bit)|
//! | 0..=7   | output selector  |
//!
//! Mutation flips arbitrary bits, so selectors are reduced into range by
//! [`Gene::sanitize`] before every use.

use serde::{Deserialize, Serialize};
use std::fmt;

const INPUT_SHIFT: u32 = 24;
const INPUT_MASK: u32 = 0xff << INPUT_SHIFT;
const STRENGTH_SHIFT: u32 = 8;
const STRENGTH_MASK: u32 = 0xffff << STRENGTH_SHIFT;
const OUTPUT_MASK: u32 = 0xff;

/// Half-precision exponent bias used by the strength field.
const STRENGTH_EXPONENT_BIAS: u32 = 15;
/// Single-precision exponent bias.
const F32_EXPONENT_BIAS: u32 = 127;

/// Environmental or internal quantity a gene can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    Age,
    Energy,
    Oscillator,
    FoodX,
    FoodY,
    FoodForward,
    ObstacleX,
    ObstacleY,
    ObstacleForward,
    Density,
    LastX,
    LastY,
}

impl Sensor {
    /// Every sensor, ordered by selector value.
    pub const ALL: [Self; 12] = [
        Self::Age,
        Self::Energy,
        Self::Oscillator,
        Self::FoodX,
        Self::FoodY,
        Self::FoodForward,
        Self::ObstacleX,
        Self::ObstacleY,
        Self::ObstacleForward,
        Self::Density,
        Self::LastX,
        Self::LastY,
    ];

    /// Number of valid input selectors.
    pub const COUNT: u8 = Self::ALL.len() as u8;

    /// Resolve a raw selector, returning `None` when out of range.
    #[must_use]
    pub fn from_selector(selector: u8) -> Option<Self> {
        Self::ALL.get(usize::from(selector)).copied()
    }

    /// Selector value encoding this sensor.
    #[must_use]
    pub const fn selector(self) -> u8 {
        self as u8
    }
}

/// Action a gene can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effector {
    MoveX,
    MoveY,
    MoveForward,
    SelfTerminate,
    SetOscillator,
    KillForward,
}

impl Effector {
    /// Every effector, ordered by selector value.
    pub const ALL: [Self; 6] = [
        Self::MoveX,
        Self::MoveY,
        Self::MoveForward,
        Self::SelfTerminate,
        Self::SetOscillator,
        Self::KillForward,
    ];

    /// Number of valid output selectors.
    pub const COUNT: u8 = Self::ALL.len() as u8;

    /// Resolve a raw selector, returning `None` when out of range.
    #[must_use]
    pub fn from_selector(selector: u8) -> Option<Self> {
        Self::ALL.get(usize::from(selector)).copied()
    }

    /// Selector value encoding this effector.
    #[must_use]
    pub const fn selector(self) -> u8 {
        self as u8
    }
}

/// Unpacked view of a gene's three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedGene {
    pub input: u8,
    pub strength: u16,
    pub output: u8,
}

impl DecodedGene {
    #[must_use]
    pub fn sensor(&self) -> Option<Sensor> {
        Sensor::from_selector(self.input)
    }

    #[must_use]
    pub fn effector(&self) -> Option<Effector> {
        Effector::from_selector(self.output)
    }

    /// Strength field as a float, see [`decode_strength`].
    #[must_use]
    pub fn strength_value(&self) -> f32 {
        decode_strength(self.strength)
    }
}

/// One packed sensor → strength → effector mapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gene(u32);

impl Gene {
    /// Wrap an arbitrary bit pattern.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Assemble a gene from its three fields.
    #[must_use]
    pub const fn pack(input: u8, strength: u16, output: u8) -> Self {
        Self(
            ((input as u32) << INPUT_SHIFT)
                | ((strength as u32) << STRENGTH_SHIFT)
                | (output as u32),
        )
    }

    /// Convenience constructor from typed selectors.
    #[must_use]
    pub const fn new(sensor: Sensor, strength: u16, effector: Effector) -> Self {
        Self::pack(sensor.selector(), strength, effector.selector())
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn input_selector(self) -> u8 {
        ((self.0 & INPUT_MASK) >> INPUT_SHIFT) as u8
    }

    #[must_use]
    pub const fn strength_bits(self) -> u16 {
        ((self.0 & STRENGTH_MASK) >> STRENGTH_SHIFT) as u16
    }

    #[must_use]
    pub const fn output_selector(self) -> u8 {
        (self.0 & OUTPUT_MASK) as u8
    }

    #[must_use]
    pub const fn with_input_selector(self, input: u8) -> Self {
        Self((self.0 & !INPUT_MASK) | ((input as u32) << INPUT_SHIFT))
    }

    #[must_use]
    pub const fn with_strength_bits(self, strength: u16) -> Self {
        Self((self.0 & !STRENGTH_MASK) | ((strength as u32) << STRENGTH_SHIFT))
    }

    #[must_use]
    pub const fn with_output_selector(self, output: u8) -> Self {
        Self((self.0 & !OUTPUT_MASK) | output as u32)
    }

    /// Split the gene into its three raw fields.
    #[must_use]
    pub const fn decode(self) -> DecodedGene {
        DecodedGene {
            input: self.input_selector(),
            strength: self.strength_bits(),
            output: self.output_selector(),
        }
    }

    /// Reduce both selectors modulo their valid ranges; strength is untouched.
    #[must_use]
    pub const fn sanitize(self) -> Self {
        self.with_input_selector(self.input_selector() % Sensor::COUNT)
            .with_output_selector(self.output_selector() % Effector::COUNT)
    }

    /// Toggle a single bit (`bit` is taken modulo 32).
    #[must_use]
    pub const fn flip_bit(self, bit: u32) -> Self {
        Self(self.0 ^ (1 << (bit % u32::BITS)))
    }
}

impl fmt::Debug for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gene")
            .field("raw", &format_args!("{:#010x}", self.0))
            .field("input", &self.input_selector())
            .field("strength", &format_args!("{:#06x}", self.strength_bits()))
            .field("output", &self.output_selector())
            .finish()
    }
}

/// Rebuild a 32-bit float from the 16-bit `{sign:1, exponent:5, mantissa:10}`
/// strength field.
///
/// The sign lands on bit 31, the exponent is rebiased by addition
/// (`e - 15 + 127`) into bits 23..=30 and the mantissa stays on bits 0..=9.
/// This is not IEEE half-to-single conversion: exponent 0 is not treated as
/// zero/subnormal (`0x0000` decodes to 2^-15), exponent 31 is not infinity
/// (`0x7c00` decodes to 2^16), and the mantissa only nudges the lowest bits.
/// Gene behaviour depends on this exact layout.
///
/// The rebiased exponent is shifted into the f32 exponent field. Leaving it
/// unshifted in the low bits would make every strength a subnormal near
/// 1e-43, so no gene could ever drive an effector.
#[must_use]
pub const fn decode_strength(bits: u16) -> f32 {
    let bits = bits as u32;
    let sign = (bits >> 15) << 31;
    let exponent = (((bits >> 10) & 0x1f) + (F32_EXPONENT_BIAS - STRENGTH_EXPONENT_BIAS)) << 23;
    let mantissa = bits & 0x3ff;
    f32::from_bits(sign | exponent | mantissa)
}
