//! Per-point sample layout.
//!
//! The DAC is told how wide each sample is through descriptor tags in the
//! channel configuration header; [`OutputConfig`] is the value those tags
//! are derived from. It is fixed for the lifetime of one streaming engine.

/// ILDA descriptor tag: X coordinate.
pub const TAG_X: u16 = 0x4200;
/// ILDA descriptor tag: Y coordinate.
pub const TAG_Y: u16 = 0x4210;
/// ILDA descriptor tag: extends the preceding channel to 16 bits.
pub const TAG_PRECISION: u16 = 0x4010;
/// ILDA descriptor tag: red, 638 nm.
pub const TAG_COLOR_RED: u16 = 0x527E;
/// ILDA descriptor tag: green, 532 nm.
pub const TAG_COLOR_GREEN: u16 = 0x5214;
/// ILDA descriptor tag: blue, 460 nm.
pub const TAG_COLOR_BLUE: u16 = 0x51CC;
/// ILDA descriptor tag: void (alignment padding, no semantic content).
pub const TAG_VOID: u16 = 0x0000;

/// Sample width for one channel of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleDepth {
    /// One byte per sample.
    Bits8,
    /// Two bytes per sample (big-endian).
    #[default]
    Bits16,
}

impl SampleDepth {
    /// Width in bits.
    pub fn bits(self) -> u8 {
        match self {
            SampleDepth::Bits8 => 8,
            SampleDepth::Bits16 => 16,
        }
    }

    /// Width in bytes.
    pub fn bytes(self) -> usize {
        match self {
            SampleDepth::Bits8 => 1,
            SampleDepth::Bits16 => 2,
        }
    }
}

/// Sample layout for one output: XY width and color width.
///
/// The default (16-bit XY, 8-bit color) matches the most common DAC
/// expectation and yields 7 bytes per point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub xy: SampleDepth,
    pub color: SampleDepth,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            xy: SampleDepth::Bits16,
            color: SampleDepth::Bits8,
        }
    }
}

impl OutputConfig {
    /// Create a config from explicit widths.
    pub fn new(xy: SampleDepth, color: SampleDepth) -> Self {
        Self { xy, color }
    }

    /// Encoded width of one point: two XY samples plus three color samples.
    pub fn bytes_per_point(self) -> usize {
        2 * self.xy.bytes() + 3 * self.color.bytes()
    }

    /// Descriptor tag sequence announcing this layout to the DAC.
    ///
    /// 16-bit channels carry a PRECISION tag after the base tag. The list is
    /// padded with VOID tags to an even count so the tag block stays 32-bit
    /// aligned on the wire.
    pub fn descriptor_tags(self) -> Vec<u16> {
        let mut tags = Vec::with_capacity(12);
        for base in [TAG_X, TAG_Y] {
            tags.push(base);
            if self.xy == SampleDepth::Bits16 {
                tags.push(TAG_PRECISION);
            }
        }
        for base in [TAG_COLOR_RED, TAG_COLOR_GREEN, TAG_COLOR_BLUE] {
            tags.push(base);
            if self.color == SampleDepth::Bits16 {
                tags.push(TAG_PRECISION);
            }
        }
        if tags.len() % 2 != 0 {
            tags.push(TAG_VOID);
        }
        tags
    }

    /// Tag word count (SCWC) for the configuration header.
    pub fn scwc(self) -> u8 {
        self.descriptor_tags().len() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_point_matches_widths() {
        assert_eq!(OutputConfig::default().bytes_per_point(), 7);
        assert_eq!(
            OutputConfig::new(SampleDepth::Bits16, SampleDepth::Bits16).bytes_per_point(),
            10
        );
        assert_eq!(
            OutputConfig::new(SampleDepth::Bits8, SampleDepth::Bits8).bytes_per_point(),
            5
        );
    }

    #[test]
    fn default_tags_are_the_eight_tag_sequence() {
        let tags = OutputConfig::default().descriptor_tags();
        assert_eq!(
            tags,
            vec![
                TAG_X,
                TAG_PRECISION,
                TAG_Y,
                TAG_PRECISION,
                TAG_COLOR_RED,
                TAG_COLOR_GREEN,
                TAG_COLOR_BLUE,
                TAG_VOID,
            ]
        );
        assert_eq!(OutputConfig::default().scwc(), 8);
    }

    #[test]
    fn tag_count_is_always_even() {
        for xy in [SampleDepth::Bits8, SampleDepth::Bits16] {
            for color in [SampleDepth::Bits8, SampleDepth::Bits16] {
                let tags = OutputConfig::new(xy, color).descriptor_tags();
                assert_eq!(tags.len() % 2, 0, "{xy:?}/{color:?}");
            }
        }
    }

    #[test]
    fn high_res_config_carries_precision_for_colors() {
        let tags = OutputConfig::new(SampleDepth::Bits16, SampleDepth::Bits16).descriptor_tags();
        assert_eq!(tags.len(), 10);
        assert_eq!(tags[5], TAG_PRECISION);
        assert_eq!(tags[7], TAG_PRECISION);
        assert_eq!(tags[9], TAG_PRECISION);
    }
}
