//! Request-level sanitization for workflow parameters.
//!
//! These are normalizers, not gatekeepers: out-of-range values are
//! clamped or rounded rather than rejected so a serving layer can always
//! produce a runnable workflow.

pub const MAX_PROMPT_LENGTH: usize = 5000;
pub const MIN_DIMENSION: u32 = 64;
pub const MAX_DIMENSION: u32 = 2048;

/// Replaces shell-sensitive characters with spaces so they act as word
/// separators, collapses all whitespace runs, and caps the length.
pub fn sanitize_prompt(prompt: &str) -> String {
    let spaced: String = prompt
        .chars()
        .map(|c| {
            if matches!(c, '`' | '$' | '\\') || c.is_whitespace() {
                ' '
            } else {
                c
            }
        })
        .collect();

    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_PROMPT_LENGTH).collect()
}

/// Rounds a dimension to the nearest multiple of 8 and clamps it into
/// the supported range. Latent-space nodes require 8-pixel alignment.
pub fn validate_image_dimension(value: u32) -> u32 {
    let rounded = (value.saturating_add(4) / 8) * 8;
    rounded.clamp(MIN_DIMENSION, MAX_DIMENSION)
}

pub fn validate_image_dimensions(width: u32, height: u32) -> (u32, u32) {
    (validate_image_dimension(width), validate_image_dimension(height))
}

/// Caps batch size by output resolution so a single request cannot
/// exhaust VRAM: over one megapixel at most 2, over a quarter megapixel
/// at most 3, otherwise 4.
pub fn validate_batch_size(requested: u32, width: u32, height: u32) -> u32 {
    let pixels = u64::from(width) * u64::from(height);
    let cap = if pixels > 1_048_576 {
        2
    } else if pixels > 262_144 {
        3
    } else {
        4
    };
    requested.clamp(1, cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_shell_characters_with_spaces() {
        assert_eq!(sanitize_prompt("a `cat` with $HOME\\path"), "a cat with HOME path");
        // Separators must not glue adjacent words together.
        assert_eq!(sanitize_prompt("a`cat`dog"), "a cat dog");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_prompt("  a   cat\n\tdog  "), "a cat dog");
        assert_eq!(sanitize_prompt("a   b"), "a b");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "x".repeat(MAX_PROMPT_LENGTH + 100);
        assert_eq!(sanitize_prompt(&long).len(), MAX_PROMPT_LENGTH);
    }

    #[test]
    fn test_dimension_rounding_and_clamping() {
        assert_eq!(validate_image_dimension(512), 512);
        assert_eq!(validate_image_dimension(513), 512);
        assert_eq!(validate_image_dimension(517), 520);
        assert_eq!(validate_image_dimension(10), 64);
        assert_eq!(validate_image_dimension(5000), 2048);
        assert_eq!(validate_image_dimension(u32::MAX), 2048);
        assert_eq!(validate_image_dimensions(1023, 63), (1024, 64));
    }

    #[test]
    fn test_batch_size_resolution_aware() {
        // 512x512 = 0.25MP exactly, small tier.
        assert_eq!(validate_batch_size(8, 512, 512), 4);
        // 768x768 is between the tiers.
        assert_eq!(validate_batch_size(8, 768, 768), 3);
        // 1024x1024 = 1MP exactly, still mid tier.
        assert_eq!(validate_batch_size(8, 1024, 1024), 3);
        assert_eq!(validate_batch_size(8, 1024, 1536), 2);
        assert_eq!(validate_batch_size(0, 512, 512), 1);
    }
}
