use regex::Regex;

/// Ordinal quality tiers, lowest to highest so the derived ordering ranks
/// Unknown below everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityTier {
    Unknown,
    Sd,
    Hd,
    FullHd,
    Uhd,
}

impl QualityTier {
    pub fn from_lines(lines: u64) -> Self {
        if lines >= 2160 {
            QualityTier::Uhd
        } else if lines >= 1080 {
            QualityTier::FullHd
        } else if lines >= 720 {
            QualityTier::Hd
        } else {
            QualityTier::Sd
        }
    }

    pub fn nominal_pixels(self) -> u64 {
        match self {
            QualityTier::Uhd => 3840 * 2160,
            QualityTier::FullHd => 1920 * 1080,
            QualityTier::Hd => 1280 * 720,
            QualityTier::Sd => 640 * 480,
            QualityTier::Unknown => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Uhd => "4K/UHD",
            QualityTier::FullHd => "1080p/FHD",
            QualityTier::Hd => "720p/HD",
            QualityTier::Sd => "SD",
            QualityTier::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Deduplication key: name with quality tokens and annotations stripped,
    /// whitespace collapsed, lowercased.
    pub identity: String,
    pub tier: QualityTier,
    /// Estimated pixel count, used as the tie-break within a tier.
    pub pixels: u64,
}

enum TokenKind {
    /// `WxH`, both dimensions known.
    Dimensions,
    /// `NNNp` line count, width estimated at 16:9.
    Lines,
    /// Symbolic tier name with a nominal pixel count.
    Tier(QualityTier),
}

struct Detector {
    pattern: Regex,
    kind: TokenKind,
}

/// Quality detectors in precedence order plus the identity normalizer.
/// Compile once, classify many.
pub struct Classifier {
    detectors: Vec<Detector>,
    annotations: Regex,
    whitespace: Regex,
}

impl Classifier {
    pub fn new() -> Self {
        let detectors = vec![
            Detector {
                pattern: Regex::new(r"(?i)\b(\d{3,4})x(\d{3,4})\b").unwrap(),
                kind: TokenKind::Dimensions,
            },
            Detector {
                pattern: Regex::new(r"(?i)\b(\d{3,4})p\b").unwrap(),
                kind: TokenKind::Lines,
            },
            Detector {
                pattern: Regex::new(r"(?i)\b(?:4k|uhd)\b").unwrap(),
                kind: TokenKind::Tier(QualityTier::Uhd),
            },
            Detector {
                pattern: Regex::new(r"(?i)\b(?:fhd|full[ -]?hd)\b").unwrap(),
                kind: TokenKind::Tier(QualityTier::FullHd),
            },
            Detector {
                pattern: Regex::new(r"(?i)\bhd\b").unwrap(),
                kind: TokenKind::Tier(QualityTier::Hd),
            },
            Detector {
                pattern: Regex::new(r"(?i)\bsd\b").unwrap(),
                kind: TokenKind::Tier(QualityTier::Sd),
            },
        ];

        Classifier {
            detectors,
            annotations: Regex::new(r"\[[^\]]*\]|\([^)]*\)").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    pub fn classify(&self, display_name: &str) -> Classification {
        let (tier, pixels) = self.detect(display_name);

        Classification {
            identity: self.identity(display_name),
            tier,
            pixels,
        }
    }

    fn detect(&self, name: &str) -> (QualityTier, u64) {
        for detector in &self.detectors {
            let Some(caps) = detector.pattern.captures(name) else {
                continue;
            };

            match detector.kind {
                TokenKind::Dimensions => {
                    let width: u64 = caps[1].parse().unwrap_or(0);
                    let height: u64 = caps[2].parse().unwrap_or(0);
                    return (QualityTier::from_lines(height), width * height);
                }
                TokenKind::Lines => {
                    let lines: u64 = caps[1].parse().unwrap_or(0);
                    // width = lines * 16/9, so pixels = lines^2 * 16/9
                    return (QualityTier::from_lines(lines), lines * lines * 16 / 9);
                }
                TokenKind::Tier(tier) => return (tier, tier.nominal_pixels()),
            }
        }

        (QualityTier::Unknown, 0)
    }

    fn identity(&self, name: &str) -> String {
        let mut stripped = self.annotations.replace_all(name, " ").into_owned();
        for detector in &self.detectors {
            stripped = detector.pattern.replace_all(&stripped, " ").into_owned();
        }

        self.whitespace
            .replace_all(&stripped, " ")
            .trim()
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    mod classify;
}
