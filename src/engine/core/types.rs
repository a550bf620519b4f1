use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoder tuning goal, trading latency for compression efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageProfile {
    #[serde(alias = "good")]
    GoodQuality,
    #[serde(alias = "rt")]
    Realtime,
    #[serde(alias = "best")]
    BestQuality,
}

impl UsageProfile {
    /// Short name accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageProfile::GoodQuality => "good",
            UsageProfile::Realtime => "realtime",
            UsageProfile::BestQuality => "best",
        }
    }

    /// Look-ahead depth the baseline config starts from
    pub fn default_lag_in_frames(&self) -> u32 {
        match self {
            UsageProfile::Realtime => 0,
            UsageProfile::GoodQuality | UsageProfile::BestQuality => 25,
        }
    }
}

impl fmt::Display for UsageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" | "good-quality" => Ok(UsageProfile::GoodQuality),
            "realtime" | "rt" => Ok(UsageProfile::Realtime),
            "best" | "best-quality" => Ok(UsageProfile::BestQuality),
            other => Err(format!(
                "unknown usage profile '{}' (expected good, realtime or best)",
                other
            )),
        }
    }
}

/// Clock unit as num/den seconds; den is usually the frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Timebase of one tick per frame at `fps`
    pub fn per_second(fps: u32) -> Self {
        Self { num: 1, den: fps }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Rational {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("timebase '{}' must look like NUM/DEN", s))?;
        let num = num
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("timebase numerator '{}': {}", num.trim(), e))?;
        let den = den
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("timebase denominator '{}': {}", den.trim(), e))?;
        Ok(Rational { num, den })
    }
}

impl TryFrom<String> for Rational {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rational> for String {
    fn from(value: Rational) -> Self {
        value.to_string()
    }
}

/// Full encoder configuration handed to `EncoderSession::init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub timebase: Rational,
    pub target_bitrate_kbps: u32,
    pub usage: UsageProfile,
    pub lag_in_frames: u32,
    pub threads: u32,
}

impl EncoderConfig {
    /// One-line summary printed before initialization
    pub fn summary_line(&self) -> String {
        format!(
            "Encoder config: Width={}, Height={}, Timebase={}/{}, Bitrate={} kbps",
            self.width, self.height, self.timebase.num, self.timebase.den, self.target_bitrate_kbps
        )
    }
}

/// Caller-supplied values layered over a baseline config.
///
/// `None` keeps whatever the layer underneath provides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timebase: Option<Rational>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bitrate_kbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag_in_frames: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

impl ConfigOverrides {
    /// Stack `upper` on top of `self`; fields set in `upper` win
    pub fn merge(self, upper: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            width: upper.width.or(self.width),
            height: upper.height.or(self.height),
            timebase: upper.timebase.or(self.timebase),
            target_bitrate_kbps: upper.target_bitrate_kbps.or(self.target_bitrate_kbps),
            usage: upper.usage.or(self.usage),
            lag_in_frames: upper.lag_in_frames.or(self.lag_in_frames),
            threads: upper.threads.or(self.threads),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ConfigOverrides::default()
    }
}

/// Metadata for a frame handed to `encode`. Pixel data lives elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pts: u64,
}
