use std::fmt::Display;

/// VOD quality selector, the `qn` parameter of the playurl endpoint.
/// Values above 720p require login on the real API; they are listed for
/// completeness.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[repr(u32)]
pub enum Quality {
    // 流畅 360P
    P360 = 16,
    // 清晰 480P
    P480 = 32,
    // 高清 720P
    P720 = 64,
    // 高帧率 720P60
    P720F60 = 74,
    // 高清 1080P
    #[default]
    P1080 = 80,
    // 高码率 1080P+
    P1080Plus = 112,
    // 高帧率 1080P60
    P1080F60 = 116,
    // 超清 4K
    FourK = 120,
}

impl TryFrom<u32> for Quality {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(Quality::P360),
            32 => Ok(Quality::P480),
            64 => Ok(Quality::P720),
            74 => Ok(Quality::P720F60),
            80 => Ok(Quality::P1080),
            112 => Ok(Quality::P1080Plus),
            116 => Ok(Quality::P1080F60),
            120 => Ok(Quality::FourK),
            _ => Err(format!(
                "unsupported quality {value} (expected one of 16, 32, 64, 74, 80, 112, 116, 120)"
            )),
        }
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_1080p() {
        assert_eq!(Quality::default(), Quality::P1080);
        assert_eq!(Quality::default() as u32, 80);
    }

    #[test]
    fn try_from_round_trips_known_values() {
        for qn in [16u32, 32, 64, 74, 80, 112, 116, 120] {
            let quality = Quality::try_from(qn).unwrap();
            assert_eq!(quality as u32, qn);
        }
    }

    #[test]
    fn try_from_rejects_unknown_values() {
        assert!(Quality::try_from(0).is_err());
        assert!(Quality::try_from(81).is_err());
        assert!(Quality::try_from(10000).is_err());
    }

    #[test]
    fn displays_as_the_qn_numeral() {
        assert_eq!(Quality::P1080F60.to_string(), "116");
    }
}
