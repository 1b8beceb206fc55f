use serde::{Deserialize, Serialize};

use crate::util::error::PathingError;

/// Tolerance knobs controlling how much human-playable slack the
/// optimiser may assume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SqueezeSettings {
    /// Scales the ±0.07 s hit-window half-width. 0 collapses every
    /// window to a point, 1 is the full window.
    pub squeeze: f64,
    /// Fraction of the 0.07 s early window in which whammy is assumed
    /// to already be held when a sustain starts.
    pub early_whammy: f64,
    /// Seconds of whammy assumed lost at the start of every sustain.
    pub lazy_whammy_s: f64,
    /// Song speed in percent, applied to every tempo before ingestion.
    pub speed_percent: u32,
}

impl Default for SqueezeSettings {
    fn default() -> Self {
        Self {
            squeeze: 1.0,
            early_whammy: 1.0,
            lazy_whammy_s: 0.0,
            speed_percent: 100,
        }
    }
}

impl SqueezeSettings {
    pub fn validate(&self) -> Result<(), PathingError> {
        for (name, value) in [("squeeze", self.squeeze), ("early whammy", self.early_whammy)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PathingError::ToleranceOutOfRange { name, value });
            }
        }
        if self.lazy_whammy_s < 0.0 {
            return Err(PathingError::NegativeLazyWhammy(self.lazy_whammy_s));
        }
        if self.speed_percent == 0 {
            return Err(PathingError::ZeroSpeed(self.speed_percent));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SqueezeSettings::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_squeeze_is_rejected() {
        let settings = SqueezeSettings {
            squeeze: 1.5,
            ..SqueezeSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(PathingError::ToleranceOutOfRange { name: "squeeze", .. })
        ));
    }

    #[test]
    fn negative_lazy_whammy_is_rejected() {
        let settings = SqueezeSettings {
            lazy_whammy_s: -0.25,
            ..SqueezeSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_round_trip_through_serde() {
        let settings = SqueezeSettings {
            squeeze: 0.5,
            early_whammy: 0.25,
            lazy_whammy_s: 0.1,
            speed_percent: 150,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: SqueezeSettings = serde_json::from_str(&json).unwrap();
        assert!((parsed.squeeze - 0.5).abs() < 1e-12);
        assert_eq!(parsed.speed_percent, 150);
    }
}
