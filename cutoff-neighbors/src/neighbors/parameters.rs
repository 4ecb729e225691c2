use crate::Error;

/// Default value for [`FinderParameters::max_bins`]
pub(super) const DEFAULT_MAX_BINS: usize = 100_000;

fn default_max_bins() -> usize {
    DEFAULT_MAX_BINS
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
/// Parameters for the construction of a [`CutoffNeighborFinder`].
///
/// These parameters can be created directly, or loaded from JSON:
///
/// ```
/// # use cutoff_neighbors::neighbors::FinderParameters;
/// let parameters = FinderParameters::from_json(r#"{"cutoff": 3.5}"#).unwrap();
/// assert_eq!(parameters.cutoff, 3.5);
/// assert_eq!(parameters.max_bins, 100000);
/// ```
///
/// [`CutoffNeighborFinder`]: super::CutoffNeighborFinder
pub struct FinderParameters {
    /// Spherical cutoff radius. Pairs of particles at this distance or closer
    /// are neighbors.
    pub cutoff: f64,
    /// Maximal number of bins used to sort particles. Using more bins makes
    /// queries faster for large systems, at the cost of memory.
    #[serde(default = "default_max_bins")]
    pub max_bins: usize,
}

impl FinderParameters {
    /// Create parameters with the given `cutoff` and default values for
    /// everything else
    pub fn new(cutoff: f64) -> FinderParameters {
        FinderParameters {
            cutoff: cutoff,
            max_bins: DEFAULT_MAX_BINS,
        }
    }

    /// Load and validate parameters from the given JSON string
    pub fn from_json(json: &str) -> Result<FinderParameters, Error> {
        let parameters = serde_json::from_str::<FinderParameters>(json)?;
        parameters.validate()?;
        return Ok(parameters);
    }

    /// Get the JSON representation of these parameters
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("failed to serialize to JSON")
    }

    /// Check that these parameters can be used to build a neighbor finder
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.cutoff > 0.0 && self.cutoff.is_finite()) {
            return Err(Error::Configuration(format!(
                "cutoff must be a positive finite number, got {}", self.cutoff
            )));
        }

        if self.max_bins == 0 {
            return Err(Error::Configuration(
                "max_bins must be at least 1".into()
            ));
        }

        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json() {
        let parameters = FinderParameters::from_json(r#"{"cutoff": 2.5, "max_bins": 64}"#).unwrap();
        assert_eq!(parameters, FinderParameters { cutoff: 2.5, max_bins: 64 });

        let parameters = FinderParameters::from_json(r#"{"cutoff": 2.5}"#).unwrap();
        assert_eq!(parameters, FinderParameters::new(2.5));

        assert_eq!(
            FinderParameters::from_json(&parameters.to_json()).unwrap(),
            parameters
        );
    }

    #[test]
    fn invalid_json() {
        let error = FinderParameters::from_json(r#"{"max_bins": 64}"#).unwrap_err();
        assert!(matches!(error, Error::Json(_)));
        assert!(error.to_string().contains("missing field `cutoff`"));

        let error = FinderParameters::from_json(r#"{"cutoff": 2.5, "radius": 3}"#).unwrap_err();
        assert!(matches!(error, Error::Json(_)));

        let error = FinderParameters::from_json(r#"{"cutoff": -2.5}"#).unwrap_err();
        assert_eq!(error.to_string(), "invalid configuration: cutoff must be a positive finite number, got -2.5");
    }

    #[test]
    fn validate() {
        assert!(FinderParameters::new(1.0).validate().is_ok());
        assert!(FinderParameters::new(1e-12).validate().is_ok());

        assert!(FinderParameters::new(0.0).validate().is_err());
        assert!(FinderParameters::new(-1.0).validate().is_err());
        assert!(FinderParameters::new(f64::NAN).validate().is_err());
        assert!(FinderParameters::new(f64::INFINITY).validate().is_err());

        let parameters = FinderParameters { cutoff: 1.0, max_bins: 0 };
        let error = parameters.validate().unwrap_err();
        assert_eq!(error.to_string(), "invalid configuration: max_bins must be at least 1");
    }
}
