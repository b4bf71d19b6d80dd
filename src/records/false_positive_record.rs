// std imports
use std::fmt;

/// ExGaussian parameter compared between the groups
///
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestedParameter {
    Mu,
    Tau,
}

impl TestedParameter {
    /// Returns the name as used in the result files
    ///
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mu => "mu",
            Self::Tau => "tau",
        }
    }
}

impl fmt::Display for TestedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record for one paired test between two groups of estimates
///
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FalsePositiveRecord {
    /// P-value of the test
    pub p: f64,
    /// Test statistic
    pub t: f64,
    /// Pairing ID, e.g. `20_vs_500`
    pub pair: String,
    /// Compared parameter
    pub param: TestedParameter,
}

impl FalsePositiveRecord {
    /// Returns true if the test rejects the null hypothesis at the given level
    ///
    /// # Arguments
    /// * `alpha` - Significance level
    ///
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p < alpha
    }
}
