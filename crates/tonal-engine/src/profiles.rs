//! Key profiles: expected pitch-class weights for a tonic at index 0.
//!
//! Profiles are data. Any pair of 12-element major/minor vectors can be
//! registered under a name and selected through configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Krumhansl-Kessler probe-tone ratings.
const KRUMHANSL_MAJOR: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];
const KRUMHANSL_MINOR: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Temperley (2001) revised weights.
const TEMPERLEY_MAJOR: [f64; 12] = [5.0, 2.0, 3.5, 2.0, 4.5, 4.0, 2.0, 4.5, 2.0, 3.5, 1.5, 4.0];
const TEMPERLEY_MINOR: [f64; 12] = [5.0, 2.0, 3.5, 4.5, 2.0, 4.0, 2.0, 4.5, 3.5, 2.0, 1.5, 4.0];

/// Sha'ath (2011) weights tuned on popular music.
const SHAATH_MAJOR: [f64; 12] = [6.6, 2.0, 3.5, 2.3, 4.6, 4.0, 2.5, 5.2, 2.4, 3.7, 2.3, 3.2];
const SHAATH_MINOR: [f64; 12] = [6.5, 2.7, 3.5, 5.4, 2.6, 3.5, 2.5, 4.7, 4.0, 2.7, 3.4, 3.2];

/// Binary scale membership. The minor vector is harmonic minor so a
/// diatonic passage does not tie exactly with its relative key.
const DIATONIC_MAJOR: [f64; 12] = [1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
const DIATONIC_MINOR: [f64; 12] = [1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyProfile {
    pub name: String,
    pub major: [f64; 12],
    pub minor: [f64; 12],
}

impl KeyProfile {
    pub fn new(name: impl Into<String>, major: [f64; 12], minor: [f64; 12]) -> Self {
        Self {
            name: name.into(),
            major,
            minor,
        }
    }

    pub fn krumhansl() -> Self {
        Self::new("krumhansl", KRUMHANSL_MAJOR, KRUMHANSL_MINOR)
    }

    pub fn temperley() -> Self {
        Self::new("temperley", TEMPERLEY_MAJOR, TEMPERLEY_MINOR)
    }

    pub fn shaath() -> Self {
        Self::new("shaath", SHAATH_MAJOR, SHAATH_MINOR)
    }

    pub fn diatonic() -> Self {
        Self::new("diatonic", DIATONIC_MAJOR, DIATONIC_MINOR)
    }

    /// A profile is usable when every weight is finite and neither vector
    /// is constant (a constant vector has no correlation with anything).
    pub fn is_well_formed(&self) -> bool {
        let varies = |v: &[f64; 12]| {
            v.iter().all(|x| x.is_finite()) && v.iter().any(|&x| (x - v[0]).abs() > 1e-12)
        };
        varies(&self.major) && varies(&self.minor)
    }
}

/// Named profiles available to the analyzer.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, KeyProfile>,
}

impl ProfileRegistry {
    /// An empty registry. Most callers want [`ProfileRegistry::builtin`].
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// The four profiles shipped with the engine.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for profile in [
            KeyProfile::krumhansl(),
            KeyProfile::temperley(),
            KeyProfile::shaath(),
            KeyProfile::diatonic(),
        ] {
            registry.register(profile);
        }
        registry
    }

    /// Add or replace a profile under its own name.
    pub fn register(&mut self, profile: KeyProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&KeyProfile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyProfile> {
        self.profiles.values()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_registered() {
        let registry = ProfileRegistry::builtin();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["diatonic", "krumhansl", "shaath", "temperley"]);
        assert!(registry.iter().all(KeyProfile::is_well_formed));
    }

    #[test]
    fn custom_profile_is_data() {
        let mut registry = ProfileRegistry::builtin();
        let mut custom = KeyProfile::krumhansl();
        custom.name = "flat-fourth".to_string();
        custom.major[5] = 6.0;
        registry.register(custom.clone());

        assert_eq!(registry.get("flat-fourth"), Some(&custom));
        assert_eq!(registry.get("krumhansl").unwrap().major[5], 4.09);
    }

    #[test]
    fn constant_profile_is_rejected() {
        let flat = KeyProfile::new("flat", [1.0; 12], DIATONIC_MINOR);
        assert!(!flat.is_well_formed());
    }
}
