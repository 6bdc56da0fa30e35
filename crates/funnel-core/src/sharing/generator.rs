//! Token value generation

use rand::distr::Alphanumeric;
use rand::Rng;

/// Produces unguessable token values
pub trait TokenGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

/// Alphanumeric values from the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self, length: usize) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}
