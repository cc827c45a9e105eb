//! Where mutants come from
//!
//! Mutation strategies live outside this crate. The seed loop only needs
//! something that hands out the next mutant of a seed.

use veridiff_smt::Script;

pub trait MutantSource: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// The `iteration`-th mutant of `seed`, or `None` when the source has
    /// nothing more to offer for it
    fn next_mutant(&mut self, seed: &Script, iteration: usize) -> Option<Script>;

    /// False when every mutant equals its seed
    fn mutates(&self) -> bool {
        true
    }
}

/// Re-tests the seed unchanged.
///
/// The seed loop runs it once per seed, or once per iteration when the
/// verifier's options are redrawn on every run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySource;

impl MutantSource for IdentitySource {
    fn name(&self) -> &str {
        "identity"
    }

    fn next_mutant(&mut self, seed: &Script, _iteration: usize) -> Option<Script> {
        Some(seed.clone())
    }

    fn mutates(&self) -> bool {
        false
    }
}

/// Replays a fixed list of mutants, in order, for every seed
#[derive(Debug, Clone, Default)]
pub struct ListSource {
    mutants: Vec<Script>,
}

impl ListSource {
    pub fn new(mutants: Vec<Script>) -> Self {
        Self { mutants }
    }
}

impl MutantSource for ListSource {
    fn name(&self) -> &str {
        "list"
    }

    fn next_mutant(&mut self, _seed: &Script, iteration: usize) -> Option<Script> {
        self.mutants.get(iteration).cloned()
    }
}
