//! Dry-run policy consulted by every store mutation.

/// Whether mutations reach the working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPolicy {
    /// Mutations and checkpoints are carried out.
    #[default]
    Apply,
    /// Mutations and checkpoints are reported but suppressed.
    DryRun,
}

impl MutationPolicy {
    /// Policy for a `--test-run` flag.
    #[must_use]
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Self::DryRun
        } else {
            Self::Apply
        }
    }

    /// Whether mutations are allowed through.
    #[must_use]
    pub fn permits(self) -> bool {
        self == Self::Apply
    }
}

/// What happened to a requested mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The working copy (or durable file, for checkpoints) was changed.
    Applied,
    /// The policy suppressed the change.
    Suppressed,
}
