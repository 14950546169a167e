/// Identifies one mount of a view. Work started under a token may only
/// write back while that token is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountToken(u64);

#[derive(Debug, Default)]
pub struct Lifecycle {
    generation: u64,
    mounted: bool,
}

impl Lifecycle {
    /// Starts a new mount, invalidating every earlier token.
    pub fn begin(&mut self) -> MountToken {
        self.generation += 1;
        self.mounted = true;
        MountToken(self.generation)
    }

    pub fn end(&mut self) {
        self.generation += 1;
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_current(&self, token: MountToken) -> bool {
        self.mounted && token.0 == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::Lifecycle;

    #[test]
    fn remount_invalidates_previous_token() {
        let mut lifecycle = Lifecycle::default();
        let first = lifecycle.begin();
        assert!(lifecycle.is_current(first));

        let second = lifecycle.begin();
        assert!(!lifecycle.is_current(first));
        assert!(lifecycle.is_current(second));

        lifecycle.end();
        assert!(!lifecycle.is_current(second));
        assert!(!lifecycle.is_mounted());
    }
}
