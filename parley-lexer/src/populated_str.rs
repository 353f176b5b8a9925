/// A string slice that is statically guaranteed to contain at least one
/// character. Used for the unconsumed tail of a short option cluster.
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct PopulatedStr<'a>(&'a str);

impl<'a> PopulatedStr<'a> {
    #[inline]
    pub fn new(s: &'a str) -> Option<Self> {
        match s.is_empty() {
            true => None,
            false => Some(Self(s)),
        }
    }

    /// The whole point: a static guarantee that there's a first character
    #[inline]
    pub fn split_first(self) -> (char, &'a str) {
        debug_assert!(!self.0.is_empty());

        let mut chars = self.0.chars();

        // Safety: `self.0` is guaranteed to be non-empty, so it has at least
        // one char
        let first = unsafe { chars.next().unwrap_unchecked() };
        (first, chars.as_str())
    }

    #[inline(always)]
    pub fn get(self) -> &'a str {
        self.0
    }
}
