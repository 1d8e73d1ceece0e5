use std::fmt;

use fnv::FnvHashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::meta::UserIdentity;

/// A 24-bit RGB display color.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ColorToken(u32);

impl ColorToken {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> ColorToken {
        ColorToken((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Remembers which color each user got.  Entries are never evicted or reassigned; the map grows
/// with every distinct user seen for the life of the process.
pub struct ColorRegistry {
    colors: FnvHashMap<UserIdentity, ColorToken>,
    rng: StdRng,
}

impl ColorRegistry {
    pub fn new() -> ColorRegistry {
        ColorRegistry {
            colors: FnvHashMap::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Registry with a reproducible color sequence.
    pub fn with_seed(seed: u64) -> ColorRegistry {
        ColorRegistry {
            colors: FnvHashMap::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The color for `identity`, picking a random one from the full RGB range on first sight.
    pub fn color_for(&mut self, identity: &UserIdentity) -> ColorToken {
        if let Some(token) = self.colors.get(identity) {
            return *token;
        }

        let token = ColorToken(self.rng.gen_range(0..=0xff_ffff));
        self.colors.insert(identity.clone(), token);
        tracing::debug!(user = %identity, color = %token, "assigned color");
        token
    }

    /// Look up without assigning.
    pub fn get(&self, identity: &UserIdentity) -> Option<ColorToken> {
        self.colors.get(identity).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorRegistry {
    fn default() -> ColorRegistry {
        ColorRegistry::new()
    }
}

#[test]
fn repeated_lookups_return_the_same_token() {
    let mut reg = ColorRegistry::new();
    let alice = UserIdentity::new("alice");
    let first = reg.color_for(&alice);
    for _ in 0..10 {
        assert_eq!(reg.color_for(&alice), first);
    }
    assert_eq!(reg.len(), 1);
}

#[test]
fn tokens_do_not_depend_on_call_order() {
    let (u1, u2) = (UserIdentity::new("u1"), UserIdentity::new("u2"));

    let mut reg = ColorRegistry::with_seed(7);
    let a1 = reg.color_for(&u1);
    let a2 = reg.color_for(&u2);
    // Once assigned, each user keeps its token no matter who is asked about next.
    assert_eq!(reg.color_for(&u2), a2);
    assert_eq!(reg.color_for(&u1), a1);

    let mut reg = ColorRegistry::with_seed(7);
    let b2 = reg.color_for(&u2);
    let b1 = reg.color_for(&u1);
    assert_eq!(reg.color_for(&u1), b1);
    assert_eq!(reg.color_for(&u2), b2);
}

#[test]
fn get_does_not_assign() {
    let mut reg = ColorRegistry::with_seed(1);
    let bob = UserIdentity::new("bob");
    assert_eq!(reg.get(&bob), None);
    assert!(reg.is_empty());
    let token = reg.color_for(&bob);
    assert_eq!(reg.get(&bob), Some(token));
}

#[test]
fn token_displays_as_hex_and_unpacks() {
    let token = ColorToken::from_rgb(0x12, 0xab, 0x05);
    assert_eq!(token.to_string(), "#12ab05");
    assert_eq!(token.rgb(), (0x12, 0xab, 0x05));
}
