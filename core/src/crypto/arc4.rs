//! Alleged RC4 stream cipher.
//!
//! The installer derives the key by hashing `salt || password` and then
//! throws away the first 1000 keystream bytes before the payload starts, so a
//! stock RC4 implementation cannot be dropped in without replicating that
//! warm-up. [`Arc4::with_discard`] performs both steps.

pub struct Arc4 {
    state: [u8; 256],
    a: usize,
    b: usize,
}

impl Arc4 {
    /// Number of keystream bytes the installer discards after key setup.
    pub const DISCARD: usize = 1000;

    /// Standard KSA. `key` must be non-empty.
    pub fn new(key: &[u8]) -> Self {
        debug_assert!(!key.is_empty());
        let mut state = [0u8; 256];
        for (i, s) in state.iter_mut().enumerate() {
            *s = i as u8;
        }
        let mut j = 0usize;
        for i in 0..256 {
            j = (j + state[i] as usize + key[i % key.len()] as usize) % 256;
            state.swap(i, j);
        }
        Arc4 { state, a: 0, b: 0 }
    }

    /// KSA followed by the installer's 1000-byte keystream discard.
    pub fn with_discard(key: &[u8]) -> Self {
        let mut arc4 = Self::new(key);
        arc4.discard(Self::DISCARD);
        arc4
    }

    fn step(&mut self) {
        self.a = (self.a + 1) % 256;
        self.b = (self.b + self.state[self.a] as usize) % 256;
        self.state.swap(self.a, self.b);
    }

    pub fn discard(&mut self, length: usize) {
        for _ in 0..length {
            self.step();
        }
    }

    /// XORs the keystream over `data` in place. Encryption and decryption
    /// are the same operation.
    pub fn crypt(&mut self, data: &mut [u8]) {
        for byte in data {
            self.step();
            let k = self.state[(self.state[self.a] as usize + self.state[self.b] as usize) % 256];
            *byte ^= k;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keystream vector from RFC 6229 (key 0x0102030405, first 16 bytes).
    #[test]
    fn rfc6229_keystream() {
        let mut arc4 = Arc4::new(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        let mut data = [0u8; 16];
        arc4.crypt(&mut data);
        assert_eq!(
            data,
            [
                0xb2, 0x39, 0x63, 0x05, 0xf0, 0x3d, 0xc0, 0x27, 0xcc, 0xc3, 0x52, 0x4a, 0x0a,
                0x11, 0x18, 0xa8
            ]
        );
    }

    #[test]
    fn discard_skips_keystream() {
        let mut plain = Arc4::new(b"key");
        let mut skipped = Arc4::new(b"key");
        plain.discard(1000);
        skipped.discard(997);
        skipped.discard(3);

        let mut a = [0u8; 8];
        let mut b = [0u8; 8];
        plain.crypt(&mut a);
        skipped.crypt(&mut b);
        assert_eq!(a, b);

        let mut warm = Arc4::with_discard(b"key");
        let mut c = [0u8; 8];
        warm.crypt(&mut c);
        assert_eq!(a, c);
    }

    #[test]
    fn crypt_round_trips() {
        let mut enc = Arc4::with_discard(b"secret");
        let mut dec = Arc4::with_discard(b"secret");
        let mut data = *b"attack at dawn";
        enc.crypt(&mut data);
        assert_ne!(&data, b"attack at dawn");
        dec.crypt(&mut data);
        assert_eq!(&data, b"attack at dawn");
    }
}
