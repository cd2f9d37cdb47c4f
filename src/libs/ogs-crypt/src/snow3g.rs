//! SNOW 3G
//!
//! SNOW 3G keystream generator (ETSI/SAGE UEA2 & UIA2 Document 2) and the
//! f9 integrity function that 128-EIA1 is built on.

/// Rijndael S-box, feeds S1
const SR: [u8; 256] = [
    0x63, 0x7C, 0x77, 0x7B, 0xF2, 0x6B, 0x6F, 0xC5, 0x30, 0x01, 0x67, 0x2B, 0xFE, 0xD7, 0xAB, 0x76,
    0xCA, 0x82, 0xC9, 0x7D, 0xFA, 0x59, 0x47, 0xF0, 0xAD, 0xD4, 0xA2, 0xAF, 0x9C, 0xA4, 0x72, 0xC0,
    0xB7, 0xFD, 0x93, 0x26, 0x36, 0x3F, 0xF7, 0xCC, 0x34, 0xA5, 0xE5, 0xF1, 0x71, 0xD8, 0x31, 0x15,
    0x04, 0xC7, 0x23, 0xC3, 0x18, 0x96, 0x05, 0x9A, 0x07, 0x12, 0x80, 0xE2, 0xEB, 0x27, 0xB2, 0x75,
    0x09, 0x83, 0x2C, 0x1A, 0x1B, 0x6E, 0x5A, 0xA0, 0x52, 0x3B, 0xD6, 0xB3, 0x29, 0xE3, 0x2F, 0x84,
    0x53, 0xD1, 0x00, 0xED, 0x20, 0xFC, 0xB1, 0x5B, 0x6A, 0xCB, 0xBE, 0x39, 0x4A, 0x4C, 0x58, 0xCF,
    0xD0, 0xEF, 0xAA, 0xFB, 0x43, 0x4D, 0x33, 0x85, 0x45, 0xF9, 0x02, 0x7F, 0x50, 0x3C, 0x9F, 0xA8,
    0x51, 0xA3, 0x40, 0x8F, 0x92, 0x9D, 0x38, 0xF5, 0xBC, 0xB6, 0xDA, 0x21, 0x10, 0xFF, 0xF3, 0xD2,
    0xCD, 0x0C, 0x13, 0xEC, 0x5F, 0x97, 0x44, 0x17, 0xC4, 0xA7, 0x7E, 0x3D, 0x64, 0x5D, 0x19, 0x73,
    0x60, 0x81, 0x4F, 0xDC, 0x22, 0x2A, 0x90, 0x88, 0x46, 0xEE, 0xB8, 0x14, 0xDE, 0x5E, 0x0B, 0xDB,
    0xE0, 0x32, 0x3A, 0x0A, 0x49, 0x06, 0x24, 0x5C, 0xC2, 0xD3, 0xAC, 0x62, 0x91, 0x95, 0xE4, 0x79,
    0xE7, 0xC8, 0x37, 0x6D, 0x8D, 0xD5, 0x4E, 0xA9, 0x6C, 0x56, 0xF4, 0xEA, 0x65, 0x7A, 0xAE, 0x08,
    0xBA, 0x78, 0x25, 0x2E, 0x1C, 0xA6, 0xB4, 0xC6, 0xE8, 0xDD, 0x74, 0x1F, 0x4B, 0xBD, 0x8B, 0x8A,
    0x70, 0x3E, 0xB5, 0x66, 0x48, 0x03, 0xF6, 0x0E, 0x61, 0x35, 0x57, 0xB9, 0x86, 0xC1, 0x1D, 0x9E,
    0xE1, 0xF8, 0x98, 0x11, 0x69, 0xD9, 0x8E, 0x94, 0x9B, 0x1E, 0x87, 0xE9, 0xCE, 0x55, 0x28, 0xDF,
    0x8C, 0xA1, 0x89, 0x0D, 0xBF, 0xE6, 0x42, 0x68, 0x41, 0x99, 0x2D, 0x0F, 0xB0, 0x54, 0xBB, 0x16,
];

/// Dickson-polynomial S-box, feeds S2
const SQ: [u8; 256] = [
    0x25, 0x24, 0x73, 0x67, 0xD7, 0xAE, 0x5C, 0x30, 0xA4, 0xEE, 0x6E, 0xCB, 0x7D, 0xB5, 0x82, 0xDB,
    0xE4, 0x8E, 0x48, 0x49, 0x4F, 0x5D, 0x6A, 0x78, 0x70, 0x88, 0xE8, 0x5F, 0x5E, 0x84, 0x65, 0xE2,
    0xD8, 0xE9, 0xCC, 0xED, 0x40, 0x2F, 0x11, 0x28, 0x57, 0xD2, 0xAC, 0xE3, 0x4A, 0x15, 0x1B, 0xB9,
    0xB2, 0x80, 0x85, 0xA6, 0x2E, 0x02, 0x47, 0x29, 0x07, 0x4B, 0x0E, 0xC1, 0x51, 0xAA, 0x89, 0xD4,
    0xCA, 0x01, 0x46, 0xB3, 0xEF, 0xDD, 0x44, 0x7B, 0xC2, 0x7F, 0xBE, 0xC3, 0x9F, 0x20, 0x4C, 0x64,
    0x83, 0xA2, 0x68, 0x42, 0x13, 0xB4, 0x41, 0xCD, 0xBA, 0xC6, 0xBB, 0x6D, 0x4D, 0x71, 0x21, 0xF4,
    0x8D, 0xB0, 0xE5, 0x93, 0xFE, 0x8F, 0xE6, 0xCF, 0x43, 0x45, 0x31, 0x22, 0x37, 0x36, 0x96, 0xFA,
    0xBC, 0x0F, 0x08, 0x52, 0x1D, 0x55, 0x1A, 0xC5, 0x4E, 0x23, 0x69, 0x7A, 0x92, 0xFF, 0x5B, 0x5A,
    0xEB, 0x9A, 0x1C, 0xA9, 0xD1, 0x7E, 0x0D, 0xFC, 0x50, 0x8A, 0xB6, 0x62, 0xF5, 0x0A, 0xF8, 0xDC,
    0x03, 0x3C, 0x0C, 0x39, 0xF1, 0xB8, 0xF3, 0x3D, 0xF2, 0xD5, 0x97, 0x66, 0x81, 0x32, 0xA0, 0x00,
    0x06, 0xCE, 0xF6, 0xEA, 0xB7, 0x17, 0xF7, 0x8C, 0x79, 0xD6, 0xA7, 0xBF, 0x8B, 0x3F, 0x1F, 0x53,
    0x63, 0x75, 0x35, 0x2C, 0x60, 0xFD, 0x27, 0xD3, 0x94, 0xA5, 0x7C, 0xA1, 0x05, 0x58, 0x2D, 0xBD,
    0xD9, 0xC7, 0xAF, 0x6B, 0x54, 0x0B, 0xE0, 0x38, 0x04, 0xC8, 0x9D, 0xE7, 0x14, 0xB1, 0x87, 0x9C,
    0xDF, 0x6F, 0xF9, 0xDA, 0x2A, 0xC4, 0x59, 0x16, 0x74, 0x91, 0xAB, 0x26, 0x61, 0x76, 0x34, 0x2B,
    0xAD, 0x99, 0xFB, 0x72, 0xEC, 0x33, 0x12, 0xDE, 0x98, 0x3B, 0xC0, 0x9B, 0x3E, 0x18, 0x10, 0x3A,
    0x56, 0xE1, 0x77, 0xC9, 0x1E, 0x9E, 0x95, 0xA3, 0x90, 0x19, 0xA8, 0x6C, 0x09, 0xD0, 0xF0, 0x86,
];

#[inline]
fn mul_x(v: u8, c: u8) -> u8 {
    if v & 0x80 != 0 {
        (v << 1) ^ c
    } else {
        v << 1
    }
}

fn mul_x_pow(mut v: u8, i: u8, c: u8) -> u8 {
    for _ in 0..i {
        v = mul_x(v, c);
    }
    v
}

fn mul_alpha(c: u8) -> u32 {
    u32::from_be_bytes([
        mul_x_pow(c, 23, 0xa9),
        mul_x_pow(c, 245, 0xa9),
        mul_x_pow(c, 48, 0xa9),
        mul_x_pow(c, 239, 0xa9),
    ])
}

fn div_alpha(c: u8) -> u32 {
    u32::from_be_bytes([
        mul_x_pow(c, 16, 0xa9),
        mul_x_pow(c, 39, 0xa9),
        mul_x_pow(c, 6, 0xa9),
        mul_x_pow(c, 64, 0xa9),
    ])
}

/// 32-bit S-box: byte substitution followed by the MixColumn-style mix
/// over GF(2^8) reduced by `c`. S1 uses (SR, 0x1b), S2 uses (SQ, 0x69).
fn sbox(w: u32, table: &[u8; 256], c: u8) -> u32 {
    let s = w.to_be_bytes().map(|b| table[b as usize]);
    let m = s.map(|b| mul_x(b, c));

    u32::from_be_bytes([
        m[0] ^ s[1] ^ s[2] ^ m[3] ^ s[3],
        m[0] ^ s[0] ^ m[1] ^ s[2] ^ s[3],
        s[0] ^ m[1] ^ s[1] ^ m[2] ^ s[3],
        s[0] ^ s[1] ^ m[2] ^ s[2] ^ m[3],
    ])
}

/// SNOW 3G state: 16-word LFSR and three FSM registers
pub struct Snow3g {
    lfsr: [u32; 16],
    r1: u32,
    r2: u32,
    r3: u32,
}

impl Snow3g {
    /// Load key and IV and run the 32 initialisation clocks.
    pub fn new(k: &[u32; 4], iv: &[u32; 4]) -> Self {
        let ones = 0xffff_ffff;
        let mut state = Snow3g {
            lfsr: [
                k[0] ^ ones,
                k[1] ^ ones,
                k[2] ^ ones,
                k[3] ^ ones,
                k[0],
                k[1],
                k[2],
                k[3],
                k[0] ^ ones,
                k[1] ^ ones ^ iv[3],
                k[2] ^ ones ^ iv[2],
                k[3] ^ ones,
                k[0] ^ iv[1],
                k[1],
                k[2],
                k[3] ^ iv[0],
            ],
            r1: 0,
            r2: 0,
            r3: 0,
        };

        for _ in 0..32 {
            let f = state.clock_fsm();
            state.clock_lfsr(f);
        }
        state
    }

    /// Clock the LFSR once. `f` is the FSM output during initialisation
    /// and zero in keystream mode.
    fn clock_lfsr(&mut self, f: u32) {
        let s0 = self.lfsr[0];
        let s11 = self.lfsr[11];
        let v = (s0 << 8)
            ^ mul_alpha((s0 >> 24) as u8)
            ^ self.lfsr[2]
            ^ (s11 >> 8)
            ^ div_alpha(s11 as u8)
            ^ f;

        self.lfsr.copy_within(1.., 0);
        self.lfsr[15] = v;
    }

    fn clock_fsm(&mut self) -> u32 {
        let f = self.lfsr[15].wrapping_add(self.r1) ^ self.r2;
        let r = self.r2.wrapping_add(self.r3 ^ self.lfsr[5]);
        self.r3 = sbox(self.r2, &SQ, 0x69);
        self.r2 = sbox(self.r1, &SR, 0x1b);
        self.r1 = r;
        f
    }

    /// Produce `N` keystream words z_1..z_N.
    pub fn keystream<const N: usize>(mut self) -> [u32; N] {
        self.clock_fsm();
        self.clock_lfsr(0);

        let mut z = [0u32; N];
        for word in z.iter_mut() {
            *word = self.clock_fsm() ^ self.lfsr[0];
            self.clock_lfsr(0);
        }
        z
    }
}

#[inline]
fn mul64x(v: u64, c: u64) -> u64 {
    if v & 0x8000_0000_0000_0000 != 0 {
        (v << 1) ^ c
    } else {
        v << 1
    }
}

/// Multiplication of `v` by `p` in GF(2^64) reduced by `c`
fn mul64(mut v: u64, p: u64, c: u64) -> u64 {
    let mut result = 0;
    for i in 0..64 {
        if (p >> i) & 1 != 0 {
            result ^= v;
        }
        v = mul64x(v, c);
    }
    result
}

/// Message word `i` of `data`, zero padded past the end.
fn message_word(data: &[u8], i: usize) -> u64 {
    let mut word = [0u8; 8];
    if let Some(chunk) = data.get(8 * i..) {
        let n = chunk.len().min(8);
        word[..n].copy_from_slice(&chunk[..n]);
    }
    u64::from_be_bytes(word)
}

/// SNOW 3G f9 (UIA2)
///
/// # Arguments
/// * `key` - 128-bit integrity key
/// * `count` - 32-bit COUNT-I
/// * `fresh` - 32-bit FRESH
/// * `dir` - direction bit
/// * `data` - message
/// * `length` - message length in bits
///
/// # Returns
/// * 32-bit MAC, big-endian
pub fn snow_3g_f9(key: &[u8; 16], count: u32, fresh: u32, dir: u32, data: &[u8], length: u64) -> [u8; 4] {
    let mut k = [0u32; 4];
    for (i, chunk) in key.chunks_exact(4).enumerate() {
        k[3 - i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let iv = [fresh ^ (dir << 15), count ^ (dir << 31), fresh, count];

    let z: [u32; 5] = Snow3g::new(&k, &iv).keystream();
    let p = (u64::from(z[0]) << 32) | u64::from(z[1]);
    let q = (u64::from(z[2]) << 32) | u64::from(z[3]);
    const C: u64 = 0x1b;

    // Number of 64-bit message words, the last one possibly partial
    let words = length.div_ceil(64) as usize;
    let tail_bits = length % 64;

    let mut eval: u64 = 0;
    for i in 0..words {
        let mut m = message_word(data, i);
        if i + 1 == words && tail_bits != 0 {
            m &= !(u64::MAX >> tail_bits);
        }
        eval = mul64(eval ^ m, p, C);
    }

    eval ^= length;
    eval = mul64(eval, q, C);

    (((eval >> 32) as u32) ^ z[4]).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_x() {
        assert_eq!(mul_x(0x69, 0x1b), 0xd2);
        assert_eq!(mul_x(0x96, 0x1b), 0x37);
        assert_eq!(mul_x_pow(0x69, 0, 0x1b), 0x69);
        assert_eq!(mul_x_pow(0x69, 2, 0x1b), 0xbf);
    }

    #[test]
    fn test_mul64_identity() {
        assert_eq!(mul64(0x0123_4567_89ab_cdef, 1, 0x1b), 0x0123_4567_89ab_cdef);
        assert_eq!(mul64(0x0123_4567_89ab_cdef, 0, 0x1b), 0);
    }

    #[test]
    fn test_message_word_padding() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        assert_eq!(message_word(&data, 0), 0x0102_0304_0506_0708);
        assert_eq!(message_word(&data, 1), 0x090a_0000_0000_0000);
        assert_eq!(message_word(&data, 2), 0);
    }

    // 128-EIA1 test set 1, FRESH = BEARER 0x1f
    #[test]
    fn test_snow3g_f9_test_set_1() {
        let key: [u8; 16] = [
            0x2B, 0xD6, 0x45, 0x9F, 0x82, 0xC5, 0xB3, 0x00,
            0x95, 0x2C, 0x49, 0x10, 0x48, 0x81, 0xFF, 0x48,
        ];
        let message: [u8; 11] = [
            0x33, 0x32, 0x34, 0x62, 0x63, 0x39, 0x38, 0x61,
            0x37, 0x34, 0x79,
        ];

        let mac = snow_3g_f9(&key, 0x38A6F056, 0x1F << 27, 0, &message, 88);
        assert_eq!(mac, [0x73, 0x1F, 0x11, 0x65]);
    }

    #[test]
    fn test_snow3g_f9_deterministic() {
        let key = [0x11u8; 16];
        let message = [0x03, 0x07, 0x5d, 0x01, 0x01, 0x02, 0xe0, 0xe0];
        let a = snow_3g_f9(&key, 3, 0, 1, &message, 64);
        let b = snow_3g_f9(&key, 3, 0, 1, &message, 64);
        assert_eq!(a, b);

        let other_dir = snow_3g_f9(&key, 3, 0, 0, &message, 64);
        assert_ne!(a, other_dir);
    }
}
