//! Program derived addresses, computed without touching the network.

use crate::error::{Error, Result};
use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Ordered seed material for one derived address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedTuple(Vec<Vec<u8>>);

impl SeedTuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, seed: impl AsRef<[u8]>) -> Self {
        self.0.push(seed.as_ref().to_vec());
        self
    }

    pub fn push_u64(self, n: u64) -> Self {
        self.push(n.to_le_bytes())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slices(&self) -> Vec<&[u8]> {
        self.0.iter().map(Vec::as_slice).collect()
    }
}

impl<S: AsRef<[u8]>> FromIterator<S> for SeedTuple {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(|s| s.as_ref().to_vec()).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

impl From<DerivedAddress> for (Pubkey, u8) {
    fn from(d: DerivedAddress) -> Self {
        (d.address, d.bump)
    }
}

/// Whether `bytes` decode to a point on the ed25519 curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY::from_slice(bytes)
        .map(|y| y.decompress().is_some())
        .unwrap_or(false)
}

fn check_seeds(seeds: &[&[u8]]) -> Result<()> {
    if seeds.len() > MAX_SEEDS {
        return Err(Error::InvalidSeeds(format!(
            "{} seeds given, at most {} allowed",
            seeds.len(),
            MAX_SEEDS
        )));
    }
    if let Some((i, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, s)| s.len() > MAX_SEED_LEN)
    {
        return Err(Error::InvalidSeeds(format!(
            "seed #{} is {} bytes, at most {} allowed",
            i,
            seed.len(),
            MAX_SEED_LEN
        )));
    }
    Ok(())
}

fn hash_seeds<'a>(seeds: impl IntoIterator<Item = &'a [u8]>, program_id: &Pubkey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    hasher.finalize().into()
}

/// Address for seeds that already include the bump.
///
/// Fails with [`Error::InvalidSeeds`] when the digest lands on the curve,
/// since such an address could have a private key.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey> {
    // the bump takes one seed slot
    check_seeds(seeds)?;
    let digest = hash_seeds(seeds.iter().copied(), program_id);
    if is_on_curve(&digest) {
        return Err(Error::InvalidSeeds("derived address is on curve".to_owned()));
    }
    Ok(Pubkey::new_from_array(digest))
}

/// Search bumps from 255 downward and return the first off-curve address.
///
/// Matches the platform's `find_program_address`, so bump 0 is never tried.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<DerivedAddress> {
    if seeds.len() >= MAX_SEEDS {
        return Err(Error::InvalidSeeds(format!(
            "{} seeds given, at most {} allowed with a bump",
            seeds.len(),
            MAX_SEEDS - 1
        )));
    }
    check_seeds(seeds)?;

    for bump in (1..=u8::MAX).rev() {
        let bump_seed = [bump];
        let digest = hash_seeds(
            seeds.iter().copied().chain([bump_seed.as_slice()]),
            program_id,
        );
        if !is_on_curve(&digest) {
            return Ok(DerivedAddress {
                address: Pubkey::new_from_array(digest),
                bump,
            });
        }
    }

    Err(Error::AddressDerivationExhausted {
        program_id: *program_id,
    })
}

impl SeedTuple {
    pub fn derive(&self, program_id: &Pubkey) -> Result<DerivedAddress> {
        find_program_address(&self.as_slices(), program_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey;

    const PROGRAM: Pubkey = pubkey!("ebvdBEBKz6UK1Xs9mnGs7TsR2vgKyPP2idaFEqGRTRQ");
    const WSOL: Pubkey = pubkey!("So11111111111111111111111111111111111111112");
    const USDC: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

    #[test]
    fn test_deterministic() {
        let seeds = SeedTuple::new()
            .push(b"v3")
            .push(b"pool")
            .push(WSOL)
            .push(USDC);
        let a = seeds.derive(&PROGRAM).unwrap();
        let b = seeds.derive(&PROGRAM).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pool_fixture() {
        let d = find_program_address(&[b"v3", b"pool", WSOL.as_ref(), USDC.as_ref()], &PROGRAM)
            .unwrap();
        assert_eq!(
            d.address,
            pubkey!("Crom6cdPnHFiamP9WLK8E6hgrmqAfBj7NqVsSmdPT3FC")
        );
        assert_eq!(d.bump, 254);
    }

    #[test]
    fn test_result_is_off_curve() {
        for i in 0u64..64 {
            let d = SeedTuple::new()
                .push(b"v3")
                .push(b"pos")
                .push(WSOL)
                .push_u64(i)
                .derive(&PROGRAM)
                .unwrap();
            assert!(!is_on_curve(&d.address.to_bytes()));
            assert!(!d.address.is_on_curve());
        }
    }

    #[test]
    fn test_skips_on_curve_bump() {
        let nonce = 5u64.to_le_bytes();
        let seeds: [&[u8]; 3] = [b"v3", b"fixture", &nonce];

        // 255 lands on the curve for this tuple
        let err = create_program_address(&[b"v3", b"fixture", &nonce, &[255]], &PROGRAM);
        assert!(matches!(err, Err(Error::InvalidSeeds(_))));

        let d = find_program_address(&seeds, &PROGRAM).unwrap();
        assert_eq!(d.bump, 254);
        assert_eq!(
            d.address,
            pubkey!("CDiYPMS5WERntbwfVjKsa2tA5wz9HKGuJXJjAWLRj94F")
        );
    }

    #[test]
    fn test_matches_platform() {
        for i in 0u64..32 {
            let nonce = i.to_le_bytes();
            let seeds: [&[u8]; 3] = [b"v3", b"fixture", &nonce];
            let ours = find_program_address(&seeds, &PROGRAM).unwrap();
            let (address, bump) = Pubkey::find_program_address(&seeds, &PROGRAM);
            assert_eq!((ours.address, ours.bump), (address, bump));
        }
    }

    #[test]
    fn test_create_roundtrip_with_found_bump() {
        let d = find_program_address(&[b"v3", b"orderbook", WSOL.as_ref()], &PROGRAM).unwrap();
        let again =
            create_program_address(&[b"v3", b"orderbook", WSOL.as_ref(), &[d.bump]], &PROGRAM)
                .unwrap();
        assert_eq!(d.address, again);
    }

    #[test]
    fn test_seed_limits() {
        let long = [7u8; 33];
        assert!(matches!(
            find_program_address(&[&long], &PROGRAM),
            Err(Error::InvalidSeeds(_))
        ));

        let many: Vec<&[u8]> = (0..MAX_SEEDS).map(|_| b"x".as_slice()).collect();
        assert!(matches!(
            find_program_address(&many, &PROGRAM),
            Err(Error::InvalidSeeds(_))
        ));

        let max_len = [7u8; MAX_SEED_LEN];
        assert!(find_program_address(&[&max_len], &PROGRAM).is_ok());
    }
}
