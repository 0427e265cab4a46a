//! CRC-32 content fingerprints.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crc::{CRC_32_ISO_HDLC, Crc};

use assetrev_core::Fingerprint;

/// Reflected form of the IEEE 802.3 polynomial used for fingerprints.
pub const CRC32_POLYNOMIAL: u32 = 0xedb8_8320;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Fingerprint the full content of a file. Also returns the number of bytes
/// read, which is the size the fingerprint covers.
pub fn hash_file(path: impl AsRef<Path>) -> io::Result<(Fingerprint, u64)> {
    hash_reader(File::open(path)?)
}

/// Fingerprint everything a reader yields. Also returns the byte count.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<(Fingerprint, u64)> {
    let mut digest = CRC32.digest();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        digest.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok((Fingerprint::new(digest.finalize()), total))
}

/// Fingerprint an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> Fingerprint {
    Fingerprint::new(CRC32.checksum(bytes))
}
